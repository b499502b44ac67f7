use std::env;

use property_sim::api::ApiError;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        if let Err(e) = property_sim::api::run_http_server(port).await {
            error!(error = %e, "server error");
            std::process::exit(1);
        }
        return;
    }

    match property_sim::api::projection_json_from_args(raw_args) {
        Ok(json) => println!("{json}"),
        Err(ApiError::Cli(e)) => e.exit(),
        Err(e) => {
            error!(error = %e, "projection failed");
            std::process::exit(1);
        }
    }
}
