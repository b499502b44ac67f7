//! Integer minor-unit money.
//!
//! Every amount inside the engine is a whole number of kopeks. Rates are applied
//! in floating point and the product is rounded back to kopeks immediately, so a
//! 360-step projection never accumulates float drift.

use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

pub const KOPEKS_PER_RUBLE: i64 = 100;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Kopeks(i64);

/// Half-up rounding to the nearest integer (`-2.5` rounds to `-2`).
pub fn round_minor(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Rounds a ruble amount to whole kopeks, staying in rubles.
pub fn round_rubles(rubles: f64) -> f64 {
    Kopeks::from_rubles(rubles).to_rubles()
}

/// Rounds to two decimal places, used for percentages and years.
pub fn round_2dp(value: f64) -> f64 {
    round_minor(value * 100.0) as f64 / 100.0
}

impl Kopeks {
    pub const ZERO: Kopeks = Kopeks(0);

    pub const fn from_raw(kopeks: i64) -> Self {
        Kopeks(kopeks)
    }

    pub fn from_rubles(rubles: f64) -> Self {
        Kopeks(round_minor(rubles * KOPEKS_PER_RUBLE as f64))
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    pub fn to_rubles(self) -> f64 {
        self.0 as f64 / KOPEKS_PER_RUBLE as f64
    }

    /// Multiplies by a float factor and rounds back to kopeks.
    pub fn scale(self, factor: f64) -> Self {
        Kopeks(round_minor(self.0 as f64 * factor))
    }

    pub fn floor_zero(self) -> Self {
        self.max(Kopeks::ZERO)
    }
}

impl Add for Kopeks {
    type Output = Kopeks;

    fn add(self, rhs: Kopeks) -> Kopeks {
        Kopeks(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Kopeks {
    fn add_assign(&mut self, rhs: Kopeks) {
        *self = *self + rhs;
    }
}

impl Sub for Kopeks {
    type Output = Kopeks;

    fn sub(self, rhs: Kopeks) -> Kopeks {
        Kopeks(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Kopeks {
    fn sub_assign(&mut self, rhs: Kopeks) {
        *self = *self - rhs;
    }
}

impl Mul<i64> for Kopeks {
    type Output = Kopeks;

    fn mul(self, rhs: i64) -> Kopeks {
        Kopeks(self.0.saturating_mul(rhs))
    }
}
