use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use crate::usage::duration::UsageDuration;
use crate::usage::frequency::{FrequencySelection, Multiplier, multiplier};

/// Average hours of use per day, held in exact tenths of an hour.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DailyUsage {
    tenths: u64,
}

impl DailyUsage {
    pub const ZERO: Self = Self { tenths: 0 };

    pub fn from_tenths(tenths: u64) -> Self {
        Self { tenths }
    }

    pub fn tenths(self) -> u64 {
        self.tenths
    }

    pub fn hours(self) -> f64 {
        self.tenths as f64 / 10.0
    }

    /// Daily energy for a device drawing `wattage` watts while in use.
    pub fn watt_hours(self, wattage: u32) -> f64 {
        (self.tenths * u64::from(wattage)) as f64 / 10.0
    }
}

impl fmt::Display for DailyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tenths / 10, self.tenths % 10)
    }
}

impl Add for DailyUsage {
    type Output = DailyUsage;

    fn add(self, rhs: Self) -> Self::Output {
        DailyUsage {
            tenths: self.tenths.saturating_add(rhs.tenths),
        }
    }
}

impl Sum for DailyUsage {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(DailyUsage::ZERO, Add::add)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseDailyUsageError(String);

impl fmt::Display for ParseDailyUsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid usage '{}', expected hours with exactly one decimal",
            self.0
        )
    }
}

impl std::error::Error for ParseDailyUsageError {}

impl FromStr for DailyUsage {
    type Err = ParseDailyUsageError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDailyUsageError(input.to_string());
        let (whole, fraction) = input.split_once('.').ok_or_else(invalid)?;
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || fraction.len() != 1 || !all_digits(fraction) {
            return Err(invalid());
        }
        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let fraction: u64 = fraction.parse().map_err(|_| invalid())?;
        whole
            .checked_mul(10)
            .and_then(|tenths| tenths.checked_add(fraction))
            .map(DailyUsage::from_tenths)
            .ok_or_else(invalid)
    }
}

/// `hours + minutes/60` scaled by the weekly multiplier and rounded half-up to one
/// decimal. Worked in integers: tenths = total_minutes * days / 42.
pub fn compute(duration: &UsageDuration, selection: &FrequencySelection) -> DailyUsage {
    scaled(duration, multiplier(selection))
}

fn scaled(duration: &UsageDuration, multiplier: Multiplier) -> DailyUsage {
    // 60 minutes * 7 days / 10 tenths
    const DIVISOR: u64 = 42;
    let numerator = u64::from(duration.total_minutes()) * u64::from(multiplier.numerator());
    DailyUsage::from_tenths((2 * numerator + DIVISOR) / (2 * DIVISOR))
}
