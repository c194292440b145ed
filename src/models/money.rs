use std::fmt;

use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: i64 = 3600;

/// Amount in minor currency units (grosze).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// `round(self * duration_secs / 3600, 2)` with halves rounded away from zero.
    pub fn prorate_hourly(&self, duration_secs: u64) -> Money {
        let duration = i128::from(duration_secs.min(i64::MAX as u64) as i64);
        let numerator = i128::from(self.0) * duration;
        let hour = i128::from(SECONDS_PER_HOUR);
        let quotient = numerator / hour;
        let remainder = numerator % hour;
        let rounded = if remainder.abs() * 2 >= hour {
            quotient + numerator.signum()
        } else {
            quotient
        };
        Money(rounded.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
        assert_eq!(Money::from_cents(-1250).to_string(), "-12.50");
    }

    #[test]
    fn prorates_full_and_partial_hours() {
        let tariff = Money::from_cents(500);
        assert_eq!(tariff.prorate_hourly(3600), Money::from_cents(500));
        assert_eq!(tariff.prorate_hourly(0), Money::from_cents(0));
        assert_eq!(tariff.prorate_hourly(1800), Money::from_cents(250));
        // 5.00 * 100 / 3600 = 0.1388.. -> 0.14
        assert_eq!(tariff.prorate_hourly(100), Money::from_cents(14));
    }

    #[test]
    fn prorate_rounds_half_up() {
        // 1.00 * 18 / 3600 = 0.005 -> 0.01
        assert_eq!(Money::from_cents(100).prorate_hourly(18), Money::from_cents(1));
        // 1.00 * 17 / 3600 = 0.00472 -> 0.00
        assert_eq!(Money::from_cents(100).prorate_hourly(17), Money::from_cents(0));
    }
}
