//! Amount-due computation and duration text for the departure view.

use serde::{Deserialize, Serialize};

use crate::models::Money;

/// `round(tariff_per_hour * duration_secs / 3600, 2)`.
pub fn amount_due(tariff_per_hour: Money, duration_secs: u64) -> Money {
    tariff_per_hour.prorate_hourly(duration_secs)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DurationLocale {
    #[default]
    Polish,
    English,
}

#[derive(Clone, Copy)]
enum Unit {
    Day,
    Hour,
    Minute,
    Second,
}

impl DurationLocale {
    fn unit_name(&self, unit: Unit, count: u64) -> &'static str {
        match self {
            DurationLocale::English => {
                let one = count == 1;
                match (unit, one) {
                    (Unit::Day, true) => "day",
                    (Unit::Day, false) => "days",
                    (Unit::Hour, true) => "hour",
                    (Unit::Hour, false) => "hours",
                    (Unit::Minute, true) => "minute",
                    (Unit::Minute, false) => "minutes",
                    (Unit::Second, true) => "second",
                    (Unit::Second, false) => "seconds",
                }
            }
            DurationLocale::Polish => {
                let forms = match unit {
                    Unit::Day => ["dzień", "dni", "dni"],
                    Unit::Hour => ["godzina", "godziny", "godzin"],
                    Unit::Minute => ["minuta", "minuty", "minut"],
                    Unit::Second => ["sekunda", "sekundy", "sekund"],
                };
                forms[polish_plural_form(count)]
            }
        }
    }
}

/// 0 = singular, 1 = 2-4 form ("2 godziny"), 2 = genitive plural ("5 godzin").
fn polish_plural_form(count: u64) -> usize {
    let tens = count % 100;
    let units = count % 10;
    if count == 1 {
        0
    } else if (2..=4).contains(&units) && !(12..=14).contains(&tens) {
        1
    } else {
        2
    }
}

/// Renders the largest non-zero unit and every smaller unit, e.g.
/// `1 godzina 0 minut 5 sekund`.
pub fn format_duration(duration_secs: u64, locale: DurationLocale) -> String {
    let parts = [
        (Unit::Day, duration_secs / 86_400),
        (Unit::Hour, duration_secs % 86_400 / 3600),
        (Unit::Minute, duration_secs % 3600 / 60),
        (Unit::Second, duration_secs % 60),
    ];

    let first = parts
        .iter()
        .position(|(_, count)| *count > 0)
        .unwrap_or(parts.len() - 1);

    parts[first..]
        .iter()
        .map(|(unit, count)| format!("{count} {}", locale.unit_name(*unit, *count)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hour_at_five_is_five() {
        assert_eq!(amount_due(Money::from_cents(500), 3600), Money::from_cents(500));
    }

    #[test]
    fn partial_hours_round_to_grosze() {
        assert_eq!(amount_due(Money::from_cents(500), 5400), Money::from_cents(750));
        assert_eq!(amount_due(Money::from_cents(333), 60), Money::from_cents(6));
    }

    #[test]
    fn polish_plural_forms() {
        assert_eq!(format_duration(1, DurationLocale::Polish), "1 sekunda");
        assert_eq!(format_duration(3, DurationLocale::Polish), "3 sekundy");
        assert_eq!(format_duration(5, DurationLocale::Polish), "5 sekund");
        assert_eq!(format_duration(12, DurationLocale::Polish), "12 sekund");
        assert_eq!(format_duration(22, DurationLocale::Polish), "22 sekundy");
        assert_eq!(format_duration(0, DurationLocale::Polish), "0 sekund");
    }

    #[test]
    fn shows_units_below_the_largest() {
        assert_eq!(
            format_duration(3600, DurationLocale::Polish),
            "1 godzina 0 minut 0 sekund"
        );
        assert_eq!(
            format_duration(2 * 86_400 + 3 * 3600 + 21 * 60 + 14, DurationLocale::Polish),
            "2 dni 3 godziny 21 minut 14 sekund"
        );
        assert_eq!(format_duration(86_400 + 62, DurationLocale::Polish), "1 dzień 0 godzin 1 minuta 2 sekundy");
    }

    #[test]
    fn english_plural_forms() {
        assert_eq!(
            format_duration(3661, DurationLocale::English),
            "1 hour 1 minute 1 second"
        );
        assert_eq!(format_duration(120, DurationLocale::English), "2 minutes 0 seconds");
    }
}
