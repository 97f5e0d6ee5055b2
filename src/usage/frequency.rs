use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Canonical weekday codes, `MON` through `SUN`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayCode {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayCode {
    pub const ALL: [DayCode; 7] = [
        DayCode::Mon,
        DayCode::Tue,
        DayCode::Wed,
        DayCode::Thu,
        DayCode::Fri,
        DayCode::Sat,
        DayCode::Sun,
    ];

    pub fn code(self) -> &'static str {
        match self {
            DayCode::Mon => "MON",
            DayCode::Tue => "TUE",
            DayCode::Wed => "WED",
            DayCode::Thu => "THU",
            DayCode::Fri => "FRI",
            DayCode::Sat => "SAT",
            DayCode::Sun => "SUN",
        }
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, DayCode::Sat | DayCode::Sun)
    }
}

impl fmt::Display for DayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseDayCodeError(String);

impl fmt::Display for ParseDayCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid day '{}', expected one of MON..SUN", self.0)
    }
}

impl std::error::Error for ParseDayCodeError {}

impl FromStr for DayCode {
    type Err = ParseDayCodeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wanted = input.trim();
        DayCode::ALL
            .into_iter()
            .find(|day| day.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseDayCodeError(input.to_string()))
    }
}

impl From<DayCode> for Weekday {
    fn from(value: DayCode) -> Self {
        match value {
            DayCode::Mon => Weekday::Mon,
            DayCode::Tue => Weekday::Tue,
            DayCode::Wed => Weekday::Wed,
            DayCode::Thu => Weekday::Thu,
            DayCode::Fri => Weekday::Fri,
            DayCode::Sat => Weekday::Sat,
            DayCode::Sun => Weekday::Sun,
        }
    }
}

impl From<Weekday> for DayCode {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Mon => DayCode::Mon,
            Weekday::Tue => DayCode::Tue,
            Weekday::Wed => DayCode::Wed,
            Weekday::Thu => DayCode::Thu,
            Weekday::Fri => DayCode::Fri,
            Weekday::Sat => DayCode::Sat,
            Weekday::Sun => DayCode::Sun,
        }
    }
}

/// The frequency dropdown without its day selection; also the persisted tag.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyKind {
    Everyday,
    Weekdays,
    Weekends,
    Specific,
}

impl FrequencyKind {
    pub fn tag(self) -> &'static str {
        match self {
            FrequencyKind::Everyday => "everyday",
            FrequencyKind::Weekdays => "weekdays",
            FrequencyKind::Weekends => "weekends",
            FrequencyKind::Specific => "specific",
        }
    }
}

impl fmt::Display for FrequencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum FrequencySelection {
    Everyday,
    Weekdays,
    Weekends,
    Specific(BTreeSet<DayCode>),
}

impl FrequencySelection {
    pub fn specific(days: impl IntoIterator<Item = DayCode>) -> Self {
        FrequencySelection::Specific(days.into_iter().collect())
    }

    pub fn kind(&self) -> FrequencyKind {
        match self {
            FrequencySelection::Everyday => FrequencyKind::Everyday,
            FrequencySelection::Weekdays => FrequencyKind::Weekdays,
            FrequencySelection::Weekends => FrequencyKind::Weekends,
            FrequencySelection::Specific(_) => FrequencyKind::Specific,
        }
    }

    /// Explicitly chosen days; empty for the fixed patterns.
    pub fn selected_days(&self) -> Vec<DayCode> {
        match self {
            FrequencySelection::Specific(days) => days.iter().copied().collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for FrequencySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrequencySelection::Specific(days) => {
                let codes = days.iter().map(|day| day.code()).collect::<Vec<_>>();
                write!(f, "specific ({})", codes.join(", "))
            }
            other => f.write_str(other.kind().tag()),
        }
    }
}

/// Fraction of the week a device is in use, kept as an exact `days / 7`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Multiplier {
    days: u8,
}

impl Multiplier {
    pub const DAYS_PER_WEEK: u8 = 7;

    pub fn numerator(self) -> u8 {
        self.days
    }

    pub fn denominator(self) -> u8 {
        Self::DAYS_PER_WEEK
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.days) / f64::from(Self::DAYS_PER_WEEK)
    }
}

pub fn multiplier(selection: &FrequencySelection) -> Multiplier {
    let days = match selection {
        FrequencySelection::Everyday => 7,
        FrequencySelection::Weekdays => 5,
        FrequencySelection::Weekends => 2,
        // A set of canonical codes never holds more than 7 entries.
        FrequencySelection::Specific(days) => days.len().min(7) as u8,
    };
    Multiplier { days }
}

pub fn active_days(selection: &FrequencySelection) -> Vec<DayCode> {
    DayCode::ALL
        .into_iter()
        .filter(|day| covers(selection, *day))
        .collect()
}

pub fn occurs_on(selection: &FrequencySelection, weekday: Weekday) -> bool {
    covers(selection, DayCode::from(weekday))
}

fn covers(selection: &FrequencySelection, day: DayCode) -> bool {
    match selection {
        FrequencySelection::Everyday => true,
        FrequencySelection::Weekdays => !day.is_weekend(),
        FrequencySelection::Weekends => day.is_weekend(),
        FrequencySelection::Specific(days) => days.contains(&day),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipliers_match_fraction_of_week() {
        let everyday = multiplier(&FrequencySelection::Everyday);
        assert_eq!((everyday.numerator(), everyday.denominator()), (7, 7));
        assert!((everyday.as_f64() - 1.0).abs() < f64::EPSILON);

        assert_eq!(multiplier(&FrequencySelection::Weekdays).numerator(), 5);
        assert_eq!(multiplier(&FrequencySelection::Weekends).numerator(), 2);

        let mwf = FrequencySelection::specific([DayCode::Mon, DayCode::Wed, DayCode::Fri]);
        let three = multiplier(&mwf);
        assert_eq!((three.numerator(), three.denominator()), (3, 7));
    }

    #[test]
    fn specific_days_collapse_duplicates() {
        let selection =
            FrequencySelection::specific([DayCode::Tue, DayCode::Tue, DayCode::Sat, DayCode::Tue]);
        assert_eq!(multiplier(&selection).numerator(), 2);
        assert_eq!(selection.selected_days(), vec![DayCode::Tue, DayCode::Sat]);
    }

    #[test]
    fn day_codes_parse_case_insensitively() {
        assert_eq!("MON".parse::<DayCode>(), Ok(DayCode::Mon));
        assert_eq!(" sun ".parse::<DayCode>(), Ok(DayCode::Sun));
        assert!("Funday".parse::<DayCode>().is_err());
    }

    #[test]
    fn day_codes_serialize_uppercase() {
        let json = serde_json::to_string(&[DayCode::Mon, DayCode::Thu]).expect("serialize");
        assert_eq!(json, r#"["MON","THU"]"#);
        let parsed: Vec<DayCode> = serde_json::from_str(r#"["SAT"]"#).expect("deserialize");
        assert_eq!(parsed, vec![DayCode::Sat]);
    }

    #[test]
    fn active_days_follow_pattern() {
        assert_eq!(active_days(&FrequencySelection::Everyday).len(), 7);
        assert_eq!(
            active_days(&FrequencySelection::Weekends),
            vec![DayCode::Sat, DayCode::Sun]
        );
        assert_eq!(
            active_days(&FrequencySelection::Weekdays),
            vec![
                DayCode::Mon,
                DayCode::Tue,
                DayCode::Wed,
                DayCode::Thu,
                DayCode::Fri
            ]
        );
        assert!(occurs_on(&FrequencySelection::Weekdays, Weekday::Wed));
        assert!(!occurs_on(&FrequencySelection::Weekdays, Weekday::Sun));
        assert!(occurs_on(
            &FrequencySelection::specific([DayCode::Thu]),
            Weekday::Thu
        ));
    }

    #[test]
    fn display_lists_specific_days() {
        let selection = FrequencySelection::specific([DayCode::Fri, DayCode::Mon]);
        assert_eq!(selection.to_string(), "specific (MON, FRI)");
        assert_eq!(FrequencySelection::Weekends.to_string(), "weekends");
    }
}
