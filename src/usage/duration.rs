use std::fmt;

use serde::Serialize;

use crate::error::ValidationError;

pub const MINUTES_PER_HOUR: u32 = 60;
pub const MINUTES_PER_DAY: u32 = 1_440;

/// Hours and minutes of use on a usage day. Never longer than one day.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize)]
pub struct UsageDuration {
    hours: u32,
    minutes: u32,
}

impl UsageDuration {
    pub const FULL_DAY: Self = Self {
        hours: 24,
        minutes: 0,
    };

    /// Builds a duration only if it fits in one day; used when decoding stored records.
    pub fn try_new(hours: u32, minutes: u32) -> Option<Self> {
        (total_minutes(hours, minutes) <= u64::from(MINUTES_PER_DAY))
            .then_some(Self { hours, minutes })
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn total_minutes(&self) -> u32 {
        self.hours * MINUTES_PER_HOUR + self.minutes
    }

    pub fn total_hours(&self) -> f64 {
        f64::from(self.hours) + f64::from(self.minutes) / f64::from(MINUTES_PER_HOUR)
    }

    pub fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0
    }
}

impl fmt::Display for UsageDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {:02}m", self.hours, self.minutes)
    }
}

/// One half of a duration as typed into the form: free text or a number.
pub trait DurationPart {
    fn to_part(&self) -> u32;
}

impl DurationPart for u32 {
    fn to_part(&self) -> u32 {
        *self
    }
}

impl DurationPart for i64 {
    fn to_part(&self) -> u32 {
        u32::try_from((*self).max(0)).unwrap_or(u32::MAX)
    }
}

impl DurationPart for &str {
    fn to_part(&self) -> u32 {
        parse_leading_integer(self)
    }
}

impl DurationPart for String {
    fn to_part(&self) -> u32 {
        parse_leading_integer(self)
    }
}

/// Edit-time normalization: unparsable parts read as zero and anything longer
/// than a day becomes exactly 24h 00m.
pub fn normalize(hours: impl DurationPart, minutes: impl DurationPart) -> UsageDuration {
    let hours = hours.to_part();
    let minutes = minutes.to_part();
    if total_minutes(hours, minutes) > u64::from(MINUTES_PER_DAY) {
        return UsageDuration::FULL_DAY;
    }
    UsageDuration { hours, minutes }
}

/// Submission-time check, separate from the clamp in [`normalize`]:
/// `{1, 90}` survives normalization and is only rejected here.
pub fn validate_for_submission(duration: &UsageDuration) -> Result<(), ValidationError> {
    if duration.is_zero() {
        return Err(ValidationError::ZeroDuration);
    }
    if duration.minutes >= MINUTES_PER_HOUR {
        return Err(ValidationError::MinutesOutOfRange);
    }
    Ok(())
}

fn total_minutes(hours: u32, minutes: u32) -> u64 {
    u64::from(hours) * u64::from(MINUTES_PER_HOUR) + u64::from(minutes)
}

// Reads an optional '+' and the digits that follow; a leading '-' means the value is
// negative and therefore 0.
fn parse_leading_integer(text: &str) -> u32 {
    let trimmed = text.trim_start();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    digits
        .chars()
        .map_while(|ch| ch.to_digit(10))
        .fold(0_u32, |acc, digit| acc.saturating_mul(10).saturating_add(digit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_exact_pair_within_a_day() {
        let duration = normalize(2_u32, 45_u32);
        assert_eq!((duration.hours(), duration.minutes()), (2, 45));
        assert_eq!(normalize(24_u32, 0_u32), UsageDuration::FULL_DAY);
        assert_eq!(normalize(23_u32, 60_u32).total_minutes(), MINUTES_PER_DAY);
    }

    #[test]
    fn normalize_clamps_overflow_to_full_day() {
        assert_eq!(normalize(24_u32, 1_u32), UsageDuration::FULL_DAY);
        assert_eq!(normalize(23_u32, 61_u32), UsageDuration::FULL_DAY);
        assert_eq!(normalize(0_u32, 5_000_u32), UsageDuration::FULL_DAY);
        assert_eq!(normalize(u32::MAX, u32::MAX), UsageDuration::FULL_DAY);
    }

    #[test]
    fn normalize_reads_text_like_a_form_field() {
        assert_eq!(normalize("3", "15"), normalize(3_u32, 15_u32));
        assert_eq!(normalize("12abc", " 7"), normalize(12_u32, 7_u32));
        assert_eq!(normalize("1.5", "+4"), normalize(1_u32, 4_u32));
        assert_eq!(normalize("", "abc"), UsageDuration::default());
        assert_eq!(normalize("-3", "30"), normalize(0_u32, 30_u32));
        assert_eq!(normalize(-2_i64, 10_i64), normalize(0_u32, 10_u32));
        assert_eq!(
            normalize("99999999999999".to_string(), "0".to_string()),
            UsageDuration::FULL_DAY
        );
    }

    #[test]
    fn submission_rejects_zero_and_long_minutes() {
        assert_eq!(
            validate_for_submission(&normalize(0_u32, 0_u32)),
            Err(ValidationError::ZeroDuration)
        );
        assert_eq!(
            validate_for_submission(&normalize(1_u32, 60_u32)),
            Err(ValidationError::MinutesOutOfRange)
        );
        assert_eq!(validate_for_submission(&normalize(1_u32, 30_u32)), Ok(()));
    }

    #[test]
    fn clamp_and_submission_check_stay_independent() {
        // 90 minutes fits in a day, so the clamp leaves it alone and only submission catches it.
        let typed = normalize(1_u32, 90_u32);
        assert_eq!((typed.hours(), typed.minutes()), (1, 90));
        assert_eq!(
            validate_for_submission(&typed),
            Err(ValidationError::MinutesOutOfRange)
        );

        // An overflowing edit is forced to 24h 00m, which then passes submission.
        let clamped = normalize(23_u32, 75_u32);
        assert_eq!(clamped, UsageDuration::FULL_DAY);
        assert_eq!(validate_for_submission(&clamped), Ok(()));
    }

    #[test]
    fn try_new_rejects_more_than_a_day() {
        assert!(UsageDuration::try_new(24, 0).is_some());
        assert!(UsageDuration::try_new(1, 90).is_some());
        assert!(UsageDuration::try_new(24, 1).is_none());
    }

    #[test]
    fn total_hours_uses_base_sixty() {
        let duration = normalize(2_u32, 45_u32);
        assert_eq!(duration.total_minutes(), 165);
        assert!((duration.total_hours() - 2.75).abs() < f64::EPSILON);
        assert_eq!(duration.to_string(), "2h 45m");
    }
}
