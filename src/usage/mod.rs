pub mod calculator;
pub mod duration;
pub mod frequency;

pub use calculator::{DailyUsage, compute};
pub use duration::{DurationPart, UsageDuration, normalize, validate_for_submission};
pub use frequency::{
    DayCode, FrequencyKind, FrequencySelection, Multiplier, active_days, multiplier, occurs_on,
};
