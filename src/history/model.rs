use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::storage::{HISTORY_KEY, parse_json};
use crate::usage::{
    DailyUsage, DayCode, FrequencyKind, FrequencySelection, UsageDuration, compute,
};

/// Creation-time-derived record id: milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RecordId(u64);

impl RecordId {
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    pub fn created_at(self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(self.0).ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    pub(crate) fn for_time(now: DateTime<Utc>) -> Self {
        Self(u64::try_from(now.timestamp_millis()).unwrap_or(0))
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        input.trim().parse().map(RecordId)
    }
}

/// A usage record that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEntry {
    pub id: Option<RecordId>,
    pub device_name: String,
    pub wattage: u32,
    pub duration: UsageDuration,
    pub frequency: FrequencySelection,
}

impl UsageEntry {
    pub fn new(
        device_name: impl Into<String>,
        wattage: u32,
        duration: UsageDuration,
        frequency: FrequencySelection,
    ) -> Self {
        Self {
            id: None,
            device_name: device_name.into(),
            wattage,
            duration,
            frequency,
        }
    }

    pub fn daily_usage(&self) -> DailyUsage {
        compute(&self.duration, &self.frequency)
    }

    /// Rejects entries that could be written but not read back.
    pub(crate) fn check_storable(&self) -> Result<(), String> {
        if matches!(&self.frequency, FrequencySelection::Specific(days) if days.is_empty()) {
            return Err("specific frequency needs at least one day".to_string());
        }
        Ok(())
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    pub id: RecordId,
    pub device_name: String,
    pub wattage: u32,
    pub duration: UsageDuration,
    pub frequency: FrequencySelection,
    pub daily_usage: DailyUsage,
}

impl UsageRecord {
    pub(crate) fn from_entry(entry: UsageEntry, id: RecordId) -> Self {
        let daily_usage = entry.daily_usage();
        Self {
            id,
            device_name: entry.device_name,
            wattage: entry.wattage,
            duration: entry.duration,
            frequency: entry.frequency,
            daily_usage,
        }
    }

    pub fn daily_watt_hours(&self) -> f64 {
        self.daily_usage.watt_hours(self.wattage)
    }
}

pub(crate) fn parse_history_text(content: &str) -> Result<Vec<UsageRecord>, PersistenceError> {
    let raw = parse_json::<Vec<UsageRecordFile>>(HISTORY_KEY, content)?;

    let mut ids = HashSet::new();
    let mut records = Vec::with_capacity(raw.len());
    for record in raw {
        let id = record.id.parse::<RecordId>().map_err(|_| {
            PersistenceError::decode(HISTORY_KEY, format!("invalid record id '{}'", record.id))
        })?;
        if !ids.insert(id) {
            return Err(PersistenceError::decode(
                HISTORY_KEY,
                format!("duplicate record id found: {id}"),
            ));
        }

        let duration = UsageDuration::try_new(record.duration.hours, record.duration.minutes)
            .ok_or_else(|| {
                PersistenceError::decode(
                    HISTORY_KEY,
                    format!("record {id} has a duration longer than one day"),
                )
            })?;

        let frequency = match (record.frequency, record.days.is_empty()) {
            (FrequencyKind::Specific, true) => {
                return Err(PersistenceError::decode(
                    HISTORY_KEY,
                    format!("record {id} uses specific days but lists none"),
                ));
            }
            (FrequencyKind::Specific, false) => FrequencySelection::specific(record.days),
            (_, false) => {
                return Err(PersistenceError::decode(
                    HISTORY_KEY,
                    format!(
                        "record {id} lists days for frequency '{}'",
                        record.frequency
                    ),
                ));
            }
            (FrequencyKind::Everyday, true) => FrequencySelection::Everyday,
            (FrequencyKind::Weekdays, true) => FrequencySelection::Weekdays,
            (FrequencyKind::Weekends, true) => FrequencySelection::Weekends,
        };

        let daily_usage = record
            .total_usage
            .parse::<DailyUsage>()
            .map_err(|err| PersistenceError::decode(HISTORY_KEY, format!("record {id}: {err}")))?;
        let expected = compute(&duration, &frequency);
        if daily_usage != expected {
            return Err(PersistenceError::decode(
                HISTORY_KEY,
                format!("record {id} has totalUsage {daily_usage}, expected {expected}"),
            ));
        }

        records.push(UsageRecord {
            id,
            device_name: record.device,
            wattage: record.wattage,
            duration,
            frequency,
            daily_usage,
        });
    }

    Ok(records)
}

pub(crate) fn history_file_view(records: &[UsageRecord]) -> Vec<UsageRecordFile> {
    records
        .iter()
        .map(|record| UsageRecordFile {
            id: record.id.to_string(),
            device: record.device_name.clone(),
            duration: DurationFile {
                hours: record.duration.hours(),
                minutes: record.duration.minutes(),
            },
            frequency: record.frequency.kind(),
            days: record.frequency.selected_days(),
            total_usage: record.daily_usage.to_string(),
            wattage: record.wattage,
        })
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct UsageRecordFile {
    id: String,
    device: String,
    duration: DurationFile,
    frequency: FrequencyKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    days: Vec<DayCode>,
    total_usage: String,
    #[serde(default)]
    wattage: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DurationFile {
    hours: u32,
    minutes: u32,
}
