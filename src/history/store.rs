use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{HistoryError, PersistenceError};
use crate::history::model::{
    RecordId, UsageEntry, UsageRecord, history_file_view, parse_history_text,
};
use crate::storage::{HISTORY_KEY, KeyValueStore, read_blob, write_json};
use crate::usage::DailyUsage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub record_count: usize,
    pub daily_usage: DailyUsage,
    pub daily_watt_hours: f64,
}

/// Append-only usage history kept as one blob under `deviceHistory`.
///
/// The collection is loaded on first access and cached. Every mutation builds the
/// next collection, writes it in full and only then replaces the cached view, so a
/// failed write leaves the store exactly as it was.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    records: Option<Vec<UsageRecord>>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            records: None,
        }
    }

    pub async fn list(&mut self) -> Result<&[UsageRecord], PersistenceError> {
        self.ensure_loaded().await?;
        Ok(self.cached())
    }

    pub async fn append(&mut self, entry: UsageEntry) -> Result<UsageRecord, HistoryError> {
        self.append_at(entry, Utc::now()).await
    }

    pub async fn append_at(
        &mut self,
        entry: UsageEntry,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, HistoryError> {
        entry.check_storable().map_err(HistoryError::InvalidEntry)?;
        self.ensure_loaded().await?;

        let id = match entry.id {
            Some(id) if self.cached().iter().any(|record| record.id == id) => {
                return Err(HistoryError::DuplicateId(id));
            }
            Some(id) => id,
            None => self.next_id(now),
        };
        let record = UsageRecord::from_entry(entry, id);

        let mut next = self.cached().to_vec();
        next.push(record.clone());
        self.persist(&next).await?;
        self.records = Some(next);

        info!(
            id = %record.id,
            device = %record.device_name,
            daily_usage = %record.daily_usage,
            "usage record appended"
        );
        Ok(record)
    }

    pub async fn remove(&mut self, id: RecordId) -> Result<UsageRecord, HistoryError> {
        self.ensure_loaded().await?;

        let Some(index) = self.cached().iter().position(|record| record.id == id) else {
            return Err(HistoryError::NotFound(id));
        };
        let mut next = self.cached().to_vec();
        let removed = next.remove(index);
        self.persist(&next).await?;
        self.records = Some(next);

        info!(id = %removed.id, device = %removed.device_name, "usage record removed");
        Ok(removed)
    }

    pub async fn aggregate(&mut self) -> Result<DailyUsage, PersistenceError> {
        self.ensure_loaded().await?;
        Ok(aggregate(self.cached()))
    }

    pub async fn summary(&mut self) -> Result<HistorySummary, PersistenceError> {
        self.ensure_loaded().await?;
        Ok(summarize(self.cached()))
    }

    async fn ensure_loaded(&mut self) -> Result<(), PersistenceError> {
        if self.records.is_some() {
            return Ok(());
        }
        let records = match read_blob(self.store.as_ref(), HISTORY_KEY).await? {
            Some(content) => parse_history_text(&content)?,
            None => Vec::new(),
        };
        debug!(count = records.len(), "usage history loaded");
        self.records = Some(records);
        Ok(())
    }

    fn cached(&self) -> &[UsageRecord] {
        self.records.as_deref().unwrap_or_default()
    }

    // Ids follow the clock but never repeat or go backwards, even for two appends
    // in the same millisecond.
    fn next_id(&self, now: DateTime<Utc>) -> RecordId {
        let candidate = RecordId::for_time(now);
        match self.cached().iter().map(|record| record.id).max() {
            Some(last) if last >= candidate => last.next(),
            _ => candidate,
        }
    }

    async fn persist(&self, records: &[UsageRecord]) -> Result<(), PersistenceError> {
        write_json(self.store.as_ref(), HISTORY_KEY, &history_file_view(records)).await
    }
}

pub fn aggregate(records: &[UsageRecord]) -> DailyUsage {
    records.iter().map(|record| record.daily_usage).sum()
}

pub fn summarize(records: &[UsageRecord]) -> HistorySummary {
    HistorySummary {
        record_count: records.len(),
        daily_usage: aggregate(records),
        daily_watt_hours: records.iter().map(UsageRecord::daily_watt_hours).sum(),
    }
}
