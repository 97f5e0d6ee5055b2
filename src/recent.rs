use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::device::DeviceDescriptor;
use crate::error::PersistenceError;
use crate::storage::{KeyValueStore, RECENT_KEY, parse_json, read_blob, write_json};

pub const RECENT_CAPACITY: usize = 5;

/// Most-recently-used device types, newest first, stored under `recentDevices`.
pub struct RecentDevicesCache {
    store: Arc<dyn KeyValueStore>,
    entries: Option<Vec<DeviceDescriptor>>,
}

impl RecentDevicesCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            entries: None,
        }
    }

    pub async fn list(&mut self) -> Result<&[DeviceDescriptor], PersistenceError> {
        self.ensure_loaded().await?;
        Ok(self.cached())
    }

    pub async fn record_use(&mut self, descriptor: DeviceDescriptor) -> Result<(), PersistenceError> {
        self.ensure_loaded().await?;
        let next = promote(self.cached(), descriptor);
        let file = next.iter().map(RecentDeviceFile::from).collect::<Vec<_>>();
        write_json(self.store.as_ref(), RECENT_KEY, &file).await?;
        debug!(
            front = next.first().map(|d| d.id.as_str()).unwrap_or_default(),
            len = next.len(),
            "recent devices updated"
        );
        self.entries = Some(next);
        Ok(())
    }

    async fn ensure_loaded(&mut self) -> Result<(), PersistenceError> {
        if self.entries.is_some() {
            return Ok(());
        }
        let entries = match read_blob(self.store.as_ref(), RECENT_KEY).await? {
            Some(content) => parse_recent_text(&content)?,
            None => Vec::new(),
        };
        self.entries = Some(entries);
        Ok(())
    }

    fn cached(&self) -> &[DeviceDescriptor] {
        self.entries.as_deref().unwrap_or_default()
    }
}

/// `[descriptor]` followed by `previous` without any entry sharing its id, cut to
/// [`RECENT_CAPACITY`].
pub fn promote(previous: &[DeviceDescriptor], descriptor: DeviceDescriptor) -> Vec<DeviceDescriptor> {
    let rest = previous
        .iter()
        .filter(|entry| entry.id != descriptor.id)
        .take(RECENT_CAPACITY - 1)
        .cloned()
        .collect::<Vec<_>>();
    let mut next = Vec::with_capacity(rest.len() + 1);
    next.push(descriptor);
    next.extend(rest);
    next
}

fn parse_recent_text(content: &str) -> Result<Vec<DeviceDescriptor>, PersistenceError> {
    let raw = parse_json::<Vec<RecentDeviceFile>>(RECENT_KEY, content)?;
    if raw.len() > RECENT_CAPACITY {
        return Err(PersistenceError::decode(
            RECENT_KEY,
            format!(
                "holds {} devices; at most {RECENT_CAPACITY} are kept",
                raw.len()
            ),
        ));
    }

    let mut ids = HashSet::new();
    let mut entries = Vec::with_capacity(raw.len());
    for entry in raw {
        if !ids.insert(entry.value.clone()) {
            return Err(PersistenceError::decode(
                RECENT_KEY,
                format!("duplicate device id found: {}", entry.value),
            ));
        }
        entries.push(DeviceDescriptor::new(entry.value, entry.label, entry.wattage));
    }
    Ok(entries)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecentDeviceFile {
    label: String,
    value: String,
    wattage: u32,
}

impl From<&DeviceDescriptor> for RecentDeviceFile {
    fn from(descriptor: &DeviceDescriptor) -> Self {
        Self {
            label: descriptor.display_name.clone(),
            value: descriptor.id.clone(),
            wattage: descriptor.default_wattage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn device(id: &str) -> DeviceDescriptor {
        DeviceDescriptor::new(id, id.to_uppercase(), 10)
    }

    fn ids(entries: &[DeviceDescriptor]) -> Vec<&str> {
        entries.iter().map(|d| d.id.as_str()).collect()
    }

    #[tokio::test]
    async fn reuse_moves_device_to_front_without_duplicates() {
        let mut recent = RecentDevicesCache::new(Arc::new(MemoryStore::new()));
        for id in ["a", "b", "c", "a"] {
            recent.record_use(device(id)).await.expect("record");
        }
        assert_eq!(ids(recent.list().await.expect("list")), vec!["a", "c", "b"]);
    }

    #[test]
    fn promote_moves_existing_entry_to_front() {
        let previous = vec![device("c"), device("b"), device("a")];
        let next = promote(&previous, device("a"));
        assert_eq!(ids(&next), vec!["a", "c", "b"]);
        assert_eq!(ids(&previous), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn oldest_device_is_evicted_past_capacity() {
        let mut recent = RecentDevicesCache::new(Arc::new(MemoryStore::new()));
        for id in ["a", "b", "c", "d", "e", "f"] {
            recent.record_use(device(id)).await.expect("record");
        }
        assert_eq!(
            ids(recent.list().await.expect("list")),
            vec!["f", "e", "d", "c", "b"]
        );
    }

    #[tokio::test]
    async fn persisted_list_reloads_in_order() {
        let store = Arc::new(MemoryStore::new());
        let mut recent = RecentDevicesCache::new(store.clone());
        recent.record_use(device("tv")).await.expect("record");
        recent.record_use(device("fan")).await.expect("record");

        let raw = store.raw(RECENT_KEY).expect("written");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value[0]["value"], "fan");
        assert_eq!(value[0]["label"], "FAN");
        assert_eq!(value[0]["wattage"], 10);

        let mut reloaded = RecentDevicesCache::new(store);
        let first = reloaded.list().await.expect("list").to_vec();
        let second = reloaded.list().await.expect("list").to_vec();
        assert_eq!(ids(&first), vec!["fan", "tv"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_list() {
        let store = Arc::new(MemoryStore::new());
        let mut recent = RecentDevicesCache::new(store.clone());
        recent.record_use(device("tv")).await.expect("record");

        store.set_fail_writes(true);
        let err = recent.record_use(device("fan")).await.expect_err("write fails");
        assert!(matches!(err, PersistenceError::Write { .. }));
        assert_eq!(ids(recent.list().await.expect("list")), vec!["tv"]);
    }

    #[tokio::test]
    async fn rejects_oversized_or_duplicated_storage() {
        let oversized = serde_json::to_string(
            &["a", "b", "c", "d", "e", "f"]
                .iter()
                .map(|id| serde_json::json!({"label": id, "value": id, "wattage": 1}))
                .collect::<Vec<_>>(),
        )
        .expect("json");
        let mut recent =
            RecentDevicesCache::new(Arc::new(MemoryStore::new().with_entry(RECENT_KEY, &oversized)));
        assert!(matches!(
            recent.list().await,
            Err(PersistenceError::Decode { .. })
        ));

        let duplicated = r#"[{"label":"TV","value":"tv","wattage":100},{"label":"TV","value":"tv","wattage":100}]"#;
        let mut recent =
            RecentDevicesCache::new(Arc::new(MemoryStore::new().with_entry(RECENT_KEY, duplicated)));
        let err = recent.list().await.expect_err("duplicate");
        assert!(err.to_string().contains("duplicate device id"));
    }
}
