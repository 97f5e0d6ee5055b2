//! Household device energy tracking.
//!
//! Users pick a device type, say how long and how often it runs, and get back an
//! estimated average number of hours per day. Records and a short most-recently-used
//! device list are kept in an injected key-value store.

pub mod device;
pub mod error;
pub mod history;
pub mod recent;
pub mod storage;
pub mod usage;
pub mod workflow;

pub use device::{DeviceCatalog, DeviceCategory, DeviceDescriptor};
pub use error::{CatalogError, HistoryError, PersistenceError, SubmitError, ValidationError};
pub use history::{HistoryStore, HistorySummary, RecordId, UsageEntry, UsageRecord};
pub use recent::{RECENT_CAPACITY, RecentDevicesCache};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use usage::{DailyUsage, DayCode, FrequencyKind, FrequencySelection, UsageDuration};
pub use workflow::{AddDeviceForm, SubmitOutcome, UsageTracker, WorkflowState};
