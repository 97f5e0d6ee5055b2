pub mod model;
pub mod store;

pub use model::{RecordId, UsageEntry, UsageRecord};
pub use store::{HistoryStore, HistorySummary, aggregate, summarize};
