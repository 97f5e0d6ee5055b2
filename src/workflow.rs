use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::device::{DeviceCatalog, DeviceDescriptor};
use crate::error::{SubmitError, ValidationError};
use crate::history::{HistoryStore, UsageEntry, UsageRecord};
use crate::recent::RecentDevicesCache;
use crate::storage::KeyValueStore;
use crate::usage::{
    DailyUsage, DayCode, DurationPart, FrequencyKind, FrequencySelection, UsageDuration, compute,
    normalize, validate_for_submission,
};

/// Contents of the add-device form between edits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddDeviceForm {
    device_id: Option<String>,
    wattage: Option<u32>,
    frequency: Option<FrequencyKind>,
    days: BTreeSet<DayCode>,
    duration: UsageDuration,
}

impl AddDeviceForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks a device from the catalog or the recent list and pre-fills its wattage.
    pub fn select_device(&mut self, descriptor: &DeviceDescriptor) {
        self.device_id = Some(descriptor.id.clone());
        self.wattage = Some(descriptor.default_wattage);
    }

    /// Picks a device by id only. Any earlier wattage is dropped, so the catalog
    /// default applies at submission unless [`set_wattage`](Self::set_wattage) follows.
    pub fn select_device_id(&mut self, id: impl Into<String>) {
        self.device_id = Some(id.into());
        self.wattage = None;
    }

    pub fn set_wattage(&mut self, watts: u32) {
        self.wattage = Some(watts);
    }

    pub fn set_frequency(&mut self, kind: FrequencyKind) {
        self.frequency = Some(kind);
    }

    /// Returns whether the day is selected after the toggle.
    pub fn toggle_day(&mut self, day: DayCode) -> bool {
        if self.days.remove(&day) {
            false
        } else {
            self.days.insert(day)
        }
    }

    pub fn set_days(&mut self, days: impl IntoIterator<Item = DayCode>) {
        self.days = days.into_iter().collect();
    }

    pub fn edit_duration(&mut self, hours: impl DurationPart, minutes: impl DurationPart) {
        self.duration = normalize(hours, minutes);
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn wattage(&self) -> Option<u32> {
        self.wattage
    }

    pub fn duration(&self) -> UsageDuration {
        self.duration
    }

    pub fn frequency(&self) -> Option<FrequencySelection> {
        self.frequency.map(|kind| match kind {
            FrequencyKind::Everyday => FrequencySelection::Everyday,
            FrequencyKind::Weekdays => FrequencySelection::Weekdays,
            FrequencyKind::Weekends => FrequencySelection::Weekends,
            FrequencyKind::Specific => FrequencySelection::Specific(self.days.clone()),
        })
    }

    /// Live estimate shown while the form is being filled in.
    pub fn preview_usage(&self) -> Option<DailyUsage> {
        self.frequency()
            .map(|selection| compute(&self.duration, &selection))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn validate(&self, catalog: &DeviceCatalog) -> Result<Submission, ValidationError> {
        validate_for_submission(&self.duration)?;

        let device_id = self
            .device_id
            .as_deref()
            .ok_or(ValidationError::NoDeviceSelected)?;
        let descriptor = catalog
            .lookup(device_id)
            .map_err(|_| ValidationError::UnknownDevice(device_id.to_string()))?
            .clone();

        let frequency = self.frequency().ok_or(ValidationError::NoFrequencySelected)?;
        if matches!(&frequency, FrequencySelection::Specific(days) if days.is_empty()) {
            return Err(ValidationError::NoDaysSelected);
        }

        Ok(Submission {
            wattage: self.wattage.unwrap_or(descriptor.default_wattage),
            descriptor,
            frequency,
            duration: self.duration,
        })
    }
}

struct Submission {
    descriptor: DeviceDescriptor,
    wattage: u32,
    frequency: FrequencySelection,
    duration: UsageDuration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    Validating,
    Invalid(ValidationError),
    Valid,
    Submitting,
    Failed(String),
    Succeeded,
}

impl WorkflowState {
    fn can_move_to(&self, next: &WorkflowState) -> bool {
        matches!(
            (self, next),
            (WorkflowState::Idle, WorkflowState::Validating)
                | (WorkflowState::Validating, WorkflowState::Invalid(_))
                | (WorkflowState::Validating, WorkflowState::Valid)
                | (WorkflowState::Valid, WorkflowState::Submitting)
                | (WorkflowState::Submitting, WorkflowState::Failed(_))
                | (WorkflowState::Submitting, WorkflowState::Succeeded)
                | (WorkflowState::Invalid(_), WorkflowState::Idle)
                | (WorkflowState::Failed(_), WorkflowState::Idle)
                | (WorkflowState::Succeeded, WorkflowState::Idle)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub record: UsageRecord,
    /// False when the record was committed but the recent-devices list could not be saved.
    pub recent_updated: bool,
}

/// Owns the catalog, the history store and the recent-devices cache, and runs the
/// add-device workflow over them.
///
/// Submission borrows the tracker mutably for its whole duration, so only one
/// submission can be in flight and history writes never interleave.
pub struct UsageTracker {
    catalog: DeviceCatalog,
    history: HistoryStore,
    recent: RecentDevicesCache,
    state: WorkflowState,
    trail: Vec<WorkflowState>,
}

impl UsageTracker {
    pub fn new(catalog: DeviceCatalog, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            catalog,
            history: HistoryStore::new(Arc::clone(&store)),
            recent: RecentDevicesCache::new(store),
            state: WorkflowState::Idle,
            trail: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    pub fn history(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn recent(&mut self) -> &mut RecentDevicesCache {
        &mut self.recent
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// States visited by the most recent submission, starting from `Validating`.
    pub fn trail(&self) -> &[WorkflowState] {
        &self.trail
    }

    pub async fn submit(&mut self, form: &mut AddDeviceForm) -> Result<SubmitOutcome, SubmitError> {
        self.submit_at(form, Utc::now()).await
    }

    pub async fn submit_at(
        &mut self,
        form: &mut AddDeviceForm,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, SubmitError> {
        self.trail.clear();
        self.enter(WorkflowState::Validating);

        let submission = match form.validate(&self.catalog) {
            Ok(submission) => submission,
            Err(reason) => {
                self.enter(WorkflowState::Invalid(reason.clone()));
                self.enter(WorkflowState::Idle);
                return Err(SubmitError::Invalid(reason));
            }
        };
        self.enter(WorkflowState::Valid);
        self.enter(WorkflowState::Submitting);

        let entry = UsageEntry::new(
            submission.descriptor.display_name.clone(),
            submission.wattage,
            submission.duration,
            submission.frequency,
        );
        let record = match self.history.append_at(entry, now).await {
            Ok(record) => record,
            Err(err) => {
                self.enter(WorkflowState::Failed(err.to_string()));
                self.enter(WorkflowState::Idle);
                return Err(SubmitError::Failed(err));
            }
        };

        // The record is committed at this point; the recent list is best-effort.
        let recent_updated = match self.recent.record_use(submission.descriptor).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, id = %record.id, "recent devices not updated");
                false
            }
        };

        self.enter(WorkflowState::Succeeded);
        form.reset();
        self.enter(WorkflowState::Idle);
        Ok(SubmitOutcome {
            record,
            recent_updated,
        })
    }

    fn enter(&mut self, next: WorkflowState) {
        debug_assert!(
            self.state.can_move_to(&next),
            "invalid workflow transition {:?} -> {next:?}",
            self.state
        );
        debug!(from = ?self.state, to = ?next, "add-device workflow");
        self.trail.push(next.clone());
        self.state = next;
    }
}
