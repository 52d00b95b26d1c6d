use serde::Serialize;

use crate::addr::ObjectAddr;
use crate::error::ReconcileError;

/// Append-only log of committed changes for one object.
///
/// `changed` can only be set through [`ChangeLog::record`], and only ever
/// to `true`.
#[derive(Debug, Default)]
pub struct ChangeLog {
    messages: Vec<String>,
    changed: bool,
}

impl ChangeLog {
    pub fn record(&mut self, message: String) {
        tracing::info!("{message}");
        self.changed = true;
        self.messages.push(message);
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn finish(
        self,
        addr: ObjectAddr,
        outcome: Result<(), ReconcileError>,
    ) -> ReconciliationResult {
        ReconciliationResult {
            addr,
            changed: self.changed,
            messages: self.messages,
            outcome,
        }
    }
}

/// What one object's reconciliation did, including partial progress on
/// failure.
#[derive(Debug, Clone)]
pub struct ReconciliationResult {
    pub addr: ObjectAddr,
    pub changed: bool,
    pub messages: Vec<String>,
    /// `Ok` or the first failure encountered.
    pub outcome: Result<(), ReconcileError>,
}

impl ReconciliationResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error(&self) -> Option<&ReconcileError> {
        self.outcome.as_ref().err()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectReport {
    #[serde(flatten)]
    pub addr: ObjectAddr,
    pub changed: bool,
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ReconciliationResult> for ObjectReport {
    fn from(result: &ReconciliationResult) -> Self {
        Self {
            addr: result.addr.clone(),
            changed: result.changed,
            messages: result.messages.clone(),
            error: result.error().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReloadStatus {
    /// The caller did not ask for a reload.
    #[default]
    NotRequested,
    /// Requested, but nothing changed or an object failed.
    Skipped,
    Applied {
        instance: String,
    },
    Failed {
        instance: String,
        error: String,
    },
}

/// Outcome of a whole run, rendered for the caller.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub changed: bool,
    /// Every change message of every object, in execution order.
    pub messages: Vec<String>,
    pub objects: Vec<ObjectReport>,
    pub reload: ReloadStatus,
}

impl RunReport {
    pub fn push(&mut self, result: &ReconciliationResult) {
        self.changed |= result.changed;
        self.messages.extend(result.messages.iter().cloned());
        self.objects.push(ObjectReport::from(result));
    }

    pub fn failed_objects(&self) -> impl Iterator<Item = &ObjectReport> {
        self.objects.iter().filter(|o| o.error.is_some())
    }

    pub fn is_success(&self) -> bool {
        self.failed_objects().next().is_none()
            && !matches!(self.reload, ReloadStatus::Failed { .. })
    }
}
