//! centreon-reconciler
//!
//! Converges Centreon objects (hosts, host templates, service templates,
//! host groups) towards a declared desired state. Every run is idempotent.
//!
//! Public API:
//! - `diff()`: compare desired spec and observed snapshot, produce operations
//! - `merge_template_order()`: full template list for an add/set change
//! - `reconcile()`: converge one object, fail-fast, with a change log
//! - `preview()`: read-only list of the operations `reconcile()` would run
//! - `reconcile_all()`: converge a batch, then reload the poller if needed
//!
//! The platform itself is reached through the [`RemoteStateClient`] trait.

pub mod addr;
pub mod applycfg;
pub mod client;
pub mod diff;
pub mod error;
pub mod kind;
pub mod manifest;
pub mod merge;
pub mod orchestrate;
pub mod plan;
pub mod report;
pub mod state;

pub use crate::addr::ObjectAddr;
pub use crate::applycfg::maybe_apply;
pub use crate::client::RemoteStateClient;
pub use crate::diff::diff;
pub use crate::error::{ClientError, ReconcileError};
pub use crate::kind::ObjectKind;
pub use crate::manifest::{Manifest, ManagedObjectSpec, ObjectDeclaration};
pub use crate::merge::{MergeOutcome, merge_template_order};
pub use crate::orchestrate::{observe, preview, reconcile};
pub use crate::plan::Operation;
pub use crate::report::{ReconciliationResult, ReloadStatus, RunReport};
pub use crate::state::ManagedObjectSnapshot;

/// Run-level options supplied by the caller.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Reload the poller after the run when something changed.
    pub apply_on_change: bool,
    /// Poller to reload.
    pub instance: String,
    /// Keep processing the remaining objects after one fails.
    pub keep_going: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            apply_on_change: true,
            instance: "Central".to_string(),
            keep_going: false,
        }
    }
}

/// Converge every spec in order, then reload the poller if anything changed.
///
/// Objects are independent: each one runs its own fail-fast sequence. A
/// failed object stops the batch unless `keep_going` is set, and a run with
/// a failed object never reloads the poller.
pub fn reconcile_all(
    client: &dyn RemoteStateClient,
    specs: &[ManagedObjectSpec],
    options: &RunOptions,
) -> RunReport {
    let mut report = RunReport::default();
    let mut failed = false;

    for spec in specs {
        let result = reconcile(client, spec);
        report.push(&result);
        if !result.is_ok() {
            failed = true;
            if !options.keep_going {
                tracing::warn!(addr = %result.addr, "stopping run after failed object");
                break;
            }
        }
    }

    report.reload = if !options.apply_on_change {
        ReloadStatus::NotRequested
    } else if failed {
        tracing::warn!(instance = %options.instance, "skipping poller reload after failures");
        ReloadStatus::Skipped
    } else {
        match maybe_apply(client, &options.instance, report.changed, true) {
            Ok(true) => ReloadStatus::Applied {
                instance: options.instance.clone(),
            },
            Ok(false) => ReloadStatus::Skipped,
            Err(e) => {
                tracing::warn!(error = %e, "poller reload failed");
                ReloadStatus::Failed {
                    instance: options.instance.clone(),
                    error: e.to_string(),
                }
            }
        }
    };

    tracing::info!(
        objects = report.objects.len(),
        changed = report.changed,
        success = report.is_success(),
        "run finished"
    );
    report
}
