use crate::client::RemoteStateClient;
use crate::error::ReconcileError;

/// Reload the poller once if the run changed something and the caller asked
/// for it. Returns whether the reload was sent.
///
/// Call this after every object of the run has been reconciled. A failure
/// here does not undo or invalidate the object changes already committed.
pub fn maybe_apply(
    client: &dyn RemoteStateClient,
    instance: &str,
    changed: bool,
    requested: bool,
) -> Result<bool, ReconcileError> {
    if !requested {
        tracing::debug!(instance, "poller reload not requested");
        return Ok(false);
    }
    if !changed {
        tracing::debug!(instance, "nothing changed, skipping poller reload");
        return Ok(false);
    }

    tracing::info!(instance, "reloading poller configuration");
    client
        .reload(instance)
        .map_err(|e| ReconcileError::Reload {
            instance: instance.to_string(),
            message: crate::error::format_err_chain(&e),
        })?;
    Ok(true)
}
