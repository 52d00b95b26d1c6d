use crate::addr::ObjectAddr;
use crate::client::RemoteStateClient;
use crate::diff::diff;
use crate::error::{ClientError, ReconcileError};
use crate::manifest::{DesiredState, ManagedObjectSpec};
use crate::plan::{Operation, Step};
use crate::report::{ChangeLog, ReconciliationResult};
use crate::state::ManagedObjectSnapshot;

/// Read the current state of the object `spec` describes.
///
/// Only the aspects `spec` manages are fetched: groups, templates,
/// macros and params each cost one extra round trip.
pub fn observe(
    client: &dyn RemoteStateClient,
    spec: &ManagedObjectSpec,
) -> Result<Option<ManagedObjectSnapshot>, ClientError> {
    let addr = spec.addr();
    let Some(record) = client.get(&addr)? else {
        tracing::debug!(addr = %addr, "object not found");
        return Ok(None);
    };

    let mut snapshot = ManagedObjectSnapshot::from_record(record);
    if spec.state == DesiredState::Absent {
        return Ok(Some(snapshot));
    }
    if spec.kind.supports_groups() && spec.manages_groups() {
        snapshot.groups = client.get_groups(&addr)?;
    }
    if spec.kind.supports_templates() && spec.manages_templates() {
        snapshot.templates = client.get_template_order(&addr)?;
    }
    if spec.kind.supports_macros() && !spec.macros.is_empty() {
        snapshot.macros = client.get_macros(&addr)?;
    }
    if spec.kind.supports_params() && !spec.params.is_empty() {
        let keys: Vec<String> = spec.params.keys().cloned().collect();
        snapshot.params = client.get_params(&addr, &keys)?;
    }
    Ok(Some(snapshot))
}

/// Converge one object.
///
/// Lookup, then create or delete, then (after re-reading a freshly created
/// object) status, attributes, groups, templates, macros and params, in
/// that order. The first failure stops the sequence; nothing already
/// applied is rolled back, and the result still reports it.
pub fn reconcile(
    client: &dyn RemoteStateClient,
    desired: &ManagedObjectSpec,
) -> ReconciliationResult {
    let addr = desired.addr();
    let mut log = ChangeLog::default();
    let outcome = run(client, desired, &addr, &mut log);
    if let Err(e) = &outcome {
        tracing::warn!(
            addr = %addr,
            changed = log.changed(),
            error = %e,
            "reconciliation halted"
        );
    }
    log.finish(addr, outcome)
}

fn run(
    client: &dyn RemoteStateClient,
    desired: &ManagedObjectSpec,
    addr: &ObjectAddr,
    log: &mut ChangeLog,
) -> Result<(), ReconcileError> {
    let observed = lookup(client, desired, addr)?;

    let observed = match (desired.state, observed) {
        (DesiredState::Absent, None) => {
            tracing::debug!(addr = %addr, "already absent");
            return Ok(());
        }
        (DesiredState::Absent, Some(observed)) => {
            for op in diff(desired, Some(&observed)) {
                apply(client, addr, &op, log)?;
            }
            return Ok(());
        }
        (DesiredState::Present, Some(observed)) => observed,
        (DesiredState::Present, None) => {
            let mut created = None;
            for op in diff(desired, None) {
                apply(client, addr, &op, log)?;
                if matches!(op, Operation::Create(_)) {
                    // Derived fields only exist once the platform has the object.
                    let fresh = lookup(client, desired, addr)?.ok_or_else(|| {
                        ReconcileError::RemoteOperation {
                            addr: addr.clone(),
                            step: Step::Lookup,
                            message: "object not found after creation".into(),
                        }
                    })?;
                    created = Some(fresh);
                }
            }
            created.ok_or_else(|| ReconcileError::RemoteOperation {
                addr: addr.clone(),
                step: Step::Lifecycle,
                message: "creation produced no object".into(),
            })?
        }
    };

    let ops = diff(desired, Some(&observed));
    if ops.is_empty() {
        tracing::debug!(addr = %addr, "in sync");
    }
    for op in &ops {
        apply(client, addr, op, log)?;
    }
    Ok(())
}

fn lookup(
    client: &dyn RemoteStateClient,
    desired: &ManagedObjectSpec,
    addr: &ObjectAddr,
) -> Result<Option<ManagedObjectSnapshot>, ReconcileError> {
    observe(client, desired).map_err(|e| ReconcileError::remote(addr, Step::Lookup, &e))
}

/// Execute one operation and record it on success.
fn apply(
    client: &dyn RemoteStateClient,
    addr: &ObjectAddr,
    op: &Operation,
    log: &mut ChangeLog,
) -> Result<(), ReconcileError> {
    tracing::debug!(addr = %addr, step = %op.step(), ?op, "applying operation");
    let result = match op {
        Operation::Create(object) => client.add(addr, object),
        Operation::Delete => client.delete(addr),
        Operation::Enable => client.enable(addr),
        Operation::Disable => client.disable(addr),
        Operation::SetAttribute { attribute, to, .. } => {
            client.set_attribute(addr, *attribute, to)
        }
        Operation::AddToGroup { group } => client.add_to_group(addr, group),
        Operation::SetGroups { groups } => client.set_groups(addr, groups),
        Operation::AddTemplates { templates } => client.add_templates(addr, templates),
        Operation::SetTemplateOrder { to, .. } => client.set_template_order(addr, to),
        Operation::ApplyTemplateInheritance => client.apply_template_inheritance(addr),
        Operation::SetMacro { name, spec } => client.set_macro(addr, name, spec),
        Operation::SetParam { key, value, .. } => client.set_param(addr, key, value),
    };
    result.map_err(|e| ReconcileError::remote(addr, op.step(), &e))?;
    log.record(op.describe(addr));
    Ok(())
}

/// List the operations `reconcile` would run, without mutating anything.
///
/// For a missing object the creation steps are followed by the diff against
/// the state the creation is expected to produce. The real run re-reads
/// the object instead, so the tail of such a preview is an estimate.
pub fn preview(
    client: &dyn RemoteStateClient,
    desired: &ManagedObjectSpec,
) -> Result<Vec<Operation>, ReconcileError> {
    let addr = desired.addr();
    let observed = lookup(client, desired, &addr)?;
    let mut ops = diff(desired, observed.as_ref());
    if observed.is_none() && desired.state == DesiredState::Present {
        let expected = ManagedObjectSnapshot::expected_after_create(desired);
        ops.extend(diff(desired, Some(&expected)));
    }
    Ok(ops)
}
