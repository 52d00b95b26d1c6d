use std::collections::HashSet;

use crate::manifest::{DesiredState, ManagedObjectSpec, Policy, Status};
use crate::merge::merge_template_order;
use crate::plan::{Attribute, NewObject, Operation};
use crate::state::ManagedObjectSnapshot;

/// Compare desired state against the observed snapshot and list the
/// operations needed to converge, in execution order.
///
/// `None` means the object does not exist on the platform. For a missing
/// object that should be present only the creation steps are returned:
/// the controller re-reads the object afterwards and diffs again.
///
/// Never emits an operation whose effect already holds.
pub fn diff(
    desired: &ManagedObjectSpec,
    observed: Option<&ManagedObjectSnapshot>,
) -> Vec<Operation> {
    match (desired.state, observed) {
        (DesiredState::Absent, None) => vec![],
        // Delete pre-empts every other intent.
        (DesiredState::Absent, Some(_)) => vec![Operation::Delete],
        (DesiredState::Present, None) => {
            let mut ops = vec![Operation::Create(NewObject::from_spec(desired))];
            if desired.kind.applies_template_inheritance() {
                ops.push(Operation::ApplyTemplateInheritance);
            }
            ops
        }
        (DesiredState::Present, Some(observed)) => {
            let mut ops = Vec::new();
            ops.extend(status_ops(desired, observed));
            ops.extend(attribute_ops(desired, observed));
            ops.extend(group_ops(desired, observed));
            ops.extend(template_ops(desired, observed));
            ops.extend(macro_ops(desired, observed));
            ops.extend(param_ops(desired, observed));
            ops
        }
    }
}

fn status_ops(
    desired: &ManagedObjectSpec,
    observed: &ManagedObjectSnapshot,
) -> Option<Operation> {
    if !desired.kind.supports_status() {
        return None;
    }
    let wanted = desired.status?;
    if observed.status == Some(wanted) {
        return None;
    }
    Some(match wanted {
        Status::Enabled => Operation::Enable,
        Status::Disabled => Operation::Disable,
    })
}

/// An unset desired value leaves the remote value alone.
fn attribute_op(
    attribute: Attribute,
    desired: Option<&String>,
    observed: Option<&String>,
) -> Option<Operation> {
    let to = desired.filter(|v| !v.is_empty())?;
    if observed == Some(to) {
        return None;
    }
    Some(Operation::SetAttribute {
        attribute,
        from: observed.cloned(),
        to: to.clone(),
    })
}

fn attribute_ops(
    desired: &ManagedObjectSpec,
    observed: &ManagedObjectSnapshot,
) -> Vec<Operation> {
    let mut ops = Vec::new();
    ops.extend(attribute_op(
        Attribute::Alias,
        desired.alias.as_ref(),
        observed.alias.as_ref(),
    ));
    if desired.kind.supports_address() {
        ops.extend(attribute_op(
            Attribute::Address,
            desired.address.as_ref(),
            observed.address.as_ref(),
        ));
    }
    if desired.kind.supports_parent_template() {
        ops.extend(attribute_op(
            Attribute::ParentTemplate,
            desired.parent_template.as_ref(),
            observed.parent_template.as_ref(),
        ));
    }
    ops
}

fn group_ops(desired: &ManagedObjectSpec, observed: &ManagedObjectSnapshot) -> Vec<Operation> {
    if !desired.kind.supports_groups() || !desired.manages_groups() {
        return vec![];
    }
    match desired.groups_policy {
        Policy::Add => desired
            .groups
            .iter()
            .filter(|g| !observed.groups.contains(g))
            .map(|g| Operation::AddToGroup { group: g.clone() })
            .collect(),
        Policy::Set => {
            let wanted: HashSet<&String> = desired.groups.iter().collect();
            let current: HashSet<&String> = observed.groups.iter().collect();
            if wanted == current {
                vec![]
            } else {
                vec![Operation::SetGroups {
                    groups: desired.groups.clone(),
                }]
            }
        }
    }
}

fn template_ops(desired: &ManagedObjectSpec, observed: &ManagedObjectSnapshot) -> Vec<Operation> {
    if !desired.kind.supports_templates() || !desired.manages_templates() {
        return vec![];
    }

    let mut ops = Vec::new();
    if !desired.kind.templates_are_ordered() {
        match desired.templates_policy {
            Policy::Add => {
                let missing: Vec<String> = desired
                    .templates
                    .iter()
                    .filter(|t| !observed.templates.contains(t))
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    ops.push(Operation::AddTemplates { templates: missing });
                }
            }
            Policy::Set => {
                let wanted: HashSet<&String> = desired.templates.iter().collect();
                let current: HashSet<&String> = observed.templates.iter().collect();
                if wanted != current {
                    ops.push(Operation::SetTemplateOrder {
                        from: observed.templates.clone(),
                        to: desired.templates.clone(),
                    });
                }
            }
        }
    } else {
        let merged = merge_template_order(
            &observed.templates,
            &desired.templates,
            desired.templates_policy,
        );
        if merged.changed {
            ops.push(Operation::SetTemplateOrder {
                from: observed.templates.clone(),
                to: merged.order,
            });
        }
    }

    if !ops.is_empty() && desired.kind.applies_template_inheritance() {
        ops.push(Operation::ApplyTemplateInheritance);
    }
    ops
}

fn macro_ops(desired: &ManagedObjectSpec, observed: &ManagedObjectSnapshot) -> Vec<Operation> {
    desired
        .macros
        .iter()
        .filter(|(name, spec)| {
            observed
                .macros
                .get(*name)
                .is_none_or(|current| current.value != spec.value)
        })
        .map(|(name, spec)| Operation::SetMacro {
            name: name.clone(),
            spec: spec.clone(),
        })
        .collect()
}

fn param_ops(desired: &ManagedObjectSpec, observed: &ManagedObjectSnapshot) -> Vec<Operation> {
    desired
        .params
        .iter()
        .filter(|(key, value)| observed.params.get(*key) != Some(*value))
        .map(|(key, value)| Operation::SetParam {
            key: key.clone(),
            from: observed.params.get(key).cloned(),
            value: value.clone(),
        })
        .collect()
}
