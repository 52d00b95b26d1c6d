use crate::manifest::Policy;

/// Result of merging a desired template list into the applied one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The complete list to write back.
    pub order: Vec<String>,
    pub changed: bool,
}

/// Compute the full template order to write for `desired` on top of `observed`.
///
/// The platform only accepts a complete replacement of the template list,
/// so even an incremental change has to be expressed as the whole list.
///
/// Under [`Policy::Set`] the result is `desired` verbatim.
///
/// Under [`Policy::Add`] every observed template keeps its relative
/// position and nothing is removed. Each run of templates that are new in
/// `desired` is inserted right before the next template of `desired` that
/// is already applied (its anchor). A trailing run without an anchor is
/// appended at the end.
///
/// ```
/// use centreon_reconciler::manifest::Policy;
/// use centreon_reconciler::merge::merge_template_order;
///
/// let observed = vec!["A".to_string(), "B".to_string()];
/// let desired = vec!["C".to_string(), "B".to_string()];
/// let merged = merge_template_order(&observed, &desired, Policy::Add);
/// assert_eq!(merged.order, ["A", "C", "B"]);
/// assert!(merged.changed);
/// ```
pub fn merge_template_order(
    observed: &[String],
    desired: &[String],
    policy: Policy,
) -> MergeOutcome {
    let order = match policy {
        Policy::Set => desired.to_vec(),
        Policy::Add => insert_missing(observed, desired),
    };
    let changed = order.as_slice() != observed;
    MergeOutcome { order, changed }
}

fn insert_missing(observed: &[String], desired: &[String]) -> Vec<String> {
    let mut order = observed.to_vec();
    let mut pending: Vec<&String> = Vec::new();

    for name in desired {
        if observed.contains(name) {
            if pending.is_empty() {
                continue;
            }
            // `order` only grows, and only with names not in `observed`,
            // so the anchor is always still there.
            let at = order.iter().position(|n| n == name).unwrap_or(order.len());
            order.splice(at..at, pending.drain(..).cloned());
        } else if !order.contains(name) && !pending.contains(&name) {
            pending.push(name);
        }
    }

    order.extend(pending.into_iter().cloned());
    order
}
