mod common;

use centreon_reconciler::diff::diff;
use centreon_reconciler::manifest::{MacroName, Status};
use centreon_reconciler::plan::{Attribute, Operation};
use centreon_reconciler::state::{ManagedObjectSnapshot, ObservedMacro};
use serde_json::json;

use common::{names, spec};

fn host_snapshot() -> ManagedObjectSnapshot {
    ManagedObjectSnapshot {
        name: "h1".into(),
        alias: Some("web".into()),
        address: Some("10.0.0.1".into()),
        status: Some(Status::Enabled),
        ..Default::default()
    }
}

#[test]
fn absent_and_missing_is_converged() {
    let desired = spec(json!({"kind": "host", "name": "h1", "state": "absent"}));
    assert!(diff(&desired, None).is_empty());
}

#[test]
fn delete_preempts_everything_else() {
    let desired = spec(json!({
        "kind": "host",
        "name": "h1",
        "state": "absent",
        "status": "disabled",
        "alias": "other",
        "groups": ["G1"],
        "templates": ["T1"],
        "macros": [{"name": "m", "value": "v"}],
    }));
    let ops = diff(&desired, Some(&host_snapshot()));
    assert_eq!(ops, vec![Operation::Delete]);
}

#[test]
fn missing_host_is_created_then_templates_applied() {
    let desired = spec(json!({
        "kind": "host",
        "name": "h1",
        "alias": "web",
        "address": "10.0.0.1",
        "templates": ["T1", "T2"],
        "groups": ["G1"],
    }));
    let ops = diff(&desired, None);
    assert_eq!(ops.len(), 2);
    match &ops[0] {
        Operation::Create(new) => {
            assert_eq!(new.alias.as_deref(), Some("web"));
            assert_eq!(new.address.as_deref(), Some("10.0.0.1"));
            assert_eq!(new.templates, names(&["T1", "T2"]));
        }
        other => panic!("expected Create, got {other:?}"),
    }
    assert_eq!(ops[1], Operation::ApplyTemplateInheritance);
}

#[test]
fn missing_template_is_created_without_inheritance_call() {
    let desired = spec(json!({"kind": "host_template", "name": "ht1", "templates": ["T1"]}));
    let ops = diff(&desired, None);
    assert!(matches!(ops.as_slice(), [Operation::Create(_)]));
}

#[test]
fn matching_status_emits_nothing() {
    let desired = spec(json!({"kind": "host", "name": "h1", "status": "enabled"}));
    assert!(diff(&desired, Some(&host_snapshot())).is_empty());
}

#[test]
fn status_change_comes_first() {
    let desired = spec(json!({
        "kind": "host",
        "name": "h1",
        "status": "disabled",
        "alias": "renamed",
    }));
    let ops = diff(&desired, Some(&host_snapshot()));
    assert_eq!(ops[0], Operation::Disable);
    assert!(matches!(
        ops[1],
        Operation::SetAttribute {
            attribute: Attribute::Alias,
            ..
        }
    ));

    let mut disabled = host_snapshot();
    disabled.status = Some(Status::Disabled);
    let desired = spec(json!({"kind": "host", "name": "h1"}));
    assert_eq!(diff(&desired, Some(&disabled)), vec![Operation::Enable]);
}

#[test]
fn unset_attributes_are_left_alone() {
    let desired = spec(json!({"kind": "host", "name": "h1", "alias": "", "address": null}));
    assert!(diff(&desired, Some(&host_snapshot())).is_empty());
}

#[test]
fn changed_address_is_written_with_previous_value() {
    let desired = spec(json!({"kind": "host", "name": "h1", "address": "10.0.0.2"}));
    let ops = diff(&desired, Some(&host_snapshot()));
    assert_eq!(
        ops,
        vec![Operation::SetAttribute {
            attribute: Attribute::Address,
            from: Some("10.0.0.1".into()),
            to: "10.0.0.2".into(),
        }]
    );
}

#[test]
fn add_groups_skips_present_ones_in_input_order() {
    let desired = spec(json!({"kind": "host", "name": "h1", "groups": ["G3", "G1", "G2"]}));
    let mut observed = host_snapshot();
    observed.groups = names(&["G1"]);
    let ops = diff(&desired, Some(&observed));
    assert_eq!(
        ops,
        vec![
            Operation::AddToGroup { group: "G3".into() },
            Operation::AddToGroup { group: "G2".into() },
        ]
    );
}

#[test]
fn set_groups_replaces_when_sets_differ() {
    let desired = spec(json!({
        "kind": "host",
        "name": "h1",
        "groups": ["G1", "G2"],
        "groups_action": "set",
    }));

    // Extra group on the platform.
    let mut observed = host_snapshot();
    observed.groups = names(&["G2", "G1", "G9"]);
    assert_eq!(
        diff(&desired, Some(&observed)),
        vec![Operation::SetGroups {
            groups: names(&["G1", "G2"])
        }]
    );

    // Missing group: still a replacement, not only on strict superset.
    observed.groups = names(&["G1"]);
    assert_eq!(diff(&desired, Some(&observed)).len(), 1);

    // Same set in another order.
    observed.groups = names(&["G2", "G1"]);
    assert!(diff(&desired, Some(&observed)).is_empty());
}

#[test]
fn template_change_on_host_triggers_inheritance() {
    let desired = spec(json!({"kind": "host", "name": "h1", "templates": ["C", "B"]}));
    let mut observed = host_snapshot();
    observed.templates = names(&["A", "B"]);
    let ops = diff(&desired, Some(&observed));
    assert_eq!(
        ops,
        vec![
            Operation::SetTemplateOrder {
                from: names(&["A", "B"]),
                to: names(&["A", "C", "B"]),
            },
            Operation::ApplyTemplateInheritance,
        ]
    );
}

#[test]
fn templates_already_applied_emit_nothing() {
    let desired = spec(json!({"kind": "host", "name": "h1", "templates": ["B"]}));
    let mut observed = host_snapshot();
    observed.templates = names(&["A", "B"]);
    assert!(diff(&desired, Some(&observed)).is_empty());
}

#[test]
fn service_template_links_missing_host_templates() {
    let desired = spec(json!({
        "kind": "service_template",
        "name": "st1",
        "hosttemplates": ["HT1", "HT2"],
    }));
    let observed = ManagedObjectSnapshot {
        name: "st1".into(),
        templates: names(&["HT2"]),
        ..Default::default()
    };
    assert_eq!(
        diff(&desired, Some(&observed)),
        vec![Operation::AddTemplates {
            templates: names(&["HT1"])
        }]
    );
}

#[test]
fn service_template_set_ignores_link_order() {
    let desired = spec(json!({
        "kind": "service_template",
        "name": "st1",
        "hosttemplates": ["HT1", "HT2"],
        "hosttemplates_action": "set",
    }));
    let mut observed = ManagedObjectSnapshot {
        name: "st1".into(),
        templates: names(&["HT2", "HT1"]),
        ..Default::default()
    };
    assert!(diff(&desired, Some(&observed)).is_empty());

    observed.templates = names(&["HT2", "HT3"]);
    assert_eq!(
        diff(&desired, Some(&observed)),
        vec![Operation::SetTemplateOrder {
            from: names(&["HT2", "HT3"]),
            to: names(&["HT1", "HT2"]),
        }]
    );
}

#[test]
fn service_template_parent_is_synced() {
    let desired = spec(json!({
        "kind": "service_template",
        "name": "st1",
        "parenttemplate": "generic-service",
    }));
    let observed = ManagedObjectSnapshot {
        name: "st1".into(),
        parent_template: Some("other".into()),
        ..Default::default()
    };
    assert_eq!(
        diff(&desired, Some(&observed)),
        vec![Operation::SetAttribute {
            attribute: Attribute::ParentTemplate,
            from: Some("other".into()),
            to: "generic-service".into(),
        }]
    );
}

#[test]
fn macros_written_only_when_value_differs() {
    let desired = spec(json!({
        "kind": "host",
        "name": "h1",
        "macros": [
            {"name": "same", "value": "1"},
            {"name": "changed", "value": "new"},
            {"name": "missing", "value": "x", "ispassword": 1, "desc": "secret"},
        ],
    }));
    let mut observed = host_snapshot();
    for (name, value) in [("SAME", "1"), ("CHANGED", "old")] {
        observed.macros.insert(
            MacroName::new(name).unwrap(),
            ObservedMacro {
                value: value.into(),
                is_password: false,
                description: None,
            },
        );
    }

    let ops = diff(&desired, Some(&observed));
    let written: Vec<&str> = ops
        .iter()
        .map(|op| match op {
            Operation::SetMacro { name, .. } => name.as_str(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(written, ["CHANGED", "MISSING"]);

    let Operation::SetMacro {
        spec: missing, ..
    } = &ops[1]
    else {
        unreachable!()
    };
    assert!(missing.is_password);
    assert_eq!(missing.description.as_deref(), Some("secret"));
}

#[test]
fn params_written_when_absent_or_different() {
    let desired = spec(json!({
        "kind": "host",
        "name": "h1",
        "params": {"notes": "best server", "notes_url": "https://wiki/h1"},
    }));
    let mut observed = host_snapshot();
    observed.params.insert("notes".into(), "best server".into());
    assert_eq!(
        diff(&desired, Some(&observed)),
        vec![Operation::SetParam {
            key: "notes_url".into(),
            from: None,
            value: "https://wiki/h1".into(),
        }]
    );
}

#[test]
fn empty_param_matches_empty_remote_value() {
    let desired = spec(json!({"kind": "host", "name": "h1", "params": {"notes": ""}}));
    let mut observed = host_snapshot();
    observed.params.insert("notes".into(), String::new());
    assert!(diff(&desired, Some(&observed)).is_empty());
}

#[test]
fn full_diff_follows_step_order() {
    let desired = spec(json!({
        "kind": "host",
        "name": "h1",
        "status": "disabled",
        "address": "10.0.0.9",
        "groups": ["G1"],
        "templates": ["T1"],
        "macros": [{"name": "m", "value": "v"}],
        "params": [{"name": "notes", "value": "n"}],
    }));
    let steps: Vec<_> = diff(&desired, Some(&host_snapshot()))
        .iter()
        .map(Operation::step)
        .collect();
    let mut sorted = steps.clone();
    sorted.sort();
    assert_eq!(steps, sorted);
    assert_eq!(steps.len(), 7);
}

#[test]
fn host_group_alias_sync() {
    let desired = spec(json!({"kind": "host_group", "name": "linux", "alias": "Linux Servers"}));
    let observed = ManagedObjectSnapshot {
        name: "linux".into(),
        alias: Some("linux".into()),
        ..Default::default()
    };
    assert_eq!(
        diff(&desired, Some(&observed)),
        vec![Operation::SetAttribute {
            attribute: Attribute::Alias,
            from: Some("linux".into()),
            to: "Linux Servers".into(),
        }]
    );
}
