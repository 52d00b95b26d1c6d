use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::manifest::{MacroName, ManagedObjectSpec, Status};

/// The scalar part of an object as returned by a lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub name: String,
    pub alias: Option<String>,
    pub address: Option<String>,
    /// `None` when the platform does not report an activation flag for the kind.
    pub status: Option<Status>,
    pub parent_template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedMacro {
    pub value: String,
    pub is_password: bool,
    pub description: Option<String>,
}

/// Last-known remote truth for one object.
///
/// Only the aspects the desired spec manages are fetched. An unmanaged
/// aspect is left empty, which the diff never looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedObjectSnapshot {
    pub name: String,
    pub alias: Option<String>,
    pub address: Option<String>,
    pub status: Option<Status>,
    pub parent_template: Option<String>,
    /// In the order the platform reports them.
    pub templates: Vec<String>,
    pub groups: Vec<String>,
    pub macros: BTreeMap<MacroName, ObservedMacro>,
    pub params: BTreeMap<String, String>,
}

impl ManagedObjectSnapshot {
    pub fn from_record(record: ObjectRecord) -> Self {
        Self {
            name: record.name,
            alias: record.alias,
            address: record.address,
            status: record.status,
            parent_template: record.parent_template,
            ..Default::default()
        }
    }

    /// The state a successful creation is expected to leave behind.
    ///
    /// Used for previews only: the controller always re-reads the object
    /// after a real creation.
    pub fn expected_after_create(spec: &ManagedObjectSpec) -> Self {
        Self {
            name: spec.name.clone(),
            alias: spec.alias.clone(),
            address: spec.address.clone(),
            status: spec.kind.supports_status().then_some(Status::Enabled),
            parent_template: spec.parent_template.clone(),
            templates: if spec.kind.templates_are_ordered() {
                spec.templates.clone()
            } else {
                Vec::new()
            },
            ..Default::default()
        }
    }
}
