use std::fmt;

use serde::{Deserialize, Serialize};

use crate::addr::ObjectAddr;
use crate::manifest::{MacroName, MacroSpec, ManagedObjectSpec};

/// The minimal fields an object is created with.
///
/// Everything else (status, groups, macros, params) is converged by the
/// regular sync steps after the object has been re-read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewObject {
    pub alias: Option<String>,
    pub address: Option<String>,
    /// Parent templates for hosts and host templates.
    pub templates: Vec<String>,
    pub instance: Option<String>,
    pub parent_template: Option<String>,
}

impl NewObject {
    pub fn from_spec(spec: &ManagedObjectSpec) -> Self {
        Self {
            alias: spec.alias.clone(),
            address: spec.address.clone(),
            templates: if spec.kind.templates_are_ordered() {
                spec.templates.clone()
            } else {
                Vec::new()
            },
            instance: spec.instance.clone(),
            parent_template: spec.parent_template.clone(),
        }
    }
}

/// Scalar attributes synced through `SetAttribute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Alias,
    Address,
    ParentTemplate,
}

impl Attribute {
    /// Parameter name on the platform side.
    pub fn param_name(self) -> &'static str {
        match self {
            Self::Alias => "alias",
            Self::Address => "address",
            Self::ParentTemplate => "template",
        }
    }
}

/// The stage of the per-object sequence an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Lookup,
    Lifecycle,
    Status,
    Attributes,
    Groups,
    Templates,
    Macros,
    Params,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Lookup => "lookup",
            Self::Lifecycle => "create/delete",
            Self::Status => "status sync",
            Self::Attributes => "attribute sync",
            Self::Groups => "group sync",
            Self::Templates => "template sync",
            Self::Macros => "macro sync",
            Self::Params => "param sync",
        })
    }
}

/// A single mutating intent against one object.
///
/// Operations are plain data until the controller executes them, so the
/// diff can be tested without a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Create(NewObject),
    Delete,
    Enable,
    Disable,
    SetAttribute {
        attribute: Attribute,
        from: Option<String>,
        to: String,
    },
    AddToGroup {
        group: String,
    },
    SetGroups {
        groups: Vec<String>,
    },
    AddTemplates {
        templates: Vec<String>,
    },
    SetTemplateOrder {
        from: Vec<String>,
        to: Vec<String>,
    },
    SetMacro {
        name: MacroName,
        #[serde(serialize_with = "serialize_redacted")]
        spec: MacroSpec,
    },
    SetParam {
        key: String,
        from: Option<String>,
        value: String,
    },
    ApplyTemplateInheritance,
}

/// Password macro values never leave the process in a rendered plan.
fn serialize_redacted<S: serde::Serializer>(
    spec: &MacroSpec,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if spec.is_password {
        let redacted = MacroSpec {
            value: "****".into(),
            ..spec.clone()
        };
        redacted.serialize(serializer)
    } else {
        spec.serialize(serializer)
    }
}

impl Operation {
    pub fn step(&self) -> Step {
        match self {
            Self::Create(_) | Self::Delete => Step::Lifecycle,
            Self::Enable | Self::Disable => Step::Status,
            Self::SetAttribute { .. } => Step::Attributes,
            Self::AddToGroup { .. } | Self::SetGroups { .. } => Step::Groups,
            Self::AddTemplates { .. }
            | Self::SetTemplateOrder { .. }
            | Self::ApplyTemplateInheritance => Step::Templates,
            Self::SetMacro { .. } => Step::Macros,
            Self::SetParam { .. } => Step::Params,
        }
    }

    /// Human-readable change message for the run report.
    pub fn describe(&self, addr: &ObjectAddr) -> String {
        let label = addr.kind.label();
        let name = &addr.name;
        match self {
            Self::Create(_) => format!("Add {label}: {name}"),
            Self::Delete => format!("Delete {label}: {name}"),
            Self::Enable => format!("Enable {label}: {name}"),
            Self::Disable => format!("Disable {label}: {name}"),
            Self::SetAttribute {
                attribute,
                from,
                to,
            } => format!(
                "Change {} of {label} {name}: {} -> {to}",
                attribute.param_name(),
                from.as_deref().unwrap_or("<unset>")
            ),
            Self::AddToGroup { group } => format!("Add {label} {name} to group {group}"),
            Self::SetGroups { groups } => {
                format!("Set groups of {label} {name}: {}", groups.join(", "))
            }
            Self::AddTemplates { templates } => {
                format!("Add templates to {label} {name}: {}", templates.join(", "))
            }
            Self::SetTemplateOrder { from, to } => format!(
                "Set templates of {label} {name}: [{}] -> [{}]",
                from.join(", "),
                to.join(", ")
            ),
            Self::SetMacro { name: macro_name, .. } => {
                format!("Set macro {macro_name} on {label} {name}")
            }
            Self::SetParam { key, from, value } => format!(
                "Set param {key} on {label} {name}: {} -> {value}",
                from.as_deref().unwrap_or("<unset>")
            ),
            Self::ApplyTemplateInheritance => {
                format!("Apply templates on {label} {name}")
            }
        }
    }
}
