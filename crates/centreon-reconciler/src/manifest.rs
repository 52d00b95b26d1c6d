use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::addr::ObjectAddr;
use crate::error::ReconcileError;
use crate::kind::ObjectKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Enabled,
    Disabled,
}

/// How a list-valued attribute is mutated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Union with what the platform already has.
    #[default]
    Add,
    /// Exact replacement.
    Set,
}

/// A macro name in the platform's canonical form.
///
/// The platform treats macro names case-insensitively and reports them
/// wrapped as `$_HOSTNAME$` or `$_SERVICENAME$`, so every comparison and
/// every write goes through this type. `snmp_port`, `$_HOSTSNMP_PORT$` and
/// `SNMP_PORT` all normalize to `SNMP_PORT`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MacroName(String);

impl MacroName {
    pub fn new(raw: &str) -> Result<Self, ReconcileError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReconcileError::Validation("macro name is empty".into()));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ReconcileError::Validation(format!(
                "macro name {trimmed:?} contains whitespace"
            )));
        }
        let upper = trimmed.replace('$', "").to_uppercase();
        let bare = upper
            .strip_prefix("_HOST")
            .or_else(|| upper.strip_prefix("_SERVICE"))
            .unwrap_or(&upper);
        if bare.is_empty() {
            return Err(ReconcileError::Validation(format!(
                "macro name {trimmed:?} is empty once normalized"
            )));
        }
        Ok(Self(bare.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacroName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MacroName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        MacroName::new(&raw).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroSpec {
    pub value: String,
    #[serde(default)]
    pub is_password: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Desired state of one object, validated.
///
/// Built once per request from an [`ObjectDeclaration`] through
/// `TryFrom`, and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedObjectSpec {
    pub kind: ObjectKind,
    pub name: String,
    pub state: DesiredState,
    /// `None` for kinds without an enable/disable switch.
    pub status: Option<Status>,
    pub alias: Option<String>,
    pub address: Option<String>,
    /// Poller the object is attached to at creation.
    pub instance: Option<String>,
    pub parent_template: Option<String>,
    /// Most specific first.
    pub templates: Vec<String>,
    pub templates_policy: Policy,
    pub groups: Vec<String>,
    pub groups_policy: Policy,
    pub macros: BTreeMap<MacroName, MacroSpec>,
    pub params: BTreeMap<String, String>,
}

impl ManagedObjectSpec {
    pub fn addr(&self) -> ObjectAddr {
        ObjectAddr::new(self.kind, self.name.clone())
    }

    /// Which aspects the reconciler has to read back from the platform.
    pub fn manages_templates(&self) -> bool {
        !self.templates.is_empty()
    }

    pub fn manages_groups(&self) -> bool {
        !self.groups.is_empty()
    }
}

/// One entry of the desired-state manifest, as written by the caller.
///
/// Field aliases accept the spelling used by the Ansible modules this tool
/// replaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectDeclaration {
    pub kind: ObjectKind,
    pub name: String,
    #[serde(default)]
    pub state: DesiredState,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default, alias = "ipaddr")]
    pub address: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default, alias = "parenttemplate")]
    pub parent_template: Option<String>,
    #[serde(default, alias = "hosttemplates")]
    pub templates: Vec<String>,
    #[serde(default, alias = "hosttemplates_action")]
    pub templates_action: Policy,
    #[serde(default, alias = "hostgroups")]
    pub groups: Vec<String>,
    #[serde(default, alias = "hostgroups_action")]
    pub groups_action: Policy,
    #[serde(default)]
    pub macros: Vec<MacroDeclaration>,
    #[serde(default)]
    pub params: ParamDeclarations,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MacroDeclaration {
    pub name: String,
    pub value: String,
    #[serde(default, alias = "ispassword", deserialize_with = "deserialize_flag")]
    pub is_password: bool,
    #[serde(default, alias = "desc")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDeclaration {
    pub name: String,
    pub value: String,
}

/// Params may be written either as a list of `{name, value}` pairs or as a
/// plain mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamDeclarations {
    List(Vec<ParamDeclaration>),
    Map(BTreeMap<String, String>),
}

impl Default for ParamDeclarations {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl ParamDeclarations {
    fn into_pairs(self) -> Vec<(String, String)> {
        match self {
            Self::List(list) => list.into_iter().map(|p| (p.name, p.value)).collect(),
            Self::Map(map) => map.into_iter().collect(),
        }
    }
}

fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u64),
        Str(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(n) => Ok(n != 0),
        Flag::Str(s) => match s.trim() {
            "1" | "true" | "yes" => Ok(true),
            "" | "0" | "false" | "no" => Ok(false),
            other => Err(D::Error::custom(format!("invalid flag value {other:?}"))),
        },
    }
}

fn unsupported(kind: ObjectKind, field: &str) -> ReconcileError {
    ReconcileError::Validation(format!("{} does not support `{field}`", kind.label()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<ObjectDeclaration> for ManagedObjectSpec {
    type Error = ReconcileError;

    fn try_from(decl: ObjectDeclaration) -> Result<Self, Self::Error> {
        let kind = decl.kind;
        let name = decl.name.trim().to_string();
        if name.is_empty() {
            return Err(ReconcileError::Validation(format!(
                "{} name is empty",
                kind.label()
            )));
        }
        let addr = ObjectAddr::new(kind, name.clone());

        let status = match (decl.status, kind.supports_status()) {
            (Some(status), true) => Some(status),
            (None, true) => Some(Status::Enabled),
            (Some(_), false) => return Err(unsupported(kind, "status").with_object(&addr)),
            (None, false) => None,
        };

        let address = non_empty(decl.address);
        if address.is_some() && !kind.supports_address() {
            return Err(unsupported(kind, "address").with_object(&addr));
        }
        let parent_template = non_empty(decl.parent_template);
        if parent_template.is_some() && !kind.supports_parent_template() {
            return Err(unsupported(kind, "parent_template").with_object(&addr));
        }
        let instance = non_empty(decl.instance);
        if instance.is_some() && kind != ObjectKind::Host {
            return Err(unsupported(kind, "instance").with_object(&addr));
        }
        if !decl.templates.is_empty() && !kind.supports_templates() {
            return Err(unsupported(kind, "templates").with_object(&addr));
        }
        if !decl.groups.is_empty() && !kind.supports_groups() {
            return Err(unsupported(kind, "groups").with_object(&addr));
        }
        if !decl.macros.is_empty() && !kind.supports_macros() {
            return Err(unsupported(kind, "macros").with_object(&addr));
        }

        let mut templates = Vec::with_capacity(decl.templates.len());
        for template in decl.templates {
            let template = template.trim().to_string();
            if template.is_empty() {
                return Err(
                    ReconcileError::Validation("template name is empty".into()).with_object(&addr)
                );
            }
            if templates.contains(&template) {
                return Err(ReconcileError::Validation(format!(
                    "template {template:?} listed twice"
                ))
                .with_object(&addr));
            }
            templates.push(template);
        }

        let mut groups: Vec<String> = Vec::with_capacity(decl.groups.len());
        for group in decl.groups {
            let group = group.trim().to_string();
            if group.is_empty() {
                return Err(
                    ReconcileError::Validation("group name is empty".into()).with_object(&addr)
                );
            }
            if !groups.contains(&group) {
                groups.push(group);
            }
        }

        let mut macros = BTreeMap::new();
        for m in decl.macros {
            let macro_name = MacroName::new(&m.name).map_err(|e| e.with_object(&addr))?;
            if macros.contains_key(&macro_name) {
                return Err(ReconcileError::Validation(format!(
                    "macro {macro_name} listed twice"
                ))
                .with_object(&addr));
            }
            macros.insert(
                macro_name,
                MacroSpec {
                    value: m.value,
                    is_password: m.is_password,
                    description: non_empty(m.description),
                },
            );
        }

        let pairs = decl.params.into_pairs();
        if !pairs.is_empty() && !kind.supports_params() {
            return Err(unsupported(kind, "params").with_object(&addr));
        }
        let mut params = BTreeMap::new();
        for (key, value) in pairs {
            let key = key.trim().to_string();
            if key.is_empty() {
                return Err(
                    ReconcileError::Validation("param name is empty".into()).with_object(&addr)
                );
            }
            if params.insert(key.clone(), value).is_some() {
                return Err(
                    ReconcileError::Validation(format!("param {key:?} listed twice"))
                        .with_object(&addr),
                );
            }
        }

        Ok(Self {
            kind,
            name,
            state: decl.state,
            status,
            alias: non_empty(decl.alias),
            address,
            instance,
            parent_template,
            templates,
            templates_policy: decl.templates_action,
            groups,
            groups_policy: decl.groups_action,
            macros,
            params,
        })
    }
}

/// The desired-state document: every object the run should converge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub objects: Vec<ObjectDeclaration>,
}

impl Manifest {
    /// Parse a manifest. Accepts either `{"objects": [...]}` or a bare array.
    pub fn from_json(json: &str) -> Result<Self, ReconcileError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ReconcileError::Validation(format!("manifest is not valid JSON: {e}")))?;
        let value = match value {
            serde_json::Value::Array(_) => serde_json::json!({ "objects": value }),
            other => other,
        };
        serde_json::from_value(value).map_err(|e| ReconcileError::Validation(e.to_string()))
    }

    /// Validate every declaration. The same object may only appear once.
    pub fn into_specs(self) -> Result<Vec<ManagedObjectSpec>, ReconcileError> {
        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(self.objects.len());
        for decl in self.objects {
            let spec = ManagedObjectSpec::try_from(decl)?;
            if !seen.insert(spec.addr()) {
                return Err(ReconcileError::Validation(format!(
                    "{} declared more than once",
                    spec.addr()
                )));
            }
            specs.push(spec);
        }
        Ok(specs)
    }
}
