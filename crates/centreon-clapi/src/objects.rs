//! Mapping between reconciler operations and CLAPI actions.
//!
//! The parse helpers are pure so they can be tested against captured
//! responses without a server.

use std::collections::BTreeMap;

use centreon_reconciler::ObjectAddr;
use centreon_reconciler::client::RemoteStateClient;
use centreon_reconciler::error::ClientError;
use centreon_reconciler::kind::ObjectKind;
use centreon_reconciler::manifest::{MacroName, MacroSpec, Status};
use centreon_reconciler::plan::{Attribute, NewObject};
use centreon_reconciler::state::{ObjectRecord, ObservedMacro};
use serde_json::Value;

use crate::client::ClapiClient;
use crate::error::ClapiError;

const FIELD_SEPARATOR: char = ';';
const LIST_SEPARATOR: char = '|';

/// CLAPI object code for a kind.
pub fn object_code(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Host => "HOST",
        ObjectKind::HostTemplate => "HTPL",
        ObjectKind::ServiceTemplate => "STPL",
        ObjectKind::HostGroup => "HG",
    }
}

/// Column holding the object name in `show` output. Service templates are
/// keyed by their description.
fn name_column(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::ServiceTemplate => "description",
        _ => "name",
    }
}

/// Join fields with `;`, rejecting values that would shift the columns.
pub fn join_values(fields: &[&str]) -> Result<String, ClapiError> {
    if let Some(bad) = fields.iter().find(|f| f.contains(FIELD_SEPARATOR)) {
        return Err(ClapiError::InvalidValue {
            value: bad.to_string(),
            separator: FIELD_SEPARATOR,
        });
    }
    Ok(fields.join(";"))
}

/// Join list items with `|`.
pub fn join_list(items: &[String]) -> Result<String, ClapiError> {
    if let Some(bad) = items
        .iter()
        .find(|i| i.contains(LIST_SEPARATOR) || i.contains(FIELD_SEPARATOR))
    {
        return Err(ClapiError::InvalidValue {
            value: bad.clone(),
            separator: LIST_SEPARATOR,
        });
    }
    Ok(items.join("|"))
}

fn result_rows(response: &Value) -> Result<&[Value], ClapiError> {
    match response.get("result") {
        Some(Value::Array(rows)) => Ok(rows),
        Some(Value::Null) | None => Ok(&[]),
        Some(other) => Err(ClapiError::Decode(format!(
            "expected a result list, got {other}"
        ))),
    }
}

/// Read a column as text. CLAPI mixes strings and numbers freely.
fn text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn flag(row: &Value, column: &str) -> bool {
    matches!(text(row, column).as_deref(), Some("1") | Some("true"))
}

/// Pick the row named exactly `name` out of a `show` response.
///
/// `show` filters by substring, so `web` also returns `web01`.
pub fn parse_record(
    kind: ObjectKind,
    name: &str,
    response: &Value,
) -> Result<Option<ObjectRecord>, ClapiError> {
    let column = name_column(kind);
    let Some(row) = result_rows(response)?
        .iter()
        .find(|row| text(row, column).as_deref() == Some(name))
    else {
        return Ok(None);
    };

    let status = if kind.supports_status() {
        match text(row, "activate").as_deref() {
            Some("1") => Some(Status::Enabled),
            Some("0") => Some(Status::Disabled),
            _ => None,
        }
    } else {
        None
    };

    Ok(Some(ObjectRecord {
        name: name.to_string(),
        alias: non_empty(text(row, "alias")),
        address: if kind.supports_address() {
            non_empty(text(row, "address"))
        } else {
            None
        },
        status,
        parent_template: None,
    }))
}

/// Names listed by `gethostgroup`, `gettemplate` and `gethosttemplate`,
/// in response order.
pub fn parse_names(response: &Value) -> Result<Vec<String>, ClapiError> {
    result_rows(response)?
        .iter()
        .map(|row| {
            text(row, "name")
                .ok_or_else(|| ClapiError::Decode(format!("row without a name: {row}")))
        })
        .collect()
}

/// Macros defined directly on the object. Inherited rows are skipped.
pub fn parse_macros(
    response: &Value,
) -> Result<BTreeMap<MacroName, ObservedMacro>, ClapiError> {
    let mut macros = BTreeMap::new();
    for row in result_rows(response)? {
        if text(row, "source").is_some_and(|s| s != "direct") {
            continue;
        }
        let raw = text(row, "macro name")
            .ok_or_else(|| ClapiError::Decode(format!("macro row without a name: {row}")))?;
        let name = MacroName::new(&raw)
            .map_err(|e| ClapiError::Decode(format!("macro name {raw:?}: {e}")))?;
        macros.entry(name).or_insert_with(|| ObservedMacro {
            value: text(row, "macro value").unwrap_or_default(),
            is_password: flag(row, "is_password"),
            description: non_empty(text(row, "description")),
        });
    }
    Ok(macros)
}

/// Decode a `getparam` response for `keys`.
///
/// A single key comes back as a bare value, several keys as one object
/// keyed by param name. A requested key that comes back empty or null
/// reads as `""`, so declaring an empty value converges.
pub fn parse_params(
    keys: &[String],
    response: &Value,
) -> Result<BTreeMap<String, String>, ClapiError> {
    let payload = match response.get("result") {
        Some(Value::Array(rows)) => rows.first().cloned().unwrap_or(Value::Null),
        Some(other) => other.clone(),
        None => Value::Null,
    };

    let mut params = BTreeMap::new();
    match &payload {
        Value::Object(_) => {
            for key in keys.iter().filter(|k| payload.get(k.as_str()).is_some()) {
                params.insert(key.clone(), text(&payload, key).unwrap_or_default());
            }
        }
        Value::Null => {}
        scalar => {
            let [key] = keys else {
                return Err(ClapiError::Decode(format!(
                    "single value returned for {} params",
                    keys.len()
                )));
            };
            let value = match scalar {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            params.insert(key.clone(), value);
        }
    }
    Ok(params)
}

impl ClapiClient {
    fn object_call(
        &self,
        action: &str,
        kind: ObjectKind,
        values: &str,
    ) -> Result<Value, ClapiError> {
        self.call(action, Some(object_code(kind)), values)
    }

    fn lookup(&self, addr: &ObjectAddr) -> Result<Option<ObjectRecord>, ClapiError> {
        let response = self.object_call("show", addr.kind, &addr.name)?;
        let Some(mut record) = parse_record(addr.kind, &addr.name, &response)? else {
            return Ok(None);
        };
        if addr.kind.supports_parent_template() {
            let keys = ["template".to_string()];
            record.parent_template = self.params(addr, &keys)?.remove("template");
        }
        Ok(Some(record))
    }

    fn params(
        &self,
        addr: &ObjectAddr,
        keys: &[String],
    ) -> Result<BTreeMap<String, String>, ClapiError> {
        let values = join_values(&[&addr.name, &join_list(keys)?])?;
        let response = self.object_call("getparam", addr.kind, &values)?;
        parse_params(keys, &response)
    }

    fn create(&self, addr: &ObjectAddr, object: &NewObject) -> Result<(), ClapiError> {
        let alias = object.alias.as_deref().unwrap_or(&addr.name);
        let address = object.address.as_deref().unwrap_or_default();
        let templates = join_list(&object.templates)?;
        let values = match addr.kind {
            ObjectKind::Host => {
                let instance = object
                    .instance
                    .as_deref()
                    .unwrap_or(self.default_instance());
                join_values(&[&addr.name, alias, address, &templates, instance, ""])?
            }
            ObjectKind::HostTemplate => {
                join_values(&[&addr.name, alias, address, &templates, "", ""])?
            }
            ObjectKind::ServiceTemplate => join_values(&[
                &addr.name,
                alias,
                object.parent_template.as_deref().unwrap_or_default(),
            ])?,
            ObjectKind::HostGroup => join_values(&[&addr.name, alias])?,
        };
        self.object_call("add", addr.kind, &values).map(|_| ())
    }

    fn list_call(
        &self,
        action: &str,
        addr: &ObjectAddr,
        items: &[String],
    ) -> Result<(), ClapiError> {
        let values = join_values(&[&addr.name, &join_list(items)?])?;
        self.object_call(action, addr.kind, &values).map(|_| ())
    }

    fn template_action(kind: ObjectKind, verb: &str) -> String {
        match kind {
            ObjectKind::ServiceTemplate => format!("{verb}hosttemplate"),
            _ => format!("{verb}template"),
        }
    }
}

impl RemoteStateClient for ClapiClient {
    fn get(&self, addr: &ObjectAddr) -> Result<Option<ObjectRecord>, ClientError> {
        Ok(self.lookup(addr)?)
    }

    fn add(&self, addr: &ObjectAddr, object: &NewObject) -> Result<(), ClientError> {
        Ok(self.create(addr, object)?)
    }

    fn delete(&self, addr: &ObjectAddr) -> Result<(), ClientError> {
        self.object_call("del", addr.kind, &addr.name)?;
        Ok(())
    }

    fn enable(&self, addr: &ObjectAddr) -> Result<(), ClientError> {
        self.object_call("enable", addr.kind, &addr.name)?;
        Ok(())
    }

    fn disable(&self, addr: &ObjectAddr) -> Result<(), ClientError> {
        self.object_call("disable", addr.kind, &addr.name)?;
        Ok(())
    }

    fn set_attribute(
        &self,
        addr: &ObjectAddr,
        attribute: Attribute,
        value: &str,
    ) -> Result<(), ClientError> {
        self.set_param(addr, attribute.param_name(), value)
    }

    fn get_groups(&self, addr: &ObjectAddr) -> Result<Vec<String>, ClientError> {
        let response = self.object_call("gethostgroup", addr.kind, &addr.name)?;
        Ok(parse_names(&response)?)
    }

    fn add_to_group(&self, addr: &ObjectAddr, group: &str) -> Result<(), ClientError> {
        let values = join_values(&[&addr.name, group])?;
        self.object_call("addhostgroup", addr.kind, &values)?;
        Ok(())
    }

    fn set_groups(&self, addr: &ObjectAddr, groups: &[String]) -> Result<(), ClientError> {
        Ok(self.list_call("sethostgroup", addr, groups)?)
    }

    fn get_template_order(&self, addr: &ObjectAddr) -> Result<Vec<String>, ClientError> {
        let action = Self::template_action(addr.kind, "get");
        let response = self.object_call(&action, addr.kind, &addr.name)?;
        Ok(parse_names(&response)?)
    }

    fn add_templates(&self, addr: &ObjectAddr, templates: &[String]) -> Result<(), ClientError> {
        let action = Self::template_action(addr.kind, "add");
        Ok(self.list_call(&action, addr, templates)?)
    }

    fn set_template_order(
        &self,
        addr: &ObjectAddr,
        order: &[String],
    ) -> Result<(), ClientError> {
        let action = Self::template_action(addr.kind, "set");
        Ok(self.list_call(&action, addr, order)?)
    }

    fn apply_template_inheritance(&self, addr: &ObjectAddr) -> Result<(), ClientError> {
        self.object_call("applytpl", addr.kind, &addr.name)?;
        Ok(())
    }

    fn get_macros(
        &self,
        addr: &ObjectAddr,
    ) -> Result<BTreeMap<MacroName, ObservedMacro>, ClientError> {
        let response = self.object_call("getmacro", addr.kind, &addr.name)?;
        Ok(parse_macros(&response)?)
    }

    fn set_macro(
        &self,
        addr: &ObjectAddr,
        name: &MacroName,
        spec: &MacroSpec,
    ) -> Result<(), ClientError> {
        let values = join_values(&[
            &addr.name,
            name.as_str(),
            &spec.value,
            if spec.is_password { "1" } else { "0" },
            spec.description.as_deref().unwrap_or_default(),
        ])?;
        self.object_call("setmacro", addr.kind, &values)?;
        Ok(())
    }

    fn get_params(
        &self,
        addr: &ObjectAddr,
        keys: &[String],
    ) -> Result<BTreeMap<String, String>, ClientError> {
        if keys.is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(self.params(addr, keys)?)
    }

    fn set_param(&self, addr: &ObjectAddr, key: &str, value: &str) -> Result<(), ClientError> {
        let values = join_values(&[&addr.name, key, value])?;
        self.object_call("setparam", addr.kind, &values)?;
        Ok(())
    }

    fn reload(&self, instance: &str) -> Result<(), ClientError> {
        self.call("APPLYCFG", None, instance)?;
        Ok(())
    }
}
