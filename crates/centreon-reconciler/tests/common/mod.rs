//! In-memory stand-in for the Centreon API.
//!
//! Keeps objects in a map, records every call by name, and can be told to
//! reject the first call whose name starts with a given prefix.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use centreon_reconciler::ObjectAddr;
use centreon_reconciler::client::RemoteStateClient;
use centreon_reconciler::error::ClientError;
use centreon_reconciler::manifest::{
    MacroName, MacroSpec, ManagedObjectSpec, ObjectDeclaration, Status,
};
use centreon_reconciler::plan::{Attribute, NewObject};
use centreon_reconciler::state::{ObjectRecord, ObservedMacro};

pub fn spec(json: serde_json::Value) -> ManagedObjectSpec {
    let decl: ObjectDeclaration = serde_json::from_value(json).expect("valid declaration");
    ManagedObjectSpec::try_from(decl).expect("valid spec")
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeObject {
    pub record: ObjectRecord,
    pub groups: Vec<String>,
    pub templates: Vec<String>,
    pub macros: BTreeMap<MacroName, ObservedMacro>,
    pub params: BTreeMap<String, String>,
}

impl FakeObject {
    pub fn named(name: &str) -> Self {
        Self {
            record: ObjectRecord {
                name: name.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn enabled(mut self) -> Self {
        self.record.status = Some(Status::Enabled);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.record.status = Some(Status::Disabled);
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.record.alias = Some(alias.to_string());
        self
    }

    pub fn address(mut self, address: &str) -> Self {
        self.record.address = Some(address.to_string());
        self
    }

    pub fn groups(mut self, groups: &[&str]) -> Self {
        self.groups = names(groups);
        self
    }

    pub fn templates(mut self, templates: &[&str]) -> Self {
        self.templates = names(templates);
        self
    }

    pub fn macro_value(mut self, name: &str, value: &str) -> Self {
        self.macros.insert(
            MacroName::new(name).expect("macro name"),
            ObservedMacro {
                value: value.to_string(),
                is_password: false,
                description: None,
            },
        );
        self
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<ObjectAddr, FakeObject>,
    calls: Vec<String>,
    fail_on: Option<String>,
}

#[derive(Default)]
pub struct FakeCentreon {
    inner: Mutex<Inner>,
}

impl FakeCentreon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, addr: ObjectAddr, object: FakeObject) -> Self {
        self.lock().objects.insert(addr, object);
        self
    }

    /// Reject the next call whose name starts with `prefix`.
    pub fn fail_on(&self, prefix: &str) {
        self.lock().fail_on = Some(prefix.to_string());
    }

    pub fn object(&self, addr: &ObjectAddr) -> Option<FakeObject> {
        self.lock().objects.get(addr).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Calls that would change remote state.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("get"))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("fake state poisoned")
    }

    fn call(&self, name: String) -> Result<MutexGuard<'_, Inner>, ClientError> {
        let mut inner = self.lock();
        let rejected = inner
            .fail_on
            .as_ref()
            .is_some_and(|prefix| name.starts_with(prefix.as_str()));
        inner.calls.push(name.clone());
        if rejected {
            inner.fail_on = None;
            return Err(ClientError::Api(format!("{name} rejected")));
        }
        Ok(inner)
    }

    fn mutate(
        &self,
        name: String,
        addr: &ObjectAddr,
        f: impl FnOnce(&mut FakeObject),
    ) -> Result<(), ClientError> {
        let mut inner = self.call(name)?;
        let object = inner
            .objects
            .get_mut(addr)
            .ok_or_else(|| ClientError::Api(format!("object {addr} not found")))?;
        f(object);
        Ok(())
    }

    fn read<T>(
        &self,
        name: String,
        addr: &ObjectAddr,
        f: impl FnOnce(&FakeObject) -> T,
    ) -> Result<T, ClientError> {
        let inner = self.call(name)?;
        let object = inner
            .objects
            .get(addr)
            .ok_or_else(|| ClientError::Api(format!("object {addr} not found")))?;
        Ok(f(object))
    }
}

impl RemoteStateClient for FakeCentreon {
    fn get(&self, addr: &ObjectAddr) -> Result<Option<ObjectRecord>, ClientError> {
        let inner = self.call("get".into())?;
        Ok(inner.objects.get(addr).map(|o| o.record.clone()))
    }

    fn add(&self, addr: &ObjectAddr, object: &NewObject) -> Result<(), ClientError> {
        let mut inner = self.call("add".into())?;
        if inner.objects.contains_key(addr) {
            return Err(ClientError::Api(format!("object {addr} already exists")));
        }
        let record = ObjectRecord {
            name: addr.name.clone(),
            alias: object.alias.clone(),
            address: object.address.clone(),
            status: addr.kind.supports_status().then_some(Status::Enabled),
            parent_template: object.parent_template.clone(),
        };
        inner.objects.insert(
            addr.clone(),
            FakeObject {
                record,
                templates: object.templates.clone(),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn delete(&self, addr: &ObjectAddr) -> Result<(), ClientError> {
        let mut inner = self.call("delete".into())?;
        inner
            .objects
            .remove(addr)
            .map(|_| ())
            .ok_or_else(|| ClientError::Api(format!("object {addr} not found")))
    }

    fn enable(&self, addr: &ObjectAddr) -> Result<(), ClientError> {
        self.mutate("enable".into(), addr, |o| {
            o.record.status = Some(Status::Enabled)
        })
    }

    fn disable(&self, addr: &ObjectAddr) -> Result<(), ClientError> {
        self.mutate("disable".into(), addr, |o| {
            o.record.status = Some(Status::Disabled)
        })
    }

    fn set_attribute(
        &self,
        addr: &ObjectAddr,
        attribute: Attribute,
        value: &str,
    ) -> Result<(), ClientError> {
        let name = format!("set_attribute:{}", attribute.param_name());
        self.mutate(name, addr, |o| {
            let slot = match attribute {
                Attribute::Alias => &mut o.record.alias,
                Attribute::Address => &mut o.record.address,
                Attribute::ParentTemplate => &mut o.record.parent_template,
            };
            *slot = Some(value.to_string());
        })
    }

    fn get_groups(&self, addr: &ObjectAddr) -> Result<Vec<String>, ClientError> {
        self.read("get_groups".into(), addr, |o| o.groups.clone())
    }

    fn add_to_group(&self, addr: &ObjectAddr, group: &str) -> Result<(), ClientError> {
        self.mutate(format!("add_to_group:{group}"), addr, |o| {
            if !o.groups.iter().any(|g| g == group) {
                o.groups.push(group.to_string());
            }
        })
    }

    fn set_groups(&self, addr: &ObjectAddr, groups: &[String]) -> Result<(), ClientError> {
        self.mutate("set_groups".into(), addr, |o| o.groups = groups.to_vec())
    }

    fn get_template_order(&self, addr: &ObjectAddr) -> Result<Vec<String>, ClientError> {
        self.read("get_template_order".into(), addr, |o| o.templates.clone())
    }

    fn add_templates(&self, addr: &ObjectAddr, templates: &[String]) -> Result<(), ClientError> {
        self.mutate("add_templates".into(), addr, |o| {
            for t in templates {
                if !o.templates.contains(t) {
                    o.templates.push(t.clone());
                }
            }
        })
    }

    fn set_template_order(
        &self,
        addr: &ObjectAddr,
        order: &[String],
    ) -> Result<(), ClientError> {
        self.mutate("set_template_order".into(), addr, |o| {
            o.templates = order.to_vec()
        })
    }

    fn apply_template_inheritance(&self, addr: &ObjectAddr) -> Result<(), ClientError> {
        self.mutate("apply_template_inheritance".into(), addr, |_| {})
    }

    fn get_macros(
        &self,
        addr: &ObjectAddr,
    ) -> Result<BTreeMap<MacroName, ObservedMacro>, ClientError> {
        self.read("get_macros".into(), addr, |o| o.macros.clone())
    }

    fn set_macro(
        &self,
        addr: &ObjectAddr,
        name: &MacroName,
        spec: &MacroSpec,
    ) -> Result<(), ClientError> {
        self.mutate(format!("set_macro:{name}"), addr, |o| {
            o.macros.insert(
                name.clone(),
                ObservedMacro {
                    value: spec.value.clone(),
                    is_password: spec.is_password,
                    description: spec.description.clone(),
                },
            );
        })
    }

    fn get_params(
        &self,
        addr: &ObjectAddr,
        keys: &[String],
    ) -> Result<BTreeMap<String, String>, ClientError> {
        self.read("get_params".into(), addr, |o| {
            o.params
                .iter()
                .filter(|(k, _)| keys.contains(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
    }

    fn set_param(&self, addr: &ObjectAddr, key: &str, value: &str) -> Result<(), ClientError> {
        self.mutate(format!("set_param:{key}"), addr, |o| {
            o.params.insert(key.to_string(), value.to_string());
        })
    }

    fn reload(&self, instance: &str) -> Result<(), ClientError> {
        self.call(format!("reload:{instance}")).map(|_| ())
    }
}
