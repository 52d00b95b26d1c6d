use std::collections::BTreeMap;

use crate::addr::ObjectAddr;
use crate::error::ClientError;
use crate::manifest::{MacroName, MacroSpec};
use crate::plan::{Attribute, NewObject};
use crate::state::{ObjectRecord, ObservedMacro};

/// Atomic reads and writes against the monitoring platform.
///
/// One call is one blocking round trip. Implementations own timeouts and
/// transport details; the engine never retries.
pub trait RemoteStateClient: Send + Sync {
    /// Look up an object. `Ok(None)` means it does not exist.
    fn get(&self, addr: &ObjectAddr) -> Result<Option<ObjectRecord>, ClientError>;

    fn add(&self, addr: &ObjectAddr, object: &NewObject) -> Result<(), ClientError>;

    fn delete(&self, addr: &ObjectAddr) -> Result<(), ClientError>;

    fn enable(&self, addr: &ObjectAddr) -> Result<(), ClientError>;

    fn disable(&self, addr: &ObjectAddr) -> Result<(), ClientError>;

    fn set_attribute(
        &self,
        addr: &ObjectAddr,
        attribute: Attribute,
        value: &str,
    ) -> Result<(), ClientError>;

    fn get_groups(&self, addr: &ObjectAddr) -> Result<Vec<String>, ClientError>;

    fn add_to_group(&self, addr: &ObjectAddr, group: &str) -> Result<(), ClientError>;

    fn set_groups(&self, addr: &ObjectAddr, groups: &[String]) -> Result<(), ClientError>;

    /// Applied templates, in the order the platform reports them.
    fn get_template_order(&self, addr: &ObjectAddr) -> Result<Vec<String>, ClientError>;

    fn add_templates(&self, addr: &ObjectAddr, templates: &[String]) -> Result<(), ClientError>;

    /// Replace the whole template list. There is no positional insert.
    fn set_template_order(&self, addr: &ObjectAddr, order: &[String])
    -> Result<(), ClientError>;

    /// Re-derive the object's services from its templates.
    fn apply_template_inheritance(&self, addr: &ObjectAddr) -> Result<(), ClientError>;

    fn get_macros(
        &self,
        addr: &ObjectAddr,
    ) -> Result<BTreeMap<MacroName, ObservedMacro>, ClientError>;

    fn set_macro(
        &self,
        addr: &ObjectAddr,
        name: &MacroName,
        spec: &MacroSpec,
    ) -> Result<(), ClientError>;

    /// Read the given params. Keys the platform has no value for are omitted.
    fn get_params(
        &self,
        addr: &ObjectAddr,
        keys: &[String],
    ) -> Result<BTreeMap<String, String>, ClientError>;

    fn set_param(&self, addr: &ObjectAddr, key: &str, value: &str) -> Result<(), ClientError>;

    /// Export and reload the configuration of a poller.
    fn reload(&self, instance: &str) -> Result<(), ClientError>;
}
