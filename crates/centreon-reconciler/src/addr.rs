use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kind::ObjectKind;

/// Composite key for addressing a managed object.
///
/// Names are only unique within a kind: a host and a host template may
/// share a name, so both parts are needed to identify an object.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ObjectAddr {
    pub kind: ObjectKind,
    pub name: String,
}

impl ObjectAddr {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.kind.as_str(), self.name)
    }
}
