use std::fmt;

use serde::{Deserialize, Serialize};

/// The object kinds the reconciler manages.
///
/// Not every kind exposes every attribute on the platform side. The
/// capability methods below are the single place that knows which
/// aspects of a kind can be read and written.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Host,
    HostTemplate,
    ServiceTemplate,
    HostGroup,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::HostTemplate => "host_template",
            Self::ServiceTemplate => "service_template",
            Self::HostGroup => "host_group",
        }
    }

    /// Human-readable label used in change messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::HostTemplate => "host template",
            Self::ServiceTemplate => "service template",
            Self::HostGroup => "host group",
        }
    }

    pub fn supports_status(self) -> bool {
        matches!(self, Self::Host | Self::HostTemplate)
    }

    pub fn supports_address(self) -> bool {
        matches!(self, Self::Host | Self::HostTemplate)
    }

    /// Service templates inherit from a single parent service template.
    pub fn supports_parent_template(self) -> bool {
        matches!(self, Self::ServiceTemplate)
    }

    /// Hosts and host templates carry an ordered list of parent host
    /// templates; service templates carry their linked host templates.
    pub fn supports_templates(self) -> bool {
        !matches!(self, Self::HostGroup)
    }

    /// Whether the template list is an inheritance chain, where order is
    /// precedence. Service template links are a plain set.
    pub fn templates_are_ordered(self) -> bool {
        matches!(self, Self::Host | Self::HostTemplate)
    }

    pub fn supports_groups(self) -> bool {
        matches!(self, Self::Host)
    }

    pub fn supports_macros(self) -> bool {
        !matches!(self, Self::HostGroup)
    }

    pub fn supports_params(self) -> bool {
        !matches!(self, Self::HostGroup)
    }

    /// Only hosts derive concrete services from their templates.
    pub fn applies_template_inheritance(self) -> bool {
        matches!(self, Self::Host)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
