use thiserror::Error;

use crate::addr::ObjectAddr;
use crate::plan::Step;

/// Failure reported by a [`RemoteStateClient`](crate::client::RemoteStateClient).
///
/// The engine does not distinguish between the variants when deciding what
/// to do next: any failed call halts the current object.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    /// The platform cannot be reached at all. Raised before any object is
    /// processed.
    #[error("unable to connect to Centreon API: {0}")]
    Connection(String),

    /// The caller supplied an invalid declaration.
    #[error("invalid declaration: {0}")]
    Validation(String),

    /// A call for one object was rejected. Earlier steps for the same
    /// object stay applied.
    #[error("{addr}: {step} failed: {message}")]
    RemoteOperation {
        addr: ObjectAddr,
        step: Step,
        message: String,
    },

    #[error("failed while reloading poller {instance}: {message}")]
    Reload { instance: String, message: String },
}

impl ReconcileError {
    pub fn remote(addr: &ObjectAddr, step: Step, err: &dyn std::error::Error) -> Self {
        Self::RemoteOperation {
            addr: addr.clone(),
            step,
            message: format_err_chain(err),
        }
    }

    /// Prepend the object identity to a validation message.
    pub fn with_object(self, addr: &ObjectAddr) -> Self {
        match self {
            Self::Validation(msg) => Self::Validation(format!("{addr}: {msg}")),
            other => other,
        }
    }
}

/// Walk the full error chain and join all causes into one string.
///
/// Transport errors often have terse `Display` impls but useful detail
/// in the source chain.
pub fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
