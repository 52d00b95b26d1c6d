use centreon_reconciler::error::{ClientError, format_err_chain};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClapiError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] ureq::Error),

    #[error("authentication rejected (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("{action} on {object} rejected (HTTP {status}): {message}")]
    Api {
        action: String,
        object: String,
        status: u16,
        message: String,
    },

    #[error("unexpected response: {0}")]
    Decode(String),

    /// CLAPI has no escaping: a value containing a separator would be
    /// split into extra fields on the server.
    #[error("value {value:?} cannot contain {separator:?}")]
    InvalidValue { value: String, separator: char },
}

impl From<ClapiError> for ClientError {
    fn from(err: ClapiError) -> Self {
        match err {
            ClapiError::Transport(_) | ClapiError::Authentication { .. } => {
                ClientError::Connection(format_err_chain(&err))
            }
            ClapiError::Api { .. } | ClapiError::InvalidValue { .. } => {
                ClientError::Api(err.to_string())
            }
            ClapiError::Decode(msg) => ClientError::Decode(msg),
        }
    }
}
