//! centreon-clapi
//!
//! Blocking client for the Centreon CLAPI endpoint (`/api/index.php`).
//! [`ClapiClient`] implements the reconciler's `RemoteStateClient`, so the
//! engine never sees HTTP, auth tokens or the `;`-separated value format.

pub mod client;
pub mod error;
pub mod objects;

pub use client::ClapiClient;
pub use error::ClapiError;
