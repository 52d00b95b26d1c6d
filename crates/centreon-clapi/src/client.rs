use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ureq::Agent;

use crate::error::ClapiError;

/// Header CLAPI reads the session token from.
const TOKEN_HEADER: &str = "centreon-auth-token";

/// Poller used for new hosts that do not name one.
pub const DEFAULT_INSTANCE: &str = "Central";

/// Authenticated session against one Centreon server.
pub struct ClapiClient {
    agent: Agent,
    endpoint: String,
    token: String,
    default_instance: String,
}

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(rename = "authToken")]
    auth_token: String,
}

#[derive(Serialize)]
struct ActionRequest<'a> {
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    object: Option<&'a str>,
    values: &'a str,
}

impl ClapiClient {
    /// Authenticate and open a session.
    ///
    /// `url` is the Centreon web root, e.g. `https://centreon.example/centreon`.
    /// `timeout` bounds every request made through this client.
    pub fn connect(
        url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, ClapiError> {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        let endpoint = format!("{}/api/index.php", url.trim_end_matches('/'));

        tracing::debug!(endpoint = %endpoint, username, "authenticating");
        let mut resp = agent
            .post(&endpoint)
            .query("action", "authenticate")
            .send_form([("username", username), ("password", password)])?;

        let status = resp.status().as_u16();
        let body = resp.body_mut().read_to_string()?;
        if status != 200 {
            return Err(ClapiError::Authentication {
                status,
                message: error_message(&body),
            });
        }
        let auth: AuthResponse = serde_json::from_str(&body)
            .map_err(|e| ClapiError::Decode(format!("authentication response: {e}")))?;

        tracing::info!(endpoint = %endpoint, "authenticated to Centreon API");
        Ok(Self {
            agent,
            endpoint,
            token: auth.auth_token,
            default_instance: DEFAULT_INSTANCE.to_string(),
        })
    }

    /// Poller attached to hosts created without an explicit instance.
    pub fn with_default_instance(mut self, instance: impl Into<String>) -> Self {
        self.default_instance = instance.into();
        self
    }

    pub fn default_instance(&self) -> &str {
        &self.default_instance
    }

    /// Run one CLAPI action and return the decoded JSON body.
    ///
    /// `object` is the CLAPI object code (`HOST`, `HTPL`, ...); global
    /// actions such as `APPLYCFG` take none.
    pub fn call(
        &self,
        action: &str,
        object: Option<&str>,
        values: &str,
    ) -> Result<Value, ClapiError> {
        // setmacro values may hold passwords.
        tracing::trace!(action, object, "clapi call");
        let request = ActionRequest {
            action,
            object,
            values,
        };
        let mut resp = self
            .agent
            .post(&self.endpoint)
            .query("action", "action")
            .query("object", "centreon_clapi")
            .header(TOKEN_HEADER, &self.token)
            .send_json(&request)?;

        let status = resp.status().as_u16();
        let body = resp.body_mut().read_to_string()?;
        if !(200..300).contains(&status) {
            return Err(ClapiError::Api {
                action: action.to_string(),
                object: object.unwrap_or("-").to_string(),
                status,
                message: error_message(&body),
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| ClapiError::Decode(format!("{action} response: {e}")))
    }
}

/// Best-effort message from an error body.
///
/// CLAPI answers errors with a bare JSON string; anything else is passed
/// through as text.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(msg)) => msg,
        Ok(Value::Object(map)) => match map.get("message").and_then(Value::as_str) {
            Some(msg) => msg.to_string(),
            None => Value::Object(map).to_string(),
        },
        _ => body.trim().to_string(),
    }
}
