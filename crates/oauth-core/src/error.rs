//! ============================================================================
//! Strategy Errors - One taxonomy, one normalized shape
//! ============================================================================
//! Every failure a strategy can hit is a `StrategyError`. At the public
//! boundary it is normalized into an `ErrorResponse { status, data }`:
//! - Local validation failures (credentials, CSRF state) -> 400
//! - Provider rejections -> provider's status, body passed through
//! - No response from the provider -> 400 "Bad Request"
//! - Anything else -> 500
//! ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

pub const MISSING_CREDENTIALS_ERROR: &str = "Missing client credentials";
pub const MISSING_CREDENTIALS_DESCRIPTION: &str =
    "Client id, client secret and redirect uri are all required and must not be empty";
pub const STATE_MISMATCH_ERROR: &str = "State mismatch";
pub const STATE_MISMATCH_DESCRIPTION: &str =
    "The state returned by the provider does not match the state issued for this flow";
pub const CALLBACK_UNCONFIRMED_ERROR: &str = "Callback is not confirmed by Twitter";
pub const CALLBACK_UNCONFIRMED_DESCRIPTION: &str =
    "The provider did not accept the configured callback URL";
pub const TRANSPORT_ERROR: &str = "Bad Request";
pub const UNEXPECTED_ERROR: &str = "Something went wrong";
pub const RETRY_LATER_DESCRIPTION: &str = "Please try again later!";

/// Error types for strategy operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrategyError {
    #[error("Missing client credentials")]
    MissingClientCredentials,

    #[error("State mismatch")]
    StateMismatch,

    #[error("Callback is not confirmed by the provider")]
    CallbackUnconfirmed,

    #[error("Provider responded with status {status}")]
    Provider { status: u16, body: Value },

    #[error("No response from provider: {0}")]
    Transport(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Normalized failure delivered to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("status {status}: {data}")]
pub struct ErrorResponse {
    pub status: u16,
    pub data: Value,
}

impl StrategyError {
    /// HTTP-like status code for this error
    pub fn status(&self) -> u16 {
        match self {
            StrategyError::MissingClientCredentials
            | StrategyError::StateMismatch
            | StrategyError::CallbackUnconfirmed
            | StrategyError::Transport(_) => 400,
            StrategyError::Provider { status, .. } => *status,
            StrategyError::Unexpected(_) => 500,
        }
    }

    /// Normalize into the `{status, data}` shape
    pub fn into_response(self) -> ErrorResponse {
        let status = self.status();
        let data = match self {
            StrategyError::MissingClientCredentials => {
                describe(MISSING_CREDENTIALS_ERROR, MISSING_CREDENTIALS_DESCRIPTION)
            }
            StrategyError::StateMismatch => describe(STATE_MISMATCH_ERROR, STATE_MISMATCH_DESCRIPTION),
            StrategyError::CallbackUnconfirmed => {
                describe(CALLBACK_UNCONFIRMED_ERROR, CALLBACK_UNCONFIRMED_DESCRIPTION)
            }
            StrategyError::Provider { body, .. } => provider_error_data(body),
            StrategyError::Transport(reason) => {
                warn!("Provider unreachable: {}", reason);
                describe(TRANSPORT_ERROR, RETRY_LATER_DESCRIPTION)
            }
            StrategyError::Unexpected(reason) => {
                warn!("Unexpected strategy failure: {}", reason);
                describe(UNEXPECTED_ERROR, RETRY_LATER_DESCRIPTION)
            }
        };
        ErrorResponse { status, data }
    }
}

impl From<StrategyError> for ErrorResponse {
    fn from(err: StrategyError) -> Self {
        err.into_response()
    }
}

fn describe(error: &str, description: &str) -> Value {
    json!({
        "error": error,
        "error_description": description,
    })
}

/// Shape a provider's error body.
///
/// Twitter answers with `{"errors":[{"code":..,"message":".."}]}`; the first
/// message is lifted into `error` and the original body kept as
/// `error_description`. Objects pass through untouched. Plain text becomes
/// `{"error": text}`.
fn provider_error_data(body: Value) -> Value {
    if let Some(message) = body.as_object().and_then(first_error_message) {
        return json!({
            "error": message,
            "error_description": body,
        });
    }

    match body {
        Value::Object(_) => body,
        Value::String(text) if text.is_empty() => json!({ "error": TRANSPORT_ERROR }),
        Value::String(text) => json!({ "error": text }),
        Value::Null => json!({ "error": TRANSPORT_ERROR }),
        other => json!({ "error": other }),
    }
}

fn first_error_message(obj: &Map<String, Value>) -> Option<String> {
    obj.get("errors")?
        .as_array()?
        .first()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
