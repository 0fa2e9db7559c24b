//! ============================================================================
//! Core Types for OAuth Strategies
//! ============================================================================
//! Credentials, uniform `{status, data}` responses, and the transient values
//! exchanged during a handshake. Responses serialize to JSON so callers can
//! hand them straight to a web layer.
//! ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ErrorResponse;

/// Client credentials issued by a provider.
///
/// OAuth1 providers call these consumer key / consumer secret / callback URL;
/// OAuth2 providers call them client id / client secret / redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
    #[serde(alias = "consumer_key")]
    pub client_id: String,
    #[serde(alias = "consumer_secret")]
    pub client_secret: String,
    #[serde(alias = "callback_url")]
    pub redirect_uri: String,
}

impl ClientCredentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// True when every field is non-empty
    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.redirect_uri.is_empty()
    }
}

/// Successful operation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResponse {
    pub status: u16,
    pub data: Value,
}

impl StrategyResponse {
    /// A 200 response carrying `data`
    pub fn ok(data: Value) -> Self {
        Self { status: 200, data }
    }
}

/// Outcome of every public strategy operation: exactly one side is produced.
pub type StrategyResult = Result<StrategyResponse, ErrorResponse>;

/// Token pair returned by an OAuth1 request-token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestToken {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    pub callback_confirmed: bool,
}

/// Where to send the end user next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRedirect {
    #[serde(rename = "redirectUrl")]
    pub url: String,
    #[serde(rename = "queryParams")]
    pub query_params: Map<String, Value>,
}

/// Values the provider appends to the OAuth1 callback URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenParams {
    pub oauth_token: String,
    pub oauth_verifier: String,
}

/// Turn ordered key/value pairs into a flat JSON object. Later keys win.
pub fn pairs_to_object<I, K, V>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), Value::String(v.into())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_credentials() {
        assert!(ClientCredentials::new("k", "s", "https://a.test/cb").is_complete());
        assert!(!ClientCredentials::new("", "s", "https://a.test/cb").is_complete());
        assert!(!ClientCredentials::new("k", "", "https://a.test/cb").is_complete());
        assert!(!ClientCredentials::new("k", "s", "").is_complete());
        assert!(!ClientCredentials::default().is_complete());
    }

    #[test]
    fn test_oauth1_field_aliases() {
        let creds: ClientCredentials = serde_json::from_value(serde_json::json!({
            "consumer_key": "k",
            "consumer_secret": "s",
            "callback_url": "https://a.test/cb"
        }))
        .unwrap();

        assert_eq!(creds, ClientCredentials::new("k", "s", "https://a.test/cb"));
    }

    #[test]
    fn test_redirect_serializes_camel_case() {
        let redirect = AuthorizationRedirect {
            url: "https://x.test/auth?a=1".to_string(),
            query_params: pairs_to_object([("a", "1")]),
        };
        let json = serde_json::to_value(&redirect).unwrap();
        assert_eq!(json["redirectUrl"], "https://x.test/auth?a=1");
        assert_eq!(json["queryParams"]["a"], "1");
    }
}
