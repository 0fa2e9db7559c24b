//! ============================================================================
//! Authorization-Code Flow - shared by the OAuth2 strategies
//! ============================================================================
//! Holds credentials, endpoints, transport and the CSRF slot, and implements
//! the two steps every provider shares: build the authorize URL, then POST
//! the code to the token endpoint. Provider modules only decide which
//! parameters go where.
//! ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::state::StateSlot;
use crate::endpoints::{Endpoints, Provider};
use crate::error::StrategyError;
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::ClientCredentials;

/// Caller options for the authorization redirect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationOptions {
    /// Space separated scopes
    #[serde(default)]
    pub scope: Option<String>,
    /// Caller-managed state, forwarded only when `handle_state` is false
    #[serde(default)]
    pub state: Option<String>,
    /// GitHub: suggested account
    #[serde(default)]
    pub login: Option<String>,
    /// GitHub: "true" / "false"
    #[serde(default)]
    pub allow_signup: Option<String>,
    /// Let the strategy generate and verify state
    #[serde(default, rename = "handleState", alias = "handle_state")]
    pub handle_state: bool,
    /// Any other provider parameter, forwarded verbatim
    #[serde(default)]
    pub extra: Vec<(String, String)>,
}

impl AuthorizationOptions {
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_handle_state(mut self, handle_state: bool) -> Self {
        self.handle_state = handle_state;
        self
    }
}

pub(crate) struct CodeFlow {
    provider: Provider,
    credentials: ClientCredentials,
    credentials_valid: bool,
    pub(crate) endpoints: Endpoints,
    transport: Arc<dyn HttpTransport>,
    csrf: StateSlot,
}

impl CodeFlow {
    pub(crate) fn new(
        provider: Provider,
        credentials: ClientCredentials,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let credentials_valid = credentials.is_complete();
        if !credentials_valid {
            warn!(
                "{} strategy created with missing credentials - all operations disabled",
                provider.display_name()
            );
        }

        Self {
            provider,
            credentials,
            credentials_valid,
            endpoints: Endpoints::for_provider(provider),
            transport,
            csrf: StateSlot::default(),
        }
    }

    pub(crate) fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    pub(crate) fn credentials_valid(&self) -> bool {
        self.credentials_valid
    }

    pub(crate) fn ensure_credentials(&self) -> Result<(), StrategyError> {
        if self.credentials_valid {
            Ok(())
        } else {
            Err(StrategyError::MissingClientCredentials)
        }
    }

    /// Build the authorize URL. `fixed` parameters (e.g. `response_type`)
    /// follow the credentials; empty option values are dropped.
    pub(crate) fn authorization_url(
        &mut self,
        options: &AuthorizationOptions,
        fixed: &[(&str, &str)],
    ) -> Result<String, StrategyError> {
        self.ensure_credentials()?;

        let mut params: Vec<(String, String)> = vec![
            ("client_id".to_string(), self.credentials.client_id.clone()),
            ("redirect_uri".to_string(), self.credentials.redirect_uri.clone()),
        ];
        params.extend(fixed.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let optional = [
            ("scope", &options.scope),
            ("login", &options.login),
            ("allow_signup", &options.allow_signup),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                params.push((key.to_string(), value.to_string()));
            }
        }
        for (key, value) in &options.extra {
            if key.is_empty() || value.is_empty() {
                continue;
            }
            if is_reserved(key, fixed) {
                debug!("Ignoring caller parameter {} owned by the strategy", key);
                continue;
            }
            params.push((key.clone(), value.clone()));
        }

        if options.handle_state {
            let state = self.csrf.issue();
            params.push(("state".to_string(), state.as_str().to_string()));
        } else {
            if self.csrf.clear().is_some() {
                warn!(
                    "{} flow started without managed state; the previously issued state is discarded",
                    self.provider.display_name()
                );
            }
            if let Some(state) = options.state.as_deref().filter(|s| !s.is_empty()) {
                params.push(("state".to_string(), state.to_string()));
            }
        }

        let query = serde_urlencoded::to_string(&params)
            .map_err(|e| StrategyError::Unexpected(format!("could not encode query: {}", e)))?;

        debug!(
            "Built {} authorization URL (managed state: {})",
            self.provider.display_name(),
            options.handle_state
        );
        Ok(format!("{}?{}", self.endpoints.authorize, query))
    }

    pub(crate) fn verify_state(&self, supplied: Option<&str>) -> Result<(), StrategyError> {
        self.csrf.verify(supplied)
    }

    /// Send the token request and decode the body.
    ///
    /// Some providers (GitHub) report a bad code with a 200 and an `error`
    /// field; that is surfaced as a 400 provider error.
    pub(crate) async fn exchange(&self, request: HttpRequest) -> Result<Value, StrategyError> {
        debug!("Exchanging authorization code at {}", request.url);
        let response = self.transport.send(request).await?.error_for_status()?;
        let body = response.decoded_body();

        if let Some(body) = reported_error(&body) {
            return Err(StrategyError::Provider { status: 400, body });
        }

        info!("Obtained {} access token", self.provider.display_name());
        Ok(body)
    }
}

/// Query keys the strategy writes itself; `extra` may not repeat them
const RESERVED_PARAMS: &[&str] = &[
    "client_id",
    "redirect_uri",
    "response_type",
    "state",
    "scope",
    "login",
    "allow_signup",
];

fn is_reserved(key: &str, fixed: &[(&str, &str)]) -> bool {
    RESERVED_PARAMS.contains(&key) || fixed.iter().any(|(k, _)| *k == key)
}

/// A 2xx token reply that still carries an `error` and no `access_token`.
/// XML replies are plain strings; the `<error>` element is lifted out.
fn reported_error(body: &Value) -> Option<Value> {
    match body {
        Value::Object(obj) if obj.contains_key("error") && !obj.contains_key("access_token") => {
            Some(body.clone())
        }
        Value::String(xml) if !xml.contains("<access_token>") => xml_element(xml, "error").map(|error| {
            json!({
                "error": error,
                "error_description": xml_element(xml, "error_description").unwrap_or_else(|| xml.clone()),
            })
        }),
        _ => None,
    }
}

fn xml_element(xml: &str, name: &str) -> Option<String> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let start = xml.find(&open)? + open.len();
    let len = xml[start..].find(&close)?;
    Some(xml[start..start + len].trim().to_string())
}
