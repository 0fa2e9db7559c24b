//! ============================================================================
//! GitHub OAuth2 - Web Application Flow
//! ============================================================================
//! Redirect to github.com/login/oauth/authorize, then trade the returned code
//! for a token. GitHub answers in JSON, form encoding, or XML depending on
//! the `Accept` header.
//! ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::flow::{AuthorizationOptions, CodeFlow};
use crate::endpoints::{Endpoints, Provider};
use crate::error::StrategyError;
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::types::{ClientCredentials, StrategyResponse, StrategyResult};

/// Parameters GitHub sends back to the redirect URI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubTokenParams {
    pub code: String,
    #[serde(default)]
    pub state: Option<String>,
    /// Ask for an XML token response instead of JSON
    #[serde(default, rename = "returnAsXML", alias = "return_as_xml")]
    pub return_as_xml: bool,
}

/// GitHub OAuth2 strategy
pub struct GithubStrategy {
    flow: CodeFlow,
}

impl GithubStrategy {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self::with_transport(credentials, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(credentials: ClientCredentials, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            flow: CodeFlow::new(Provider::GitHub, credentials, transport),
        }
    }

    /// Override the provider endpoints
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.flow.endpoints = endpoints;
        self
    }

    pub fn credentials_valid(&self) -> bool {
        self.flow.credentials_valid()
    }

    /// Build the authorize URL. With `handle_state` a fresh state is
    /// generated and stored, replacing any earlier one.
    ///
    /// On success `data` is `{ "authUrl": "..." }`.
    pub fn initiate_authorization(&mut self, options: &AuthorizationOptions) -> StrategyResult {
        let url = self
            .flow
            .authorization_url(options, &[])
            .map_err(StrategyError::into_response)?;
        Ok(StrategyResponse::ok(json!({ "authUrl": url })))
    }

    /// Exchange the authorization code for an access token.
    ///
    /// JSON bodies come back as objects, XML (when `return_as_xml`) as a
    /// string.
    pub async fn get_access_token(&self, params: &GithubTokenParams) -> StrategyResult {
        self.exchange(params)
            .await
            .map(StrategyResponse::ok)
            .map_err(StrategyError::into_response)
    }

    async fn exchange(&self, params: &GithubTokenParams) -> Result<serde_json::Value, StrategyError> {
        self.flow.ensure_credentials()?;
        self.flow.verify_state(params.state.as_deref())?;

        let credentials = self.flow.credentials();
        let mut form = vec![
            ("client_id".to_string(), credentials.client_id.clone()),
            ("client_secret".to_string(), credentials.client_secret.clone()),
            ("code".to_string(), params.code.clone()),
        ];
        if let Some(state) = params.state.as_deref().filter(|s| !s.is_empty()) {
            form.push(("state".to_string(), state.to_string()));
        }

        let accept = if params.return_as_xml {
            "application/xml"
        } else {
            "application/json"
        };
        let request = HttpRequest::post(&self.flow.endpoints.access_token)
            .with_form(form)
            .with_header("Accept", accept);

        self.flow.exchange(request).await
    }
}
