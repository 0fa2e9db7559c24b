//! ============================================================================
//! LinkedIn OAuth2 - Authorization Code Flow
//! ============================================================================
//! Redirect with `response_type=code`, then POST the code form-encoded with
//! `grant_type=authorization_code` to the accessToken endpoint.
//! ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::flow::{AuthorizationOptions, CodeFlow};
use crate::endpoints::{Endpoints, Provider};
use crate::error::StrategyError;
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::types::{ClientCredentials, StrategyResponse, StrategyResult};

/// Parameters LinkedIn sends back to the redirect URI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedinTokenParams {
    pub code: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// LinkedIn OAuth2 strategy
pub struct LinkedinStrategy {
    flow: CodeFlow,
}

impl LinkedinStrategy {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self::with_transport(credentials, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(credentials: ClientCredentials, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            flow: CodeFlow::new(Provider::LinkedIn, credentials, transport),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.flow.endpoints = endpoints;
        self
    }

    pub fn credentials_valid(&self) -> bool {
        self.flow.credentials_valid()
    }

    /// On success `data` is `{ "authUrl": "..." }`
    pub fn initiate_authorization(&mut self, options: &AuthorizationOptions) -> StrategyResult {
        let url = self
            .flow
            .authorization_url(options, &[("response_type", "code")])
            .map_err(StrategyError::into_response)?;
        Ok(StrategyResponse::ok(json!({ "authUrl": url })))
    }

    /// Exchange the authorization code for an access token
    pub async fn get_access_token(&self, params: &LinkedinTokenParams) -> StrategyResult {
        self.exchange(params)
            .await
            .map(StrategyResponse::ok)
            .map_err(StrategyError::into_response)
    }

    async fn exchange(&self, params: &LinkedinTokenParams) -> Result<serde_json::Value, StrategyError> {
        self.flow.ensure_credentials()?;
        self.flow.verify_state(params.state.as_deref())?;

        let credentials = self.flow.credentials();
        let form = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("client_id".to_string(), credentials.client_id.clone()),
            ("client_secret".to_string(), credentials.client_secret.clone()),
            ("redirect_uri".to_string(), credentials.redirect_uri.clone()),
            ("code".to_string(), params.code.clone()),
        ];

        let request = HttpRequest::post(&self.flow.endpoints.access_token).with_form(form);
        self.flow.exchange(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    fn strategy(transport: &MockTransport) -> LinkedinStrategy {
        LinkedinStrategy::with_transport(
            ClientCredentials::new("li-id", "li-secret", "https://a.test/cb"),
            Arc::new(transport.clone()),
        )
    }

    #[test]
    fn test_authorization_url_has_response_type() {
        let transport = MockTransport::new();
        let mut strategy = strategy(&transport);

        let result = strategy
            .initiate_authorization(&AuthorizationOptions::default().with_scope("r_liteprofile r_emailaddress"))
            .unwrap();
        let url = result.data["authUrl"].as_str().unwrap();

        assert!(url.starts_with("https://www.linkedin.com/oauth/v2/authorization?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=li-id"));
        assert!(url.contains("scope=r_liteprofile+r_emailaddress"));
    }

    #[tokio::test]
    async fn test_state_mismatch_makes_no_call() {
        let transport = MockTransport::new();
        let mut strategy = strategy(&transport);
        strategy
            .initiate_authorization(&AuthorizationOptions::default().with_handle_state(true))
            .unwrap();

        let err = strategy
            .get_access_token(&LinkedinTokenParams {
                code: "code".to_string(),
                state: Some("not-the-state".to_string()),
            })
            .await
            .unwrap_err();

        assert_eq!(err.status, 400);
        assert_eq!(err.data["error"], "State mismatch");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_token_exchange_form() {
        let transport = MockTransport::new().respond(
            200,
            "application/json",
            r#"{"access_token":"AQX","expires_in":5184000}"#,
        );
        let strategy = strategy(&transport);

        let result = strategy
            .get_access_token(&LinkedinTokenParams {
                code: "code".to_string(),
                state: None,
            })
            .await
            .unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.data["access_token"], "AQX");
        assert_eq!(result.data["expires_in"], 5184000);

        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "https://www.linkedin.com/oauth/v2/accessToken");
        for (k, v) in [
            ("grant_type", "authorization_code"),
            ("client_id", "li-id"),
            ("client_secret", "li-secret"),
            ("redirect_uri", "https://a.test/cb"),
            ("code", "code"),
        ] {
            assert!(request.form.contains(&(k.to_string(), v.to_string())), "missing {}", k);
        }
    }

    #[tokio::test]
    async fn test_form_encoded_response() {
        let transport = MockTransport::new().respond(
            200,
            "application/x-www-form-urlencoded",
            "access_token=AQX&expires_in=60",
        );
        let strategy = strategy(&transport);

        let result = strategy
            .get_access_token(&LinkedinTokenParams {
                code: "code".to_string(),
                state: None,
            })
            .await
            .unwrap();
        assert_eq!(result.data["access_token"], "AQX");
        assert_eq!(result.data["expires_in"], "60");
    }

    #[tokio::test]
    async fn test_provider_rejection_passes_status() {
        let transport = MockTransport::new().respond(
            400,
            "application/json",
            r#"{"error":"invalid_request","error_description":"Unable to retrieve access token"}"#,
        );
        let strategy = strategy(&transport);

        let err = strategy
            .get_access_token(&LinkedinTokenParams {
                code: "code".to_string(),
                state: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status, 400);
        assert_eq!(err.data["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let bad_sets = [
            ClientCredentials::new("", "li-secret", "https://a.test/cb"),
            ClientCredentials::new("li-id", "", "https://a.test/cb"),
            ClientCredentials::new("li-id", "li-secret", ""),
        ];
        for creds in bad_sets {
            let transport = MockTransport::new();
            let mut strategy = LinkedinStrategy::with_transport(creds, Arc::new(transport.clone()));
            assert!(!strategy.credentials_valid());

            let err = strategy
                .initiate_authorization(&AuthorizationOptions::default())
                .unwrap_err();
            assert_eq!(err.status, 400);
            assert_eq!(err.data["error"], "Missing client credentials");

            let err = strategy
                .get_access_token(&LinkedinTokenParams {
                    code: "code".to_string(),
                    state: None,
                })
                .await
                .unwrap_err();
            assert_eq!(err.status, 400);
            assert_eq!(err.data["error"], "Missing client credentials");
            assert_eq!(transport.calls(), 0);
        }
    }
}
