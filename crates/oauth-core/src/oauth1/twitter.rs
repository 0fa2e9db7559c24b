//! ============================================================================
//! Twitter OAuth 1.0a - Three-legged Sign-in Flow
//! ============================================================================
//! 1. `initiate_authentication` - signed POST to request_token, returns the
//!    authenticate URL to redirect the user to
//! 2. User approves, Twitter redirects back with oauth_token + oauth_verifier
//! 3. `get_access_tokens` - exchanges them for the user's access token
//! ============================================================================

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::signer::{EntropySource, OAuth1Signer};
use crate::endpoints::{Endpoints, Provider};
use crate::error::StrategyError;
use crate::transport::{HttpMethod, HttpRequest, HttpTransport, ReqwestTransport};
use crate::types::{
    pairs_to_object, AccessTokenParams, AuthorizationRedirect, ClientCredentials, RequestToken,
    StrategyResponse, StrategyResult,
};

/// Where a strategy instance is in the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Created,
    RequestingToken,
    AwaitingAuthorization,
    Completed,
    Failed,
}

/// Twitter OAuth 1.0a strategy
pub struct TwitterStrategy {
    credentials: ClientCredentials,
    credentials_valid: bool,
    endpoints: Endpoints,
    signer: OAuth1Signer,
    transport: Arc<dyn HttpTransport>,
    state: HandshakeState,
}

impl TwitterStrategy {
    /// Create a strategy talking to Twitter over reqwest.
    /// `credentials` are consumer key, consumer secret and callback URL.
    pub fn new(credentials: ClientCredentials) -> Self {
        Self::with_transport(credentials, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(credentials: ClientCredentials, transport: Arc<dyn HttpTransport>) -> Self {
        let credentials_valid = credentials.is_complete();
        if !credentials_valid {
            warn!("Twitter strategy created with missing credentials - all operations disabled");
        }
        let signer = OAuth1Signer::new(credentials.client_id.clone(), credentials.client_secret.clone());

        Self {
            credentials,
            credentials_valid,
            endpoints: Endpoints::for_provider(Provider::Twitter),
            signer,
            transport,
            state: HandshakeState::Created,
        }
    }

    /// Override the provider endpoints
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Override nonce and timestamp generation
    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.signer = OAuth1Signer::with_entropy(
            self.credentials.client_id.clone(),
            self.credentials.client_secret.clone(),
            entropy,
        );
        self
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn credentials_valid(&self) -> bool {
        self.credentials_valid
    }

    /// Obtain a request token and build the redirect to Twitter's
    /// authenticate page.
    ///
    /// On success `data` is `{ "queryParams": {...}, "redirectUrl": "..." }`.
    pub async fn initiate_authentication(&mut self) -> StrategyResult {
        match self.request_authentication().await {
            Ok((token, redirect)) => {
                self.state = HandshakeState::AwaitingAuthorization;
                info!(
                    "Obtained Twitter request token (callback confirmed: {})",
                    token.callback_confirmed
                );
                let data = serde_json::to_value(&redirect)
                    .map_err(|e| StrategyError::Unexpected(e.to_string()).into_response())?;
                Ok(StrategyResponse::ok(data))
            }
            Err(e) => {
                self.state = HandshakeState::Failed;
                error!("Twitter authentication initiation failed: {}", e);
                Err(e.into_response())
            }
        }
    }

    /// Exchange the token and verifier from the callback for access tokens.
    ///
    /// On success `data` is the flat map Twitter returns (`oauth_token`,
    /// `oauth_token_secret`, `user_id`, `screen_name`).
    pub async fn get_access_tokens(&mut self, params: &AccessTokenParams) -> StrategyResult {
        match self.exchange_verifier(params).await {
            Ok(data) => {
                self.state = HandshakeState::Completed;
                info!("Obtained Twitter access tokens");
                Ok(StrategyResponse::ok(data))
            }
            Err(e) => {
                self.state = HandshakeState::Failed;
                error!("Twitter access token exchange failed: {}", e);
                Err(e.into_response())
            }
        }
    }

    fn ensure_credentials(&self) -> Result<(), StrategyError> {
        if self.credentials_valid {
            Ok(())
        } else {
            Err(StrategyError::MissingClientCredentials)
        }
    }

    async fn request_authentication(
        &mut self,
    ) -> Result<(RequestToken, AuthorizationRedirect), StrategyError> {
        self.ensure_credentials()?;
        self.state = HandshakeState::RequestingToken;

        let url = self
            .endpoints
            .request_token
            .clone()
            .ok_or_else(|| StrategyError::Unexpected("no request token endpoint configured".to_string()))?;

        let form = vec![("oauth_callback".to_string(), self.credentials.redirect_uri.clone())];
        let signed = self.signer.sign(HttpMethod::Post, &url, &form, None)?;
        debug!("Requesting Twitter request token from {}", url);

        let request = HttpRequest::post(&url)
            .with_form(form)
            .with_header("Authorization", signed.authorization);

        let response = self.transport.send(request).await?.error_for_status()?;
        let raw = response.body.trim().to_string();
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(&raw)
            .map_err(|e| StrategyError::Unexpected(format!("unreadable request token response: {}", e)))?;

        let token = parse_request_token(&pairs)?;
        let redirect = AuthorizationRedirect {
            url: format!("{}?{}", self.endpoints.authorize, raw),
            query_params: pairs_to_object(pairs),
        };

        Ok((token, redirect))
    }

    async fn exchange_verifier(&mut self, params: &AccessTokenParams) -> Result<Value, StrategyError> {
        self.ensure_credentials()?;

        let pairs = vec![
            ("oauth_token".to_string(), params.oauth_token.clone()),
            ("oauth_verifier".to_string(), params.oauth_verifier.clone()),
        ];
        debug!("Exchanging Twitter verifier at {}", self.endpoints.access_token);

        // The authorized request token carries this call; no signature
        let request = HttpRequest::post(&self.endpoints.access_token)
            .with_query(pairs.clone())
            .with_form(pairs);

        let response = self.transport.send(request).await?.error_for_status()?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(response.body.trim())
            .map_err(|e| StrategyError::Unexpected(format!("unreadable access token response: {}", e)))?;
        Ok(Value::Object(pairs_to_object(pairs)))
    }
}

/// Read the request token out of the provider's form-encoded reply.
/// An explicit `oauth_callback_confirmed=false` is a protocol violation.
fn parse_request_token(pairs: &[(String, String)]) -> Result<RequestToken, StrategyError> {
    let get = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    if get("oauth_callback_confirmed") == Some("false") {
        return Err(StrategyError::CallbackUnconfirmed);
    }

    let oauth_token = get("oauth_token")
        .ok_or_else(|| StrategyError::Unexpected("request token response has no oauth_token".to_string()))?;

    Ok(RequestToken {
        oauth_token: oauth_token.to_string(),
        oauth_token_secret: get("oauth_token_secret").unwrap_or_default().to_string(),
        callback_confirmed: get("oauth_callback_confirmed") == Some("true"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth1::signer::tests::FixedEntropy;
    use crate::transport::mock::MockTransport;
    use crate::transport::TransportFailure;

    const FORM: &str = "application/x-www-form-urlencoded";

    fn credentials() -> ClientCredentials {
        ClientCredentials::new("k", "s", "https://a.test/cb")
    }

    fn strategy(transport: &MockTransport) -> TwitterStrategy {
        TwitterStrategy::with_transport(credentials(), Arc::new(transport.clone())).with_entropy(Arc::new(
            FixedEntropy {
                nonce: "nonce".to_string(),
                timestamp: 1_700_000_000,
            },
        ))
    }

    fn access_params() -> AccessTokenParams {
        AccessTokenParams {
            oauth_token: "T".to_string(),
            oauth_verifier: "V".to_string(),
        }
    }

    #[tokio::test]
    async fn test_redirect_built_from_request_token() {
        let transport = MockTransport::new().respond(
            200,
            FORM,
            "oauth_token=T&oauth_token_secret=S&oauth_callback_confirmed=true",
        );
        let mut strategy = strategy(&transport);

        let result = strategy.initiate_authentication().await.unwrap();

        assert_eq!(result.status, 200);
        let url = result.data["redirectUrl"].as_str().unwrap();
        assert!(url.starts_with("https://api.twitter.com/oauth/authenticate?"));
        assert!(url.contains("oauth_token=T"));
        assert_eq!(result.data["queryParams"]["oauth_token_secret"], "S");
        assert_eq!(strategy.state(), HandshakeState::AwaitingAuthorization);
    }

    #[tokio::test]
    async fn test_request_token_call_is_signed() {
        let transport = MockTransport::new().respond(200, FORM, "oauth_token=T&oauth_callback_confirmed=true");
        let mut strategy = strategy(&transport);
        strategy.initiate_authentication().await.unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://api.twitter.com/oauth/request_token");
        assert_eq!(
            request.form,
            vec![("oauth_callback".to_string(), "https://a.test/cb".to_string())]
        );
        let auth = request.header("Authorization").unwrap();
        assert!(auth.starts_with("OAuth "));
        assert!(auth.contains("oauth_consumer_key=\"k\""));
        assert!(auth.contains("oauth_nonce=\"nonce\""));
        assert!(auth.contains("oauth_timestamp=\"1700000000\""));
        assert!(auth.contains("oauth_signature=\""));
    }

    #[tokio::test]
    async fn test_callback_unconfirmed() {
        let transport = MockTransport::new().respond(
            200,
            FORM,
            "oauth_token=T&oauth_token_secret=S&oauth_callback_confirmed=false",
        );
        let mut strategy = strategy(&transport);

        let err = strategy.initiate_authentication().await.unwrap_err();

        assert_eq!(err.status, 400);
        assert_eq!(err.data["error"], "Callback is not confirmed by Twitter");
        assert!(err.data.get("redirectUrl").is_none());
        assert_eq!(strategy.state(), HandshakeState::Failed);
    }

    #[tokio::test]
    async fn test_missing_credentials_short_circuit() {
        let bad_sets = [
            ClientCredentials::new("", "s", "https://a.test/cb"),
            ClientCredentials::new("k", "", "https://a.test/cb"),
            ClientCredentials::new("k", "s", ""),
        ];
        for creds in bad_sets {
            let transport = MockTransport::new();
            let mut strategy = TwitterStrategy::with_transport(creds, Arc::new(transport.clone()));
            assert!(!strategy.credentials_valid());

            let err = strategy.initiate_authentication().await.unwrap_err();
            assert_eq!(err.status, 400);
            assert_eq!(err.data["error"], "Missing client credentials");

            let err = strategy.get_access_tokens(&access_params()).await.unwrap_err();
            assert_eq!(err.data["error"], "Missing client credentials");

            assert_eq!(transport.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_access_token_exchange() {
        let transport = MockTransport::new().respond(
            200,
            "text/html; charset=utf-8",
            "oauth_token=AT&oauth_token_secret=AS&user_id=42&screen_name=someone",
        );
        let mut strategy = strategy(&transport);

        let result = strategy.get_access_tokens(&access_params()).await.unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.data["oauth_token"], "AT");
        assert_eq!(result.data["screen_name"], "someone");
        assert_eq!(strategy.state(), HandshakeState::Completed);

        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "https://api.twitter.com/oauth/access_token");
        assert!(request.header("Authorization").is_none());
        assert!(request.form.contains(&("oauth_verifier".to_string(), "V".to_string())));
        assert!(request.query.contains(&("oauth_token".to_string(), "T".to_string())));
    }

    #[tokio::test]
    async fn test_access_token_body_always_parsed_as_form() {
        let transport = MockTransport::new().respond(
            200,
            "text/plain",
            "oauth_token=AT&oauth_token_secret=AS&user_id=42&screen_name=some one",
        );
        let mut strategy = strategy(&transport);

        let result = strategy.get_access_tokens(&access_params()).await.unwrap();

        assert!(result.data.is_object());
        assert_eq!(result.data["oauth_token_secret"], "AS");
        assert_eq!(result.data["screen_name"], "some one");
    }

    #[tokio::test]
    async fn test_provider_error_list() {
        let transport = MockTransport::new().respond(
            401,
            "application/json",
            r#"{"errors":[{"code":32,"message":"Could not authenticate you."}]}"#,
        );
        let mut strategy = strategy(&transport);

        let err = strategy.initiate_authentication().await.unwrap_err();
        assert_eq!(err.status, 401);
        assert_eq!(err.data["error"], "Could not authenticate you.");
    }

    #[tokio::test]
    async fn test_no_response_is_bad_request() {
        let transport = MockTransport::new().fail(TransportFailure::NoResponse("connection reset".to_string()));
        let mut strategy = strategy(&transport);

        let err = strategy.get_access_tokens(&access_params()).await.unwrap_err();
        assert_eq!(err.status, 400);
        assert_eq!(err.data["error"], "Bad Request");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_local_failure_is_500() {
        let transport = MockTransport::new();
        let mut endpoints = Endpoints::for_provider(Provider::Twitter);
        endpoints.request_token = Some("::not a url::".to_string());
        let mut strategy = strategy(&transport).with_endpoints(endpoints);

        let err = strategy.initiate_authentication().await.unwrap_err();
        assert_eq!(err.status, 500);
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_parse_request_token() {
        let pairs = vec![
            ("oauth_token".to_string(), "T".to_string()),
            ("oauth_token_secret".to_string(), "S".to_string()),
            ("oauth_callback_confirmed".to_string(), "true".to_string()),
        ];
        let token = parse_request_token(&pairs).unwrap();
        assert_eq!(token.oauth_token, "T");
        assert_eq!(token.oauth_token_secret, "S");
        assert!(token.callback_confirmed);

        assert_eq!(
            parse_request_token(&[("oauth_token_secret".to_string(), "S".to_string())]).unwrap_err().status(),
            500
        );
    }
}
