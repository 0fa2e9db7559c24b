//! ============================================================================
//! OAuth 1.0a Request Signer (HMAC-SHA1)
//! ============================================================================
//! Builds the signature base string, signs it, and renders the
//! `Authorization: OAuth ...` header. Randomness and time come from an
//! injected `EntropySource` so signatures are reproducible under test.
//! ============================================================================

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use std::sync::Arc;
use url::Url;

use crate::error::StrategyError;
use crate::transport::HttpMethod;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";

/// Everything except ALPHA / DIGIT / "-" / "." / "_" / "~"
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// RFC 3986 percent-encoding
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Source of nonces and timestamps
pub trait EntropySource: Send + Sync {
    /// Unique per request
    fn nonce(&self) -> String;
    /// Seconds since the Unix epoch
    fn timestamp(&self) -> i64;
}

/// Thread RNG + wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEntropy;

impl EntropySource for SystemEntropy {
    fn nonce(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }

    fn timestamp(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Token credentials mixed into a signature (request or access token)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCredentials {
    pub token: String,
    pub secret: String,
}

/// A signed request, valid for one send only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Value for the `Authorization` header
    pub authorization: String,
}

/// Normalize the request URI: lowercase scheme and host, drop default
/// ports, query and fragment.
pub fn base_string_uri(raw: &str) -> Result<String, StrategyError> {
    let url = Url::parse(raw).map_err(|e| StrategyError::Unexpected(format!("invalid URL {}: {}", raw, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| StrategyError::Unexpected(format!("URL has no host: {}", raw)))?
        .to_ascii_lowercase();

    // `Url` already strips ports that match the scheme default
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    };
    Ok(format!("{}://{}{}", url.scheme(), authority, url.path()))
}

/// Encode, sort by key then value, join as `k=v&k=v`
pub fn normalize_parameters(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// `METHOD&encoded-uri&encoded-params`. Query parameters already on `url`
/// are folded into the parameter set.
pub fn signature_base_string(
    method: HttpMethod,
    url: &str,
    params: &[(String, String)],
) -> Result<String, StrategyError> {
    let parsed = Url::parse(url).map_err(|e| StrategyError::Unexpected(format!("invalid URL {}: {}", url, e)))?;
    let mut all: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    all.extend(params.iter().cloned());

    Ok(format!(
        "{}&{}&{}",
        method.as_str(),
        percent_encode(&base_string_uri(url)?),
        percent_encode(&normalize_parameters(&all))
    ))
}

pub fn signing_key(consumer_secret: &str, token_secret: Option<&str>) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret.unwrap_or(""))
    )
}

pub fn hmac_sha1_base64(key: &str, text: &str) -> Result<String, StrategyError> {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| StrategyError::Unexpected(format!("HMAC init failed: {}", e)))?;
    mac.update(text.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Consumer-level signer
#[derive(Clone)]
pub struct OAuth1Signer {
    consumer_key: String,
    consumer_secret: String,
    entropy: Arc<dyn EntropySource>,
}

impl std::fmt::Debug for OAuth1Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Signer")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

impl OAuth1Signer {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self::with_entropy(consumer_key, consumer_secret, Arc::new(SystemEntropy))
    }

    pub fn with_entropy(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        entropy: Arc<dyn EntropySource>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            entropy,
        }
    }

    /// The `oauth_*` protocol parameters, without the signature
    fn protocol_params(&self, token: Option<&TokenCredentials>) -> Vec<(String, String)> {
        let mut params = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), self.entropy.nonce()),
            ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp".to_string(), self.entropy.timestamp().to_string()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ];
        if let Some(token) = token {
            params.push(("oauth_token".to_string(), token.token.clone()));
        }
        params
    }

    /// Sign one request. `params` are the form body parameters; query
    /// parameters are read from `url`.
    pub fn sign(
        &self,
        method: HttpMethod,
        url: &str,
        params: &[(String, String)],
        token: Option<&TokenCredentials>,
    ) -> Result<SignedRequest, StrategyError> {
        let mut oauth_params = self.protocol_params(token);

        let mut signed_over = oauth_params.clone();
        signed_over.extend(params.iter().cloned());
        let base = signature_base_string(method, url, &signed_over)?;
        let key = signing_key(&self.consumer_secret, token.map(|t| t.secret.as_str()));
        let signature = hmac_sha1_base64(&key, &base)?;

        oauth_params.push(("oauth_signature".to_string(), signature));
        oauth_params.sort();

        Ok(SignedRequest {
            method,
            url: url.to_string(),
            authorization: authorization_header(&oauth_params),
        })
    }
}

fn authorization_header(oauth_params: &[(String, String)]) -> String {
    let fields = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", fields)
}
