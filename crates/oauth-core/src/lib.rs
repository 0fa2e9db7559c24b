//! ============================================================================
//! OAUTH-CORE: Client-side OAuth strategies
//! ============================================================================
//! This crate drives the client half of three provider sign-in flows:
//! - Twitter OAuth 1.0a (HMAC-SHA1 signed three-legged handshake)
//! - GitHub OAuth2 authorization code flow
//! - LinkedIn OAuth2 authorization code flow
//!
//! Every public operation returns `Result<StrategyResponse, ErrorResponse>`,
//! both shaped `{ status, data }`. Nothing is stored beyond the optional
//! CSRF state of the flow in progress; token storage and refresh belong to
//! the caller.
//!
//! ## Usage
//! ```rust,ignore
//! use oauth_core::{ClientCredentials, TwitterStrategy};
//!
//! let mut twitter = TwitterStrategy::new(ClientCredentials::new(key, secret, callback));
//! let redirect = twitter.initiate_authentication().await?;
//! // ... user approves, Twitter calls back with oauth_token + oauth_verifier
//! let tokens = twitter.get_access_tokens(&params).await?;
//! ```
//! ============================================================================

pub mod config;
pub mod endpoints;
pub mod error;
pub mod oauth1;
pub mod oauth2;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use endpoints::{Endpoints, Provider};
pub use error::{ErrorResponse, StrategyError};
pub use oauth1::{HandshakeState, TwitterStrategy};
pub use oauth2::{
    AuthorizationOptions, GithubStrategy, GithubTokenParams, LinkedinStrategy, LinkedinTokenParams,
};
pub use transport::{HttpTransport, ReqwestTransport, TransportConfig};
pub use types::*;
