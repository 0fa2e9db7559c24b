//! ============================================================================
//! Configuration - Credentials and transport settings from the environment
//! ============================================================================
//! Reads a `.env` file when present, then the process environment:
//! - `<PROVIDER>_CLIENT_ID` / `_CLIENT_SECRET` / `_REDIRECT_URI`
//!   (`TWITTER_`, `GITHUB_`, `LINKEDIN_`)
//! - Twitter also accepts `TWITTER_CONSUMER_KEY` / `_CONSUMER_SECRET` /
//!   `_CALLBACK_URL`
//! - `OAUTH_HTTP_TIMEOUT_SECS` / `OAUTH_HTTP_USER_AGENT` for the transport
//!
//! Missing credentials load as empty strings: the strategy then starts
//! disabled and reports `MissingClientCredentials` on use.
//! ============================================================================

use anyhow::{anyhow, Result};
use std::time::Duration;
use tracing::{debug, warn};

use crate::endpoints::Provider;
use crate::transport::TransportConfig;
use crate::types::ClientCredentials;

pub const TIMEOUT_ENV: &str = "OAUTH_HTTP_TIMEOUT_SECS";
pub const USER_AGENT_ENV: &str = "OAUTH_HTTP_USER_AGENT";

/// Load `.env` into the process environment if one exists
fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {}", e);
    }
}

/// Credentials for `provider` from `.env` and the environment
pub fn load_credentials(provider: Provider) -> ClientCredentials {
    load_dotenv();
    credentials_from(provider, |key| std::env::var(key).ok())
}

/// Credentials for `provider` from an arbitrary key lookup
pub fn credentials_from<F>(provider: Provider, lookup: F) -> ClientCredentials
where
    F: Fn(&str) -> Option<String>,
{
    let prefix = provider.env_prefix();
    let read = |names: &[&str]| {
        names
            .iter()
            .find_map(|suffix| lookup(&format!("{}_{}", prefix, suffix)).filter(|v| !v.is_empty()))
            .unwrap_or_default()
    };

    let credentials = match provider {
        Provider::Twitter => ClientCredentials::new(
            read(&["CONSUMER_KEY", "CLIENT_ID"]),
            read(&["CONSUMER_SECRET", "CLIENT_SECRET"]),
            read(&["CALLBACK_URL", "REDIRECT_URI"]),
        ),
        Provider::GitHub | Provider::LinkedIn => ClientCredentials::new(
            read(&["CLIENT_ID"]),
            read(&["CLIENT_SECRET"]),
            read(&["REDIRECT_URI"]),
        ),
    };

    if !credentials.is_complete() {
        warn!(
            "Incomplete {} credentials in environment ({}_*)",
            provider.display_name(),
            prefix
        );
    }
    credentials
}

/// Transport settings from `.env` and the environment
pub fn load_transport_config() -> Result<TransportConfig> {
    load_dotenv();
    transport_config_from(|key| std::env::var(key).ok())
}

pub fn transport_config_from<F>(lookup: F) -> Result<TransportConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = TransportConfig::default();

    if let Some(raw) = lookup(TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
        let secs: u64 = raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {} '{}': {}", TIMEOUT_ENV, raw, e))?;
        config.timeout = Some(Duration::from_secs(secs));
    }
    if let Some(agent) = lookup(USER_AGENT_ENV).filter(|v| !v.is_empty()) {
        config.user_agent = agent;
    }

    Ok(config)
}
