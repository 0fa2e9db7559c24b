//! ============================================================================
//! Provider Endpoint Registry
//! ============================================================================
//! Static URL tables for every supported provider. Strategies copy the table
//! into an owned `Endpoints` at construction so a test (or a proxy
//! deployment) can point them elsewhere.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Supported providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Twitter,
    GitHub,
    LinkedIn,
}

/// Static endpoint table for a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderEndpoints {
    /// OAuth1 only
    pub request_token: Option<&'static str>,
    /// Browser redirect target
    pub authorize: &'static str,
    pub access_token: &'static str,
}

pub const TWITTER: ProviderEndpoints = ProviderEndpoints {
    request_token: Some("https://api.twitter.com/oauth/request_token"),
    authorize: "https://api.twitter.com/oauth/authenticate",
    access_token: "https://api.twitter.com/oauth/access_token",
};

pub const GITHUB: ProviderEndpoints = ProviderEndpoints {
    request_token: None,
    authorize: "https://github.com/login/oauth/authorize",
    access_token: "https://github.com/login/oauth/access_token",
};

pub const LINKEDIN: ProviderEndpoints = ProviderEndpoints {
    request_token: None,
    authorize: "https://www.linkedin.com/oauth/v2/authorization",
    access_token: "https://www.linkedin.com/oauth/v2/accessToken",
};

impl Provider {
    pub fn endpoints(&self) -> &'static ProviderEndpoints {
        match self {
            Provider::Twitter => &TWITTER,
            Provider::GitHub => &GITHUB,
            Provider::LinkedIn => &LINKEDIN,
        }
    }

    /// Prefix for environment variables holding this provider's credentials
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Provider::Twitter => "TWITTER",
            Provider::GitHub => "GITHUB",
            Provider::LinkedIn => "LINKEDIN",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Twitter => "Twitter",
            Provider::GitHub => "GitHub",
            Provider::LinkedIn => "LinkedIn",
        }
    }
}

/// Endpoint URLs a strategy actually talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub request_token: Option<String>,
    pub authorize: String,
    pub access_token: String,
}

impl From<&ProviderEndpoints> for Endpoints {
    fn from(table: &ProviderEndpoints) -> Self {
        Self {
            request_token: table.request_token.map(str::to_string),
            authorize: table.authorize.to_string(),
            access_token: table.access_token.to_string(),
        }
    }
}

impl Endpoints {
    /// The registry defaults for `provider`
    pub fn for_provider(provider: Provider) -> Self {
        provider.endpoints().into()
    }

    /// Re-root every endpoint path under `base`, e.g. a local mock server.
    /// `https://api.twitter.com/oauth/request_token` becomes
    /// `{base}/oauth/request_token`.
    pub fn rebased(&self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        let rebase = |u: &str| match url::Url::parse(u) {
            Ok(parsed) => format!("{}{}", base, parsed.path()),
            Err(_) => u.to_string(),
        };
        Self {
            request_token: self.request_token.as_deref().map(rebase),
            authorize: rebase(&self.authorize),
            access_token: rebase(&self.access_token),
        }
    }
}
