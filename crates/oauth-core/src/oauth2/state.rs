//! CSRF state for authorization-code flows.
//!
//! One slot per strategy instance: every initiation overwrites it, so a
//! single instance must not run overlapping flows.

use tracing::{debug, warn};

use crate::error::StrategyError;

/// Opaque random state token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfState(String);

impl CsrfState {
    /// 32 random bytes, hex encoded
    pub fn generate() -> Self {
        let bytes: [u8; 32] = rand::random();
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The state issued by the most recent initiation, if managed
#[derive(Debug, Clone, Default)]
pub struct StateSlot {
    issued: Option<CsrfState>,
}

impl StateSlot {
    /// Generate and remember a fresh state, replacing any previous one
    pub fn issue(&mut self) -> CsrfState {
        let state = CsrfState::generate();
        debug!("Issued new CSRF state");
        self.issued = Some(state.clone());
        state
    }

    /// Stop managing state (caller handles it, or none is used).
    /// Returns the state that was still outstanding, if any.
    pub fn clear(&mut self) -> Option<CsrfState> {
        self.issued.take()
    }

    pub fn is_managed(&self) -> bool {
        self.issued.is_some()
    }

    /// Exact comparison against the issued state. Passes trivially when
    /// state is not managed.
    pub fn verify(&self, supplied: Option<&str>) -> Result<(), StrategyError> {
        match &self.issued {
            None => Ok(()),
            Some(expected) if supplied == Some(expected.as_str()) => Ok(()),
            Some(_) => {
                warn!("CSRF state mismatch on token exchange");
                Err(StrategyError::StateMismatch)
            }
        }
    }
}
