//! ============================================================================
//! OAuth 1.0a - Request signing and the Twitter three-legged flow
//! ============================================================================

pub mod signer;
mod twitter;

pub use signer::{EntropySource, OAuth1Signer, SignedRequest, SystemEntropy, TokenCredentials};
pub use twitter::{HandshakeState, TwitterStrategy};
