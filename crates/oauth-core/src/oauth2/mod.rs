//! ============================================================================
//! OAuth 2.0 - Authorization code strategies (GitHub, LinkedIn)
//! ============================================================================

mod flow;
mod github;
mod linkedin;
pub mod state;

pub use flow::AuthorizationOptions;
pub use github::{GithubStrategy, GithubTokenParams};
pub use linkedin::{LinkedinStrategy, LinkedinTokenParams};
pub use state::CsrfState;
