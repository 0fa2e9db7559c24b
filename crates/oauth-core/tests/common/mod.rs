//! Shared helpers for the integration tests
#![allow(dead_code)]

use oauth_core::{ClientCredentials, Endpoints, Provider};

/// Surface strategy logs with `RUST_LOG=oauth_core=debug cargo test`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn credentials() -> ClientCredentials {
    ClientCredentials::new("k", "s", "https://a.test/cb")
}

/// Registry endpoints for `provider`, re-rooted on a mock server
pub fn endpoints_on(provider: Provider, base: &str) -> Endpoints {
    Endpoints::for_provider(provider).rebased(base)
}

/// A base URL nothing is listening on
pub fn dead_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}
