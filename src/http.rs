//! Shared HTTP client construction.

use std::time::Duration;

use crate::auth::AuthError;

/// Build the client used for token exchange and user-info calls.
///
/// Every request is bounded by `timeout`; the provider calls have no retry.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, AuthError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .user_agent(concat!("devtrex-auth/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| AuthError::Network(format!("Failed to build HTTP client: {err}")))
}
