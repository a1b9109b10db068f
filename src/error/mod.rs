//! Error types for devtrex-auth.

use thiserror::Error;

/// Crate-level error for configuration loading and command handling.
///
/// Sign-in steps use [`crate::auth::AuthError`]; it converts into this type.
#[derive(Error, Debug)]
pub enum DevtrexError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request timed out")]
    Timeout,
}

impl DevtrexError {
    /// Short actionable hint for a user-facing message.
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            Self::Configuration(_) => Some(
                "Set EXPO_PUBLIC_LINKEDIN_CLIENT_ID and EXPO_PUBLIC_LINKEDIN_CLIENT_SECRET in your .env file",
            ),
            Self::Authentication(_) => Some("Run: devtrex-auth auth login"),
            Self::Timeout => Some("Check your network connection and try again"),
            Self::Io(_) | Self::Serialization(_) => None,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DevtrexError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;

    #[test]
    fn auth_configuration_error_stays_configuration() {
        let err: DevtrexError = AuthError::Configuration("missing client id".into()).into();
        assert!(matches!(err, DevtrexError::Configuration(ref m) if m == "missing client id"));
        assert!(err.recovery_hint().is_some());
    }

    #[test]
    fn other_auth_errors_become_authentication() {
        let err: DevtrexError = AuthError::TokenExchangeFailed { status: 400 }.into();
        assert!(matches!(err, DevtrexError::Authentication(ref m) if m.contains("400")));
        assert_eq!(err.recovery_hint(), Some("Run: devtrex-auth auth login"));
    }

    #[test]
    fn timeouts_are_preserved() {
        let err: DevtrexError = AuthError::Timeout.into();
        assert!(matches!(err, DevtrexError::Timeout));
    }
}
