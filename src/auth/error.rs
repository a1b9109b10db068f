use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::error::DevtrexError;

/// Errors raised by the individual steps of the LinkedIn sign-in flow.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Configuration(String),
    #[error("User cancelled the authentication")]
    UserCancelled,
    #[error("Authorization failed: {0}")]
    ProviderAuthorization(String),
    #[error("Token exchange failed: {status}")]
    TokenExchangeFailed { status: u16 },
    #[error("Failed to get access token")]
    MissingAccessToken,
    #[error("Failed to fetch user info: {status}")]
    UserInfoFetchFailed { status: u16 },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Authorization prompt failed: {0}")]
    Prompt(String),
    #[error("A sign-in is already in progress")]
    AlreadyInProgress,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Classify this error for the sign-in result.
    pub fn kind(&self) -> SignInErrorKind {
        match self {
            Self::Configuration(_) => SignInErrorKind::Configuration,
            Self::UserCancelled => SignInErrorKind::UserCancelled,
            Self::ProviderAuthorization(_) => SignInErrorKind::ProviderAuthorization,
            Self::TokenExchangeFailed { .. } | Self::MissingAccessToken => {
                SignInErrorKind::TokenExchange
            }
            Self::UserInfoFetchFailed { .. } => SignInErrorKind::UserInfo,
            Self::Storage(_) => SignInErrorKind::Storage,
            Self::Prompt(_) => SignInErrorKind::Prompt,
            Self::AlreadyInProgress => SignInErrorKind::AlreadyInProgress,
            Self::Network(_) | Self::Timeout | Self::Serialization(_) => SignInErrorKind::Network,
        }
    }

    /// HTTP status reported by the provider, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TokenExchangeFailed { status } | Self::UserInfoFetchFailed { status } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Whether the provider rejected the bearer token.
    ///
    /// The stored token is left alone; callers decide whether to sign in again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::UserInfoFetchFailed { status: 401 })
    }
}

/// Failure classes surfaced by [`super::AuthService::sign_in_with_linkedin`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SignInErrorKind {
    Configuration,
    UserCancelled,
    ProviderAuthorization,
    TokenExchange,
    UserInfo,
    Storage,
    Network,
    Prompt,
    AlreadyInProgress,
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Serialization(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<AuthError> for DevtrexError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Configuration(message) => DevtrexError::Configuration(message),
            AuthError::Timeout => DevtrexError::Timeout,
            other => DevtrexError::Authentication(other.to_string()),
        }
    }
}
