use serde::{Deserialize, Serialize};

/// Tokens returned by the LinkedIn token endpoint.
///
/// # Example
/// ```
/// use devtrex_auth::auth::TokenSet;
///
/// let tokens = TokenSet {
///     access_token: "access".to_string(),
///     refresh_token: Some("refresh".to_string()),
///     expires_in: Some(3600),
/// };
/// assert_eq!(tokens.expires_in_millis(), Some(3_600_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, relative to the moment the token was issued.
    pub expires_in: Option<u64>,
}

impl TokenSet {
    pub fn expires_in_millis(&self) -> Option<i64> {
        self.expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| i64::try_from(secs).unwrap_or(i64::MAX).saturating_mul(1000))
    }
}

/// Profile attributes from the OpenID Connect user-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_lifetime(expires_in: Option<u64>) -> TokenSet {
        TokenSet {
            access_token: "T".to_string(),
            refresh_token: None,
            expires_in,
        }
    }

    #[test]
    fn zero_lifetime_means_no_expiry() {
        assert_eq!(with_lifetime(Some(0)).expires_in_millis(), None);
        assert_eq!(with_lifetime(None).expires_in_millis(), None);
    }

    #[test]
    fn huge_lifetime_saturates_instead_of_wrapping() {
        assert_eq!(with_lifetime(Some(u64::MAX)).expires_in_millis(), Some(i64::MAX));
        assert_eq!(
            with_lifetime(Some(i64::MAX as u64 / 10)).expires_in_millis(),
            Some(i64::MAX)
        );
    }
}
