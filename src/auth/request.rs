use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use url::form_urlencoded;

use super::error::AuthError;
use crate::config::LinkedInConfig;

/// LinkedIn error codes sent when the user backs out of the consent screen.
const CANCEL_ERROR_CODES: &[&str] = &["user_cancelled_login", "user_cancelled_authorize"];

/// Parameters of a single authorization attempt.
///
/// A fresh `state` is generated per request and must be echoed back by the
/// provider on the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: BTreeSet<String>,
    pub state: String,
    pub response_type: String,
}

impl AuthorizationRequest {
    /// Render the provider-hosted authorization URL for this request.
    pub fn authorize_url(&self, endpoint: &str) -> String {
        let scope = self
            .scopes
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        let params = [
            ("response_type", self.response_type.as_str()),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("state", self.state.as_str()),
        ];
        build_url_with_params(endpoint, &params)
    }
}

/// Outcome of the interactive authorization step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResult {
    Success {
        code: String,
        state: Option<String>,
    },
    Cancelled,
    Failed {
        error: String,
        description: Option<String>,
    },
}

impl AuthorizationResult {
    fn failed(error: impl Into<String>, description: Option<String>) -> Self {
        Self::Failed {
            error: error.into(),
            description,
        }
    }
}

/// Interactive step of the authorization-code flow.
///
/// Implementations show `authorize_url` to the user (browser, terminal, web
/// view) and resolve once the provider redirects back or the user gives up.
/// An `Err` means the prompt itself broke; provider-side errors come back as
/// [`AuthorizationResult::Failed`].
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    async fn prompt(
        &self,
        request: &AuthorizationRequest,
        authorize_url: &str,
    ) -> Result<AuthorizationResult, AuthError>;
}

/// Builds authorization requests from static config and runs them through a
/// prompt.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use devtrex_auth::auth::{AuthRequestBuilder, PastePrompt};
/// use devtrex_auth::config::LinkedInConfig;
///
/// # async fn example() -> Result<(), devtrex_auth::auth::AuthError> {
/// let config = LinkedInConfig::from_env();
/// let builder = AuthRequestBuilder::new(&config, Arc::new(PastePrompt::new()));
/// let result = builder.authorize().await?;
/// println!("{result:?}");
/// # Ok(())
/// # }
/// ```
pub struct AuthRequestBuilder {
    client_id: String,
    redirect_uri: String,
    scopes: BTreeSet<String>,
    authorization_url: String,
    prompt: Arc<dyn AuthorizationPrompt>,
}

impl AuthRequestBuilder {
    pub fn new(config: &LinkedInConfig, prompt: Arc<dyn AuthorizationPrompt>) -> Self {
        Self {
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.iter().cloned().collect(),
            authorization_url: config.authorization_url.clone(),
            prompt,
        }
    }

    /// Create a request with a freshly generated CSRF state.
    pub fn build_request(&self) -> AuthorizationRequest {
        AuthorizationRequest {
            client_id: self.client_id.clone(),
            redirect_uri: self.redirect_uri.clone(),
            scopes: self.scopes.clone(),
            state: generate_state(),
            response_type: "code".to_string(),
        }
    }

    /// Run one authorization attempt and verify the echoed state.
    pub async fn authorize(&self) -> Result<AuthorizationResult, AuthError> {
        let request = self.build_request();
        let authorize_url = request.authorize_url(&self.authorization_url);
        tracing::info!(
            client_id = %request.client_id,
            redirect_uri = %request.redirect_uri,
            scopes = ?request.scopes,
            "Auth request created"
        );

        let result = self.prompt.prompt(&request, &authorize_url).await?;
        Ok(verify_state(result, &request.state))
    }
}

fn verify_state(result: AuthorizationResult, expected: &str) -> AuthorizationResult {
    match result {
        AuthorizationResult::Success {
            state: Some(ref returned),
            ..
        } if returned != expected => {
            tracing::warn!("Authorization redirect carried a foreign state");
            AuthorizationResult::failed(
                "state_mismatch",
                Some("OAuth state did not match the pending request".to_string()),
            )
        }
        AuthorizationResult::Success { code, .. } if code.is_empty() => {
            AuthorizationResult::failed(
                "missing_code",
                Some("No authorization code received".to_string()),
            )
        }
        other => other,
    }
}

/// Interpret the query string of a redirect back to `redirect_uri`.
///
/// The redirect must echo `expected_state`; a missing or different value is
/// reported as `state_mismatch`.
pub fn parse_redirect(query: &str, expected_state: &str) -> AuthorizationResult {
    let query = query.trim().trim_start_matches('?');
    let query = query.split('#').next().unwrap_or_default();
    let params: HashMap<String, String> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    redirect_result(&params, expected_state)
}

/// Same as [`parse_redirect`] for query parameters that were already decoded.
pub(crate) fn redirect_result(
    params: &HashMap<String, String>,
    expected_state: &str,
) -> AuthorizationResult {
    if let Some(error) = params.get("error") {
        if CANCEL_ERROR_CODES.contains(&error.as_str()) {
            return AuthorizationResult::Cancelled;
        }
        return AuthorizationResult::failed(error.clone(), params.get("error_description").cloned());
    }

    match params.get("code") {
        Some(code) => {
            let state = Some(params.get("state").cloned().unwrap_or_default());
            verify_state(
                AuthorizationResult::Success {
                    code: code.clone(),
                    state,
                },
                expected_state,
            )
        }
        None => AuthorizationResult::failed(
            "missing_code",
            Some("No authorization code received".to_string()),
        ),
    }
}

fn generate_state() -> String {
    let mut buf = [0u8; 32];
    for chunk in buf.chunks_mut(16) {
        let id = uuid::Uuid::new_v4();
        let bytes = id.as_bytes();
        let len = chunk.len().min(16);
        chunk[..len].copy_from_slice(&bytes[..len]);
    }
    URL_SAFE_NO_PAD.encode(buf)
}

fn build_url_with_params(base: &str, params: &[(&str, &str)]) -> String {
    let mut url = base.to_string();
    url.push(if base.contains('?') { '&' } else { '?' });
    for (i, (key, value)) in params.iter().enumerate() {
        if i > 0 {
            url.push('&');
        }
        url.push_str(&urlencoded(key));
        url.push('=');
        url.push_str(&urlencoded(value));
    }
    url
}

fn urlencoded(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn builder() -> AuthRequestBuilder {
        struct NeverPrompt;

        #[async_trait]
        impl AuthorizationPrompt for NeverPrompt {
            async fn prompt(
                &self,
                _request: &AuthorizationRequest,
                _authorize_url: &str,
            ) -> Result<AuthorizationResult, AuthError> {
                Ok(AuthorizationResult::Cancelled)
            }
        }

        let config = LinkedInConfig::default()
            .with_client_credentials("client-123", "secret")
            .with_redirect_uri("http://127.0.0.1:8765/auth/linkedin");
        AuthRequestBuilder::new(&config, Arc::new(NeverPrompt))
    }

    #[test]
    fn request_uses_fixed_scope_set_and_code_response() {
        let request = builder().build_request();
        let scopes: Vec<&str> = request.scopes.iter().map(String::as_str).collect();
        assert_eq!(scopes, vec!["email", "openid", "profile"]);
        assert_eq!(request.response_type, "code");
        assert_eq!(request.client_id, "client-123");
    }

    #[test]
    fn state_is_fresh_per_request() {
        let builder = builder();
        let first = builder.build_request();
        let second = builder.build_request();
        assert_ne!(first.state, second.state);
        assert_eq!(first.state.len(), 43);
        assert!(first
            .state
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn authorize_url_encodes_all_parameters() {
        let mut request = builder().build_request();
        request.state = "xyz".to_string();
        let url = request.authorize_url("https://www.linkedin.com/oauth/v2/authorization");
        assert_eq!(
            url,
            "https://www.linkedin.com/oauth/v2/authorization?response_type=code\
             &client_id=client-123\
             &redirect_uri=http%3A%2F%2F127.0.0.1%3A8765%2Fauth%2Flinkedin\
             &scope=email%20openid%20profile\
             &state=xyz"
        );
    }

    #[test]
    fn parse_redirect_extracts_code() {
        let result = parse_redirect("?code=abc%2B1&state=s1", "s1");
        assert_eq!(
            result,
            AuthorizationResult::Success {
                code: "abc+1".to_string(),
                state: Some("s1".to_string()),
            }
        );
    }

    #[test]
    fn parse_redirect_rejects_foreign_state() {
        let result = parse_redirect("code=abc&state=other", "s1");
        assert!(matches!(
            result,
            AuthorizationResult::Failed { ref error, .. } if error == "state_mismatch"
        ));
    }

    #[test]
    fn parse_redirect_requires_state() {
        let result = parse_redirect("code=abc", "s1");
        assert!(matches!(
            result,
            AuthorizationResult::Failed { ref error, .. } if error == "state_mismatch"
        ));
    }

    #[test]
    fn parse_redirect_maps_cancel_codes() {
        let result = parse_redirect(
            "error=user_cancelled_login&error_description=The+user+cancelled",
            "s1",
        );
        assert_eq!(result, AuthorizationResult::Cancelled);
    }

    #[test]
    fn parse_redirect_surfaces_provider_errors() {
        let result = parse_redirect(
            "error=unauthorized_scope_error&error_description=Scope%20%22email%22%20not%20authorized&state=s1",
            "s1",
        );
        assert_eq!(
            result,
            AuthorizationResult::Failed {
                error: "unauthorized_scope_error".to_string(),
                description: Some("Scope \"email\" not authorized".to_string()),
            }
        );
    }

    #[test]
    fn parse_redirect_without_code_fails() {
        let result = parse_redirect("state=s1", "s1");
        assert!(matches!(
            result,
            AuthorizationResult::Failed { ref error, .. } if error == "missing_code"
        ));
    }

    #[test]
    fn parse_redirect_keeps_malformed_escapes() {
        let result = parse_redirect("code=100%25%zz&state=s+1", "s 1");
        assert_eq!(
            result,
            AuthorizationResult::Success {
                code: "100%%zz".to_string(),
                state: Some("s 1".to_string()),
            }
        );
    }

    #[test]
    fn parse_redirect_ignores_fragment() {
        let result = parse_redirect("?code=abc&state=s1#_=_", "s1");
        assert!(matches!(result, AuthorizationResult::Success { ref code, .. } if code == "abc"));
    }
}
