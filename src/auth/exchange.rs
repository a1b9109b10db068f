use serde_json::Value;

use super::error::AuthError;
use super::token::TokenSet;
use crate::config::LinkedInConfig;

/// Exchanges an authorization code for tokens at the LinkedIn token endpoint.
///
/// Codes are single-use, so a failed exchange is never retried.
///
/// # Example
/// ```no_run
/// use devtrex_auth::auth::TokenExchanger;
/// use devtrex_auth::config::LinkedInConfig;
///
/// # async fn example() -> Result<(), devtrex_auth::auth::AuthError> {
/// let config = LinkedInConfig::from_env();
/// let exchanger = TokenExchanger::new(reqwest::Client::new(), &config);
/// let tokens = exchanger.exchange("auth-code").await?;
/// println!("expires in {:?}s", tokens.expires_in);
/// # Ok(())
/// # }
/// ```
pub struct TokenExchanger {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl TokenExchanger {
    pub fn new(client: reqwest::Client, config: &LinkedInConfig) -> Self {
        Self {
            client,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub async fn exchange(&self, code: &str) -> Result<TokenSet, AuthError> {
        if code.trim().is_empty() {
            return Err(AuthError::ProviderAuthorization(
                "No authorization code received".to_string(),
            ));
        }

        let resp = self
            .client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Token exchange failed");
            return Err(AuthError::TokenExchangeFailed {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        token_set_from_body(&body)
    }
}

/// Any 2xx body without a usable `access_token` counts as a failed exchange,
/// including bodies that are not JSON at all.
fn token_set_from_body(body: &str) -> Result<TokenSet, AuthError> {
    let payload: Value = serde_json::from_str(body).map_err(|err| {
        tracing::error!(error = %err, "Token response is not JSON");
        AuthError::MissingAccessToken
    })?;
    let text_field = |name: &str| {
        payload
            .get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let access_token = text_field("access_token").ok_or(AuthError::MissingAccessToken)?;
    Ok(TokenSet {
        access_token,
        refresh_token: text_field("refresh_token"),
        expires_in: payload.get("expires_in").and_then(Value::as_u64),
    })
}
