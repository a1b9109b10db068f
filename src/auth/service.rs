use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::Serialize;

use super::error::{AuthError, SignInErrorKind};
use super::exchange::TokenExchanger;
use super::request::{AuthRequestBuilder, AuthorizationPrompt, AuthorizationResult};
use super::store::{SecureStorage, TokenStore};
use super::token::UserProfile;
use super::userinfo::UserInfoFetcher;
use crate::config::LinkedInConfig;

/// Successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedIn {
    pub user: UserProfile,
    pub access_token: String,
    /// Set when the tokens could not be persisted. The caller is signed in
    /// for this process only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_warning: Option<String>,
}

/// Failed sign-in, ready to show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignInFailure {
    pub kind: SignInErrorKind,
    pub message: String,
}

impl From<AuthError> for SignInFailure {
    fn from(error: AuthError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for SignInFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

/// Result of [`AuthService::sign_in_with_linkedin`].
pub type SignInResult = Result<SignedIn, SignInFailure>;

/// Where the service is in the sign-in lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedOut { last_error: Option<SignInFailure> },
    Authenticating,
    SignedIn,
}

/// LinkedIn sign-in facade.
///
/// Collaborators are injected so that callers and tests can substitute the
/// prompt, HTTP client and storage.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use devtrex_auth::auth::{AuthService, FileSecureStorage, LoopbackPrompt};
/// use devtrex_auth::config::LinkedInConfig;
///
/// # async fn example() -> Result<(), devtrex_auth::auth::AuthError> {
/// let config = LinkedInConfig::from_env();
/// let prompt = Arc::new(LoopbackPrompt::for_redirect_uri(&config.redirect_uri)?);
/// let storage = Arc::new(FileSecureStorage::new(config.storage_dir()));
/// let service = AuthService::new(config, prompt, storage)?;
/// match service.sign_in_with_linkedin().await {
///     Ok(signed_in) => println!("Welcome, {}", signed_in.user.name),
///     Err(failure) => eprintln!("{failure}"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct AuthService {
    config: LinkedInConfig,
    requests: AuthRequestBuilder,
    exchanger: TokenExchanger,
    fetcher: UserInfoFetcher,
    store: TokenStore,
    in_flight: tokio::sync::Mutex<()>,
    state: RwLock<AuthState>,
}

impl AuthService {
    /// Build a service with an HTTP client configured from `config`.
    pub fn new(
        config: LinkedInConfig,
        prompt: Arc<dyn AuthorizationPrompt>,
        storage: Arc<dyn SecureStorage>,
    ) -> Result<Self, AuthError> {
        let client = crate::http::build_client(config.http_timeout)?;
        Ok(Self::with_http_client(config, client, prompt, storage))
    }

    pub fn with_http_client(
        config: LinkedInConfig,
        client: reqwest::Client,
        prompt: Arc<dyn AuthorizationPrompt>,
        storage: Arc<dyn SecureStorage>,
    ) -> Self {
        let store = TokenStore::new(storage);
        let initial = if store.is_authenticated() {
            AuthState::SignedIn
        } else {
            AuthState::SignedOut { last_error: None }
        };
        Self {
            requests: AuthRequestBuilder::new(&config, prompt),
            exchanger: TokenExchanger::new(client.clone(), &config),
            fetcher: UserInfoFetcher::new(client, config.userinfo_url.clone()),
            store,
            config,
            in_flight: tokio::sync::Mutex::new(()),
            state: RwLock::new(initial),
        }
    }

    pub fn config(&self) -> &LinkedInConfig {
        &self.config
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    pub fn state(&self) -> AuthState {
        self.state
            .read()
            .map(|state| state.clone())
            .unwrap_or(AuthState::SignedOut { last_error: None })
    }

    /// Run the full authorization-code flow.
    ///
    /// Every failure is captured in the returned [`SignInFailure`]. A second
    /// call while one is running fails with
    /// [`SignInErrorKind::AlreadyInProgress`] without opening a prompt.
    pub async fn sign_in_with_linkedin(&self) -> SignInResult {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!("Sign-in requested while another is running");
            return Err(AuthError::AlreadyInProgress.into());
        };

        tracing::info!("Starting LinkedIn OAuth flow");
        let previous = self.state();
        self.set_state(AuthState::Authenticating);

        match self.run_sign_in().await {
            Ok(signed_in) => {
                tracing::info!(user_id = %signed_in.user.id, "LinkedIn sign-in succeeded");
                self.set_state(AuthState::SignedIn);
                Ok(signed_in)
            }
            Err(err) => {
                let failure = SignInFailure::from(err);
                match failure.kind {
                    SignInErrorKind::UserCancelled => tracing::info!("LinkedIn sign-in cancelled"),
                    _ => tracing::error!(kind = %failure.kind, error = %failure.message, "LinkedIn OAuth error"),
                }
                // A failed attempt leaves an earlier session in place.
                let next = if previous == AuthState::SignedIn && self.store.is_authenticated() {
                    AuthState::SignedIn
                } else {
                    AuthState::SignedOut {
                        last_error: Some(failure.clone()),
                    }
                };
                self.set_state(next);
                Err(failure)
            }
        }
    }

    async fn run_sign_in(&self) -> Result<SignedIn, AuthError> {
        self.config.validate()?;

        let code = match self.requests.authorize().await? {
            AuthorizationResult::Success { code, .. } => code,
            AuthorizationResult::Cancelled => return Err(AuthError::UserCancelled),
            AuthorizationResult::Failed { error, description } => {
                let message = match description {
                    Some(description) => format!("{error}: {description}"),
                    None => error,
                };
                return Err(AuthError::ProviderAuthorization(message));
            }
        };
        tracing::debug!("Authorization code received");

        let tokens = self.exchanger.exchange(&code).await?;
        tracing::debug!(
            has_refresh_token = tokens.refresh_token.is_some(),
            expires_in = ?tokens.expires_in,
            "Access token issued"
        );

        let user = self.fetcher.fetch(&tokens.access_token).await?;

        let storage_warning = match self.store.store(&tokens) {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to store tokens");
                Some(err.to_string())
            }
        };

        Ok(SignedIn {
            user,
            access_token: tokens.access_token,
            storage_warning,
        })
    }

    /// True iff an access token is stored. Expiry is not checked.
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Like [`is_authenticated`](Self::is_authenticated), but a recorded
    /// expiry in the past counts as signed out.
    pub fn is_authenticated_unexpired(&self) -> bool {
        if !self.store.is_authenticated() {
            return false;
        }
        match self.store.is_expired(Utc::now()) {
            Ok(Some(expired)) => !expired,
            Ok(None) => true,
            Err(err) => {
                tracing::warn!(error = %err, "Unreadable token expiry");
                false
            }
        }
    }

    /// Fetch the profile for the stored token. `None` when signed out.
    ///
    /// Always goes to the provider; profiles are not cached.
    pub async fn get_current_user(&self) -> Result<Option<UserProfile>, AuthError> {
        let Some(token) = self.store.access_token() else {
            return Ok(None);
        };
        match self.fetcher.fetch(&token).await {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                if err.is_unauthorized() {
                    tracing::warn!("Stored LinkedIn token was rejected; sign in again");
                } else {
                    tracing::error!(error = %err, "Failed to get current user");
                }
                Err(err)
            }
        }
    }

    /// Remove stored tokens. Waits for a running sign-in to finish first.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let _guard = self.in_flight.lock().await;
        let result = self.store.clear();
        if let Err(ref err) = result {
            tracing::error!(error = %err, "Failed to sign out");
        }
        self.set_state(AuthState::SignedOut { last_error: None });
        result
    }

    fn set_state(&self, next: AuthState) {
        if let Ok(mut state) = self.state.write() {
            *state = next;
        }
    }
}
