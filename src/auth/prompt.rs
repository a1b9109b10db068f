//! Interactive prompts for the authorization step.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use reqwest::Url;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

use super::error::AuthError;
use super::request::{
    parse_redirect, redirect_result, AuthorizationPrompt, AuthorizationRequest,
    AuthorizationResult,
};

const DEFAULT_PROMPT_TIMEOUT: Duration = Duration::from_secs(300);
/// Time the callback server gets to flush the final page after a result.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Callback that shows the authorize URL to the user.
pub type UrlOpener = Arc<dyn Fn(&str) + Send + Sync>;

/// Opens the system browser, printing the URL when that is not possible.
fn open_in_browser() -> UrlOpener {
    browser_opener(|url| open::that(url))
}

fn browser_opener(launch: fn(&str) -> std::io::Result<()>) -> UrlOpener {
    Arc::new(move |url: &str| {
        eprintln!("🌐 Opening browser for LinkedIn sign-in...");
        if let Err(err) = launch(url) {
            tracing::debug!(error = %err, "Could not launch browser");
            eprintln!("🔗 Visit: {url}");
        }
    })
}

/// Receives the provider redirect on a local HTTP listener.
///
/// The redirect URI registered with LinkedIn must be a plain `http://`
/// loopback address, e.g. `http://127.0.0.1:8765/auth/linkedin`.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use devtrex_auth::auth::LoopbackPrompt;
///
/// let prompt = LoopbackPrompt::for_redirect_uri("http://127.0.0.1:8765/auth/linkedin")?
///     .with_timeout(Duration::from_secs(120))
///     .cancel_on_ctrl_c(true);
/// # Ok::<(), devtrex_auth::auth::AuthError>(())
/// ```
pub struct LoopbackPrompt {
    bind_addr: String,
    callback_path: String,
    timeout: Duration,
    opener: UrlOpener,
    cancel_on_ctrl_c: bool,
}

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    results: mpsc::Sender<AuthorizationResult>,
}

impl LoopbackPrompt {
    pub fn for_redirect_uri(redirect_uri: &str) -> Result<Self, AuthError> {
        let (bind_addr, callback_path) = split_loopback_uri(redirect_uri)?;
        Ok(Self {
            bind_addr,
            callback_path,
            timeout: DEFAULT_PROMPT_TIMEOUT,
            opener: open_in_browser(),
            cancel_on_ctrl_c: false,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_opener(mut self, opener: UrlOpener) -> Self {
        self.opener = opener;
        self
    }

    /// Resolve as cancelled when the process receives Ctrl-C.
    pub fn cancel_on_ctrl_c(mut self, enabled: bool) -> Self {
        self.cancel_on_ctrl_c = enabled;
        self
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    fn router(&self, state: CallbackState) -> Router {
        Router::new()
            .route(&self.callback_path, get(handle_callback))
            .with_state(state)
    }

    async fn wait_for_result(
        &self,
        results: &mut mpsc::Receiver<AuthorizationResult>,
    ) -> AuthorizationResult {
        let wait = tokio::time::timeout(self.timeout, results.recv());
        let outcome = if self.cancel_on_ctrl_c {
            tokio::select! {
                outcome = wait => outcome,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Authorization interrupted");
                    return AuthorizationResult::Cancelled;
                }
            }
        } else {
            wait.await
        };

        match outcome {
            Ok(Some(result)) => result,
            Ok(None) => AuthorizationResult::Cancelled,
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "Authorization timed out");
                AuthorizationResult::Cancelled
            }
        }
    }
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<&'static str> {
    let result = redirect_result(&params, &state.expected_state);
    let page = match &result {
        AuthorizationResult::Success { .. } => {
            "<!doctype html><html><head><title>devtrex</title></head><body><p>Signed in with LinkedIn. You can close this window.</p></body></html>"
        }
        AuthorizationResult::Cancelled => {
            "<!doctype html><html><head><title>devtrex</title></head><body><p>Sign-in cancelled. You can close this window.</p></body></html>"
        }
        AuthorizationResult::Failed { .. } => {
            "<!doctype html><html><head><title>devtrex</title></head><body><p>Sign-in failed. Return to the terminal for details.</p></body></html>"
        }
    };
    // Only the first redirect counts; later ones find the channel full.
    if state.results.try_send(result).is_err() {
        tracing::debug!("Ignoring repeated authorization redirect");
    }
    Html(page)
}

#[async_trait]
impl AuthorizationPrompt for LoopbackPrompt {
    async fn prompt(
        &self,
        request: &AuthorizationRequest,
        authorize_url: &str,
    ) -> Result<AuthorizationResult, AuthError> {
        let listener = TcpListener::bind(&self.bind_addr).await.map_err(|err| {
            AuthError::Prompt(format!("Failed to listen on {}: {err}", self.bind_addr))
        })?;
        tracing::debug!(addr = %self.bind_addr, path = %self.callback_path, "Waiting for redirect");

        let (results_tx, mut results_rx) = mpsc::channel(1);
        let app = self.router(CallbackState {
            expected_state: Arc::from(request.state.as_str()),
            results: results_tx,
        });
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        (self.opener)(authorize_url);
        let result = self.wait_for_result(&mut results_rx).await;

        let _ = shutdown_tx.send(());
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
            Ok(Ok(Err(err))) => tracing::debug!(error = %err, "Callback server error"),
            Ok(_) => {}
            Err(_) => server.abort(),
        }
        Ok(result)
    }
}

/// Asks the user to paste the redirect URL back into the terminal.
///
/// Works with redirect URIs the machine cannot listen on, such as the app's
/// custom scheme.
pub struct PastePrompt {
    opener: UrlOpener,
}

impl Default for PastePrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl PastePrompt {
    pub fn new() -> Self {
        Self {
            opener: open_in_browser(),
        }
    }

    pub fn with_opener(mut self, opener: UrlOpener) -> Self {
        self.opener = opener;
        self
    }
}

#[async_trait]
impl AuthorizationPrompt for PastePrompt {
    async fn prompt(
        &self,
        request: &AuthorizationRequest,
        authorize_url: &str,
    ) -> Result<AuthorizationResult, AuthError> {
        (self.opener)(authorize_url);
        eprintln!("📋 After authorizing, paste the URL you were redirected to:");

        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await
        .map_err(|err| AuthError::Prompt(err.to_string()))?
        .map_err(|err| AuthError::Prompt(err.to_string()))?;

        Ok(interpret_pasted(&line, &request.state))
    }
}

/// Accepts a full redirect URL, its query string, or a bare code.
pub(crate) fn interpret_pasted(input: &str, expected_state: &str) -> AuthorizationResult {
    let input = input.trim();
    if input.is_empty() {
        return AuthorizationResult::Cancelled;
    }
    if let Ok(url) = Url::parse(input) {
        return parse_redirect(url.query().unwrap_or_default(), expected_state);
    }
    if input.contains('=') {
        return parse_redirect(input, expected_state);
    }
    tracing::warn!("Bare authorization code pasted; state cannot be verified");
    AuthorizationResult::Success {
        code: input.to_string(),
        state: None,
    }
}

fn split_loopback_uri(redirect_uri: &str) -> Result<(String, String), AuthError> {
    let url = Url::parse(redirect_uri).map_err(|err| {
        AuthError::Configuration(format!("Invalid redirect URI {redirect_uri}: {err}"))
    })?;
    if url.scheme() != "http" {
        return Err(AuthError::Configuration(format!(
            "Loopback redirect URI must start with http://, got {redirect_uri}"
        )));
    }
    let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(|| {
        AuthError::Configuration(format!("Redirect URI has no host: {redirect_uri}"))
    })?;
    let port = url.port_or_known_default().unwrap_or(80);
    Ok((format!("{host}:{port}"), url.path().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_loopback_uri_extracts_addr_and_path() {
        let (addr, path) = split_loopback_uri("http://127.0.0.1:8765/auth/linkedin").unwrap();
        assert_eq!(addr, "127.0.0.1:8765");
        assert_eq!(path, "/auth/linkedin");
    }

    #[test]
    fn split_loopback_uri_defaults_port_and_path() {
        let (addr, path) = split_loopback_uri("http://localhost").unwrap();
        assert_eq!(addr, "localhost:80");
        assert_eq!(path, "/");
    }

    #[test]
    fn split_loopback_uri_rejects_custom_scheme() {
        let err = split_loopback_uri("devtrex://auth/linkedin").unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn browser_opener_launches_with_authorize_url() {
        use std::sync::Mutex;
        static LAUNCHED: Mutex<Vec<String>> = Mutex::new(Vec::new());

        let opener = browser_opener(|url| {
            LAUNCHED.lock().unwrap().push(url.to_string());
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"))
        });
        opener("https://www.linkedin.com/oauth/v2/authorization?state=s1");

        assert_eq!(
            *LAUNCHED.lock().unwrap(),
            vec!["https://www.linkedin.com/oauth/v2/authorization?state=s1".to_string()]
        );
    }

    #[test]
    fn pasted_url_is_parsed() {
        let result = interpret_pasted(
            "devtrex://auth/linkedin?code=abc&state=s1\n",
            "s1",
        );
        assert_eq!(
            result,
            AuthorizationResult::Success {
                code: "abc".to_string(),
                state: Some("s1".to_string()),
            }
        );
    }

    #[test]
    fn pasted_bare_code_is_accepted() {
        let result = interpret_pasted("abc123", "s1");
        assert_eq!(
            result,
            AuthorizationResult::Success {
                code: "abc123".to_string(),
                state: None,
            }
        );
    }

    #[test]
    fn empty_paste_cancels() {
        assert_eq!(interpret_pasted("  \n", "s1"), AuthorizationResult::Cancelled);
    }
}
