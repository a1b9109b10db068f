#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use devtrex_auth::auth::{
    AuthError, AuthService, AuthorizationPrompt, AuthorizationRequest, AuthorizationResult,
    SecureStorage,
};
use devtrex_auth::config::LinkedInConfig;
use wiremock::MockServer;

/// What the scripted user does on the consent screen.
#[derive(Debug, Clone)]
pub enum Consent {
    Approve(String),
    ApproveWithState { code: String, state: String },
    Cancel,
    Deny { error: String, description: Option<String> },
    Hang(Duration),
}

/// Prompt that plays back a fixed outcome and records what it was shown.
pub struct ScriptedPrompt {
    consent: Consent,
    calls: AtomicUsize,
    last_url: Mutex<Option<String>>,
    last_request: Mutex<Option<AuthorizationRequest>>,
}

impl ScriptedPrompt {
    pub fn new(consent: Consent) -> Self {
        Self {
            consent,
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
            last_request: Mutex::new(None),
        }
    }

    pub fn approving(code: &str) -> Self {
        Self::new(Consent::Approve(code.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<String> {
        self.last_url.lock().expect("prompt lock poisoned").clone()
    }

    pub fn last_request(&self) -> Option<AuthorizationRequest> {
        self.last_request.lock().expect("prompt lock poisoned").clone()
    }
}

#[async_trait]
impl AuthorizationPrompt for ScriptedPrompt {
    async fn prompt(
        &self,
        request: &AuthorizationRequest,
        authorize_url: &str,
    ) -> Result<AuthorizationResult, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().expect("prompt lock poisoned") = Some(authorize_url.to_string());
        *self.last_request.lock().expect("prompt lock poisoned") = Some(request.clone());

        Ok(match &self.consent {
            Consent::Approve(code) => AuthorizationResult::Success {
                code: code.clone(),
                state: Some(request.state.clone()),
            },
            Consent::ApproveWithState { code, state } => AuthorizationResult::Success {
                code: code.clone(),
                state: Some(state.clone()),
            },
            Consent::Cancel => AuthorizationResult::Cancelled,
            Consent::Deny { error, description } => AuthorizationResult::Failed {
                error: error.clone(),
                description: description.clone(),
            },
            Consent::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                AuthorizationResult::Success {
                    code: "late-code".to_string(),
                    state: Some(request.state.clone()),
                }
            }
        })
    }
}

/// Storage whose writes always fail.
#[derive(Default)]
pub struct FailingStorage {
    items: Mutex<HashMap<String, String>>,
}

impl SecureStorage for FailingStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.items.lock().expect("store lock poisoned").get(key).cloned())
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), AuthError> {
        Err(AuthError::Storage("keychain unavailable".to_string()))
    }

    fn delete_item(&self, key: &str) -> Result<(), AuthError> {
        self.items.lock().expect("store lock poisoned").remove(key);
        Ok(())
    }
}

/// Config pointing every LinkedIn endpoint at `server`.
pub fn mock_config(server: &MockServer) -> LinkedInConfig {
    LinkedInConfig::default()
        .with_client_credentials("test-client", "test-secret")
        .with_redirect_uri("devtrex://auth/linkedin")
        .with_authorization_url(format!("{}/oauth/v2/authorization", server.uri()))
        .with_token_url(format!("{}/oauth/v2/accessToken", server.uri()))
        .with_userinfo_url(format!("{}/v2/userinfo", server.uri()))
        .with_http_timeout(Duration::from_secs(5))
}

pub fn service(
    config: LinkedInConfig,
    prompt: Arc<dyn AuthorizationPrompt>,
    storage: Arc<dyn SecureStorage>,
) -> AuthService {
    AuthService::new(config, prompt, storage).expect("service")
}
