//! CLI auth command handlers.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::{
    AuthService, AuthorizationPrompt, FileSecureStorage, LoopbackPrompt, PastePrompt,
    SignInErrorKind, SignInFailure,
};
use crate::config::LinkedInConfig;
use crate::error::DevtrexError;

fn build_service(
    config: LinkedInConfig,
    prompt: Arc<dyn AuthorizationPrompt>,
) -> Result<AuthService, DevtrexError> {
    let storage = Arc::new(FileSecureStorage::new(config.storage_dir()));
    Ok(AuthService::new(config, prompt, storage)?)
}

/// Service for commands that never reach the authorization prompt.
fn offline_service() -> Result<AuthService, DevtrexError> {
    build_service(LinkedInConfig::from_env(), Arc::new(PastePrompt::new()))
}

/// Handle `devtrex-auth auth login`.
pub async fn handle_login(paste: bool) -> Result<(), DevtrexError> {
    let config = LinkedInConfig::from_env();
    config.validate()?;

    let prompt: Arc<dyn AuthorizationPrompt> = if paste {
        Arc::new(PastePrompt::new())
    } else {
        Arc::new(
            LoopbackPrompt::for_redirect_uri(&config.redirect_uri)?
                .with_timeout(config.prompt_timeout)
                .cancel_on_ctrl_c(true),
        )
    };
    let service = build_service(config, prompt)?;

    println!("⏳ Waiting for LinkedIn authorization...");
    match service.sign_in_with_linkedin().await {
        Ok(signed_in) => {
            println!("✅ Signed in as {} <{}>", signed_in.user.name, signed_in.user.email);
            if let Some(warning) = signed_in.storage_warning {
                println!("⚠️  Tokens were not saved: {warning}");
                println!("   You will need to sign in again next time.");
            }
            Ok(())
        }
        Err(failure) if failure.kind == SignInErrorKind::UserCancelled => {
            println!("❌ Sign-in cancelled");
            Ok(())
        }
        Err(failure) => Err(failure_to_error(failure)),
    }
}

fn failure_to_error(failure: SignInFailure) -> DevtrexError {
    match failure.kind {
        SignInErrorKind::Configuration => DevtrexError::Configuration(failure.message),
        _ => DevtrexError::Authentication(failure.to_string()),
    }
}

/// Handle `devtrex-auth auth status`.
pub async fn handle_status(check_expiry: bool) -> Result<(), DevtrexError> {
    let service = offline_service()?;

    println!("🔐 LinkedIn Authentication Status\n");

    let signed_in = if check_expiry {
        service.is_authenticated_unexpired()
    } else {
        service.is_authenticated()
    };
    if !signed_in {
        if check_expiry && service.is_authenticated() {
            println!("  ⚠️  Token expired");
        } else {
            println!("  ❌ Not logged in");
        }
        return Ok(());
    }

    let store = service.token_store();
    match store.expires_at() {
        Ok(Some(expires)) if expires > Utc::now() => println!(
            "  ✅ Logged in (expires {})",
            expires.format("%Y-%m-%d %H:%M")
        ),
        Ok(Some(_)) => println!("  ✅ Logged in (token past its recorded expiry)"),
        Ok(None) => println!("  ✅ Logged in"),
        Err(e) => println!("  ✅ Logged in (⚠️  unreadable expiry: {e})"),
    }
    match store.refresh_token() {
        Ok(Some(_)) => println!("  🔄 Refresh token stored"),
        Ok(None) => {}
        Err(e) => println!("  ⚠️  Refresh token unreadable: {e}"),
    }

    println!("\n📌 Storage: {}", service.config().storage_dir().display());
    Ok(())
}

/// Handle `devtrex-auth auth whoami`.
pub async fn handle_whoami(json: bool) -> Result<(), DevtrexError> {
    let service = offline_service()?;

    let Some(user) = service.get_current_user().await? else {
        return Err(DevtrexError::Authentication("Not logged in".to_string()));
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("👤 {} <{}>", user.name, user.email);
        println!("   id: {}", user.id);
        if let Some(picture) = user.picture {
            println!("   picture: {picture}");
        }
    }
    Ok(())
}

/// Handle `devtrex-auth auth logout`.
pub async fn handle_logout() -> Result<(), DevtrexError> {
    let service = offline_service()?;
    service.sign_out().await?;
    println!("✅ Logged out from LinkedIn");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_failures_keep_their_hint() {
        let failure = SignInFailure {
            kind: SignInErrorKind::Configuration,
            message: "LinkedIn client ID not configured".to_string(),
        };
        let err = failure_to_error(failure);
        assert!(matches!(err, DevtrexError::Configuration(_)));
        assert!(err.recovery_hint().is_some());
    }

    #[test]
    fn other_failures_become_authentication_errors() {
        let failure = SignInFailure {
            kind: SignInErrorKind::TokenExchange,
            message: "Token exchange failed: 400".to_string(),
        };
        let err = failure_to_error(failure);
        assert!(matches!(err, DevtrexError::Authentication(ref m) if m.contains("token_exchange")));
    }
}
