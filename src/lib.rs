//! devtrex-auth: LinkedIn sign-in for devtrex.
//!
//! Runs the OAuth 2.0 authorization-code flow against LinkedIn, exchanges
//! the code for tokens, fetches the member profile from the OpenID Connect
//! user-info endpoint and keeps the tokens in local secure storage.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use devtrex_auth::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let config = LinkedInConfig::from_env();
//! let prompt = Arc::new(LoopbackPrompt::for_redirect_uri(&config.redirect_uri)?);
//! let storage = Arc::new(FileSecureStorage::new(config.storage_dir()));
//! let service = AuthService::new(config, prompt, storage)?;
//!
//! match service.sign_in_with_linkedin().await {
//!     Ok(signed_in) => println!("Signed in as {}", signed_in.user.email),
//!     Err(failure) => eprintln!("Sign-in failed: {failure}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
