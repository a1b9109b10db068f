//! Convenience re-exports for common use.

pub use crate::auth::{
    AuthError, AuthService, AuthState, AuthorizationPrompt, FileSecureStorage, LoopbackPrompt,
    PastePrompt, SecureStorage, SignInErrorKind, SignInFailure, SignedIn, TokenSet, TokenStore,
    UserProfile,
};
pub use crate::config::LinkedInConfig;
pub use crate::error::{DevtrexError, Result};
