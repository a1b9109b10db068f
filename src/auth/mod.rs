//! LinkedIn OAuth 2.0 authorization-code sign-in and token storage.

pub mod error;
pub mod exchange;
pub mod prompt;
pub mod request;
pub mod service;
pub mod store;
pub mod token;
pub mod userinfo;

pub use error::{AuthError, SignInErrorKind};
pub use exchange::TokenExchanger;
pub use prompt::{LoopbackPrompt, PastePrompt, UrlOpener};
pub use request::{
    parse_redirect, AuthRequestBuilder, AuthorizationPrompt, AuthorizationRequest,
    AuthorizationResult,
};
pub use service::{AuthService, AuthState, SignInFailure, SignInResult, SignedIn};
pub use store::{FileSecureStorage, MemoryStorage, SecureStorage, TokenStore};
pub use token::{TokenSet, UserProfile};
pub use userinfo::UserInfoFetcher;
