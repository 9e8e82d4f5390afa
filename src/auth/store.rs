//! In-memory bearer token cache.
//!
//! The current [`Token`] lives behind an [`ArcSwap`]: a replace publishes a new
//! immutable `Arc<Token>` in one pointer swap, so a reader always sees an access
//! token together with the expiry it was issued with.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;

/// A bearer token and the absolute instant it stops being valid.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    access_token: String,
    expires_at: SystemTime,
}

impl Token {
    pub fn new(access_token: impl Into<String>, expires_at: SystemTime) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Build a token from an expiry expressed in milliseconds since the Unix epoch.
    pub fn from_epoch_millis(access_token: impl Into<String>, millis: u64) -> Self {
        Self::new(access_token, UNIX_EPOCH + Duration::from_millis(millis))
    }

    /// The token held before the first successful fetch.
    pub fn empty() -> Self {
        Self::new(String::new(), UNIX_EPOCH)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    pub fn expires_at_millis(&self) -> u64 {
        self.expires_at
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }

    /// False when the server reported no usable expiry (`expires_at == 0`).
    pub fn has_expiry(&self) -> bool {
        self.expires_at > UNIX_EPOCH
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[censored]")
            .field("expires_at_millis", &self.expires_at_millis())
            .finish()
    }
}

/// Credentials captured once at construction.
#[derive(Clone)]
pub struct CredentialContext {
    pub model: String,
    /// Base64 client credential sent as `Authorization: Basic`.
    pub credentials: String,
    /// Value of the `RqUID` header.
    pub request_id: String,
    pub scope: String,
}

impl std::fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialContext")
            .field("model", &self.model)
            .field("credentials", &"[censored]")
            .field("request_id", &self.request_id)
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug)]
pub struct TokenStore {
    token: ArcSwap<Token>,
    context: Arc<CredentialContext>,
}

impl TokenStore {
    /// Create a store holding [`Token::empty`].
    pub fn new(context: CredentialContext) -> Self {
        Self {
            token: ArcSwap::from_pointee(Token::empty()),
            context: Arc::new(context),
        }
    }

    /// Snapshot of the current token.
    pub fn current(&self) -> Arc<Token> {
        self.token.load_full()
    }

    /// The held access token. Expiry is not checked.
    pub fn current_access_token(&self) -> String {
        self.token.load().access_token.clone()
    }

    pub fn current_expiry(&self) -> SystemTime {
        self.token.load().expires_at
    }

    pub fn replace(&self, token: Token) {
        self.token.store(Arc::new(token));
    }

    pub fn model_identifier(&self) -> &str {
        &self.context.model
    }

    pub fn context(&self) -> &Arc<CredentialContext> {
        &self.context
    }
}
