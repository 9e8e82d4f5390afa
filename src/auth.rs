//! Token acquisition and renewal.

pub mod fetcher;
pub mod refresher;
pub mod store;

pub use fetcher::{OAuthFetcher, TokenFetcher};
pub use refresher::{RefreshPolicy, TokenManager};
pub use store::{CredentialContext, Token, TokenStore};
