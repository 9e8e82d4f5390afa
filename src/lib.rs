//! # gigachat
//!
//! Client for the GigaChat chat completion API with a self-renewing OAuth token.
//!
//! Constructing a [`GigaChatClient`] fetches a bearer token once and spawns a
//! background task that replaces it 30 seconds before it expires. Completion calls
//! read whatever token is current and never wait on the refresher.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gigachat::{GigaChatClient, GigaChatConfig, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GigaChatClient::new(GigaChatConfig::from_env()?).await?;
//!
//!     let response = client.send(&[Message::user("Hello!")]).await?;
//!     println!("{}", response.content().unwrap_or_default());
//!
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## TLS
//!
//! The API is served with certificates issued by the Russian Trusted Root CA. Point
//! `GIGACHAT_CA_BUNDLE` at the PEM bundle, or set `GIGACHAT_VERIFY_SSL_CERTS=false`
//! to skip verification. A fully custom `reqwest::Client` can be injected with
//! [`HttpClient::from_reqwest`] and [`GigaChatClient::with_http_client`].

pub mod auth;
pub mod client;
pub mod constants;
pub mod core;

pub use auth::{RefreshPolicy, Token, TokenStore};
pub use client::{GigaChatClient, GigaChatConfig};
pub use crate::core::{
    ChatRole, Choice, Error, HttpClient, HttpClientConfig, Message, Response, ResponseMessage,
    Result, TlsConfig, Usage,
};
