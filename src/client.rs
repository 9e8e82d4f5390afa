//! GigaChat chat completion client.
//!
//! The client owns a [`TokenManager`] whose background task keeps the bearer token
//! warm. Completion calls only read the cached token: they never wait for, or
//! trigger, a refresh. A 401 caused by an expired token is returned to the caller
//! as [`Error::UnexpectedStatus`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::auth::{CredentialContext, OAuthFetcher, RefreshPolicy, TokenManager, TokenStore};
use crate::constants::{self, env};
use crate::core::types::RequestPayload;
use crate::core::{Error, HttpClient, HttpClientConfig, Message, Response, Result, TlsConfig};

/// Everything needed to build a [`GigaChatClient`]
#[derive(Clone)]
pub struct GigaChatConfig {
    /// Base64 `client_id:client_secret` authorization key
    pub credentials: String,
    pub model: String,
    pub scope: String,
    /// `RqUID` sent with every token request
    pub request_id: String,
    pub auth_url: String,
    pub api_url: String,
    pub http_config: HttpClientConfig,
    pub refresh_policy: RefreshPolicy,
}

impl GigaChatConfig {
    pub fn new(credentials: impl Into<String>) -> Self {
        Self {
            credentials: credentials.into(),
            model: constants::DEFAULT_MODEL.to_string(),
            scope: constants::DEFAULT_SCOPE.to_string(),
            request_id: uuid::Uuid::new_v4().to_string(),
            auth_url: constants::AUTH_URL.to_string(),
            api_url: constants::API_URL.to_string(),
            http_config: HttpClientConfig::default(),
            refresh_policy: RefreshPolicy::default(),
        }
    }

    /// Read the configuration from `GIGACHAT_*` environment variables.
    ///
    /// Only `GIGACHAT_CREDENTIALS` is required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let credentials = non_empty(env::CREDENTIALS).ok_or_else(|| {
            Error::Configuration(format!("{} not set.", env::CREDENTIALS))
        })?;

        let mut config = Self::new(credentials);
        if let Some(model) = non_empty(env::MODEL) {
            config.model = model;
        }
        if let Some(scope) = non_empty(env::SCOPE) {
            config.scope = scope;
        }
        if let Some(request_id) = non_empty(env::REQUEST_ID) {
            config.request_id = request_id;
        }
        if let Some(auth_url) = non_empty(env::AUTH_URL) {
            config.auth_url = auth_url;
        }
        if let Some(api_url) = non_empty(env::API_URL) {
            config.api_url = api_url;
        }
        config.http_config.tls = TlsConfig::from_lookup(&lookup);

        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    fn credential_context(&self) -> CredentialContext {
        CredentialContext {
            model: self.model.clone(),
            credentials: self.credentials.clone(),
            request_id: self.request_id.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl std::fmt::Debug for GigaChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GigaChatConfig")
            .field("credentials", &"[censored]")
            .field("model", &self.model)
            .field("scope", &self.scope)
            .field("request_id", &self.request_id)
            .field("auth_url", &self.auth_url)
            .field("api_url", &self.api_url)
            .field("http_config", &self.http_config)
            .field("refresh_policy", &self.refresh_policy)
            .finish()
    }
}

#[derive(Debug)]
pub struct GigaChatClient {
    http: HttpClient,
    api_url: String,
    tokens: TokenManager,
    last_status: AtomicU16,
}

impl GigaChatClient {
    /// Build the transport from `config`, fetch the first token and start renewal.
    ///
    /// Only a transport configuration problem fails; a failed token fetch is logged
    /// and retried in the background.
    pub async fn new(config: GigaChatConfig) -> Result<Self> {
        let http = HttpClient::new(&config.http_config)?;
        Ok(Self::with_http_client(config, http, &CancellationToken::new()).await)
    }

    /// Like [`GigaChatClient::new`] with an injected transport.
    ///
    /// Cancelling `shutdown` stops token renewal.
    pub async fn with_http_client(
        config: GigaChatConfig,
        http: HttpClient,
        shutdown: &CancellationToken,
    ) -> Self {
        let store = Arc::new(TokenStore::new(config.credential_context()));
        let fetcher = OAuthFetcher::new(http.clone(), &config.auth_url, store.context().clone());
        let tokens = TokenManager::start(store, fetcher, config.refresh_policy, shutdown).await;

        Self {
            http,
            api_url: config.api_url,
            tokens,
            last_status: AtomicU16::new(0),
        }
    }

    /// Send one chat completion request.
    #[tracing::instrument(
        name = "chat_completion",
        skip(self, messages),
        fields(url = %self.api_url, messages = messages.len()),
        err
    )]
    pub async fn send(&self, messages: &[Message]) -> Result<Response> {
        let store = self.tokens.store();
        let payload = RequestPayload {
            model: store.model_identifier(),
            messages,
            stream: false,
            repetition_penalty: constants::REPETITION_PENALTY,
        };
        let headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
            (
                "Authorization".to_string(),
                format!("Bearer {}", store.current_access_token()),
            ),
        ];

        let response = match self.http.post_json(&self.api_url, &headers, &payload).await {
            Ok(response) => response,
            Err(e) => {
                if let Some(status) = e.status_code() {
                    self.last_status.store(status, Ordering::Relaxed);
                }
                return Err(e);
            }
        };
        self.last_status.store(response.status, Ordering::Relaxed);
        debug!(status = response.status, "Completion response received");

        if !response.is_ok() {
            return Err(Error::UnexpectedStatus {
                status: response.status,
                body: response.body,
            });
        }

        let completion: Response =
            serde_json::from_str(&response.body).map_err(|e| Error::MalformedResponse {
                message: "Failed to parse completion response".to_string(),
                status: response.status,
                source: Some(Box::new(e)),
            })?;

        if completion.choices.is_empty() {
            return Err(Error::EmptyChoices);
        }

        Ok(completion)
    }

    /// Status of the most recent response, `0` before any call reached the server.
    pub fn last_status_code(&self) -> u16 {
        self.last_status.load(Ordering::Relaxed)
    }

    pub fn token_store(&self) -> &Arc<TokenStore> {
        self.tokens.store()
    }

    /// Stop token renewal and wait for the background task to exit.
    pub async fn shutdown(self) {
        self.tokens.shutdown().await;
    }
}
