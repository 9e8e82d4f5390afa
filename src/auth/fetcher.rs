use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::store::{CredentialContext, Token};
use crate::core::{Error, HttpClient, Result};

/// Source of fresh tokens for the refresher.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Token>;
}

/// Fetches tokens from the OAuth endpoint with the client credential.
#[derive(Debug, Clone)]
pub struct OAuthFetcher {
    http: HttpClient,
    auth_url: String,
    context: Arc<CredentialContext>,
}

impl OAuthFetcher {
    pub fn new(
        http: HttpClient,
        auth_url: impl Into<String>,
        context: Arc<CredentialContext>,
    ) -> Self {
        Self {
            http,
            auth_url: auth_url.into(),
            context,
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            (
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ),
            ("Accept".to_string(), "application/json".to_string()),
            ("RqUID".to_string(), self.context.request_id.clone()),
            (
                "Authorization".to_string(),
                format!("Basic {}", self.context.credentials),
            ),
        ]
    }
}

#[async_trait]
impl TokenFetcher for OAuthFetcher {
    #[tracing::instrument(
        name = "fetch_token",
        skip(self),
        fields(url = %self.auth_url, scope = %self.context.scope),
        err
    )]
    async fn fetch(&self) -> Result<Token> {
        let form = [("scope", self.context.scope.as_str())];
        let response = self
            .http
            .post_form(&self.auth_url, &self.headers(), &form)
            .await?;

        if !response.is_ok() {
            return Err(Error::UnexpectedStatus {
                status: response.status,
                body: response.body,
            });
        }

        parse_token(&response.body, response.status)
    }
}

/// Decode `{"access_token": "...", "expires_at": <epoch millis>}`.
pub(crate) fn parse_token(body: &str, status: u16) -> Result<Token> {
    let value: Value = serde_json::from_str(body).map_err(|e| Error::MalformedResponse {
        message: "Token response is not valid JSON".to_string(),
        status,
        source: Some(Box::new(e)),
    })?;

    let access_token = value
        .get("access_token")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::malformed("access_token is missing or not a string", status))?;

    let expires_at = value
        .get("expires_at")
        .and_then(Value::as_f64)
        .filter(|millis| millis.is_finite() && *millis >= 0.0)
        .ok_or_else(|| {
            Error::malformed("expires_at is missing or not a non-negative number", status)
        })?;

    Ok(Token::from_epoch_millis(access_token, expires_at as u64))
}
