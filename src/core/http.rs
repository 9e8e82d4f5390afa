//! Transport shared by the token fetcher and the completion client.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::error::{Error, Result};

/// Environment variable naming an extra trusted CA bundle (PEM).
pub const CA_BUNDLE_ENV_VAR: &str = "GIGACHAT_CA_BUNDLE";
/// Environment variable that disables peer verification when set to `false` or `0`.
pub const VERIFY_SSL_ENV_VAR: &str = "GIGACHAT_VERIFY_SSL_CERTS";

/// TLS behaviour of the transport.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Extra PEM bundle added to the trusted roots.
    pub ca_bundle: Option<PathBuf>,
    /// Skip peer certificate verification entirely.
    pub accept_invalid_certs: bool,
}

impl TlsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let ca_bundle = lookup(CA_BUNDLE_ENV_VAR)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        let accept_invalid_certs = lookup(VERIFY_SSL_ENV_VAR)
            .is_some_and(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "false" | "0"));

        Self {
            ca_bundle,
            accept_invalid_certs,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub tls: TlsConfig,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            user_agent: format!("gigachat/{}", env!("CARGO_PKG_VERSION")),
            tls: TlsConfig::default(),
        }
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == reqwest::StatusCode::OK.as_u16()
    }
}

/// Thin POST-only wrapper around a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Build a client honouring the timeout, user agent and TLS settings.
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str());

        if let Some(path) = &config.tls.ca_bundle {
            let pem = std::fs::read(path).map_err(|e| {
                Error::Configuration(format!(
                    "Failed to read CA bundle {}: {e}",
                    path.display()
                ))
            })?;
            let certificates = reqwest::Certificate::from_pem_bundle(&pem)
                .map_err(|e| Error::Configuration(format!("Invalid CA bundle: {e}")))?;
            if certificates.is_empty() {
                return Err(Error::Configuration(format!(
                    "Invalid CA bundle: no certificates in {}",
                    path.display()
                )));
            }
            debug!(path = %path.display(), count = certificates.len(), "Loaded extra CA bundle");
            for certificate in certificates {
                builder = builder.add_root_certificate(certificate);
            }
        }

        if config.tls.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build reqwest client: {e}")))?;

        Ok(Self { client })
    }

    /// Use a caller-built client as is.
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POST an `application/x-www-form-urlencoded` body.
    pub async fn post_form<F>(
        &self,
        url: &str,
        headers: &[(String, String)],
        form: &F,
    ) -> Result<HttpResponse>
    where
        F: Serialize + ?Sized,
    {
        let request = with_headers(self.client.post(url), headers).form(form);
        execute(request).await
    }

    /// POST a JSON body.
    pub async fn post_json<B>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &B,
    ) -> Result<HttpResponse>
    where
        B: Serialize + ?Sized,
    {
        let request = with_headers(self.client.post(url), headers).json(body);
        execute(request).await
    }
}

fn with_headers(
    mut request: reqwest::RequestBuilder,
    headers: &[(String, String)],
) -> reqwest::RequestBuilder {
    for (name, value) in headers {
        request = request.header(name, value);
    }
    request
}

async fn execute(request: reqwest::RequestBuilder) -> Result<HttpResponse> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::transport("Failed to send request", e))?;

    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| Error::body_read(status, e))?;

    Ok(HttpResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn with_ca_bundle(path: PathBuf) -> HttpClientConfig {
        HttpClientConfig {
            tls: TlsConfig {
                ca_bundle: Some(path),
                accept_invalid_certs: false,
            },
            ..HttpClientConfig::default()
        }
    }

    #[test]
    fn default_config_has_no_tls_overrides() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("gigachat/"));
        assert!(config.tls.ca_bundle.is_none());
        assert!(!config.tls.accept_invalid_certs);
    }

    #[test]
    fn tls_settings_read_from_environment() {
        let tls = TlsConfig::from_lookup(|key| match key {
            CA_BUNDLE_ENV_VAR => Some("/etc/ssl/russian_trusted_root_ca.pem".to_string()),
            VERIFY_SSL_ENV_VAR => Some("False".to_string()),
            _ => None,
        });
        assert_eq!(
            tls.ca_bundle,
            Some(PathBuf::from("/etc/ssl/russian_trusted_root_ca.pem"))
        );
        assert!(tls.accept_invalid_certs);

        let tls = TlsConfig::from_lookup(|key| match key {
            VERIFY_SSL_ENV_VAR => Some("true".to_string()),
            _ => None,
        });
        assert!(tls.ca_bundle.is_none());
        assert!(!tls.accept_invalid_certs);
    }

    #[test]
    fn missing_ca_bundle_is_a_configuration_error() {
        let config = with_ca_bundle(PathBuf::from("/definitely/not/here.pem"));

        match HttpClient::new(&config) {
            Err(Error::Configuration(message)) => assert!(message.contains("CA bundle")),
            other => panic!("Expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn valid_ca_bundle_is_loaded() {
        let pem = include_str!("../../tests/fixtures/test_root_ca.pem");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(pem.as_bytes()).unwrap();

        let client = HttpClient::new(&with_ca_bundle(file.path().to_path_buf()));
        assert!(client.is_ok(), "got {client:?}");
    }

    #[test]
    fn non_pem_ca_bundle_is_a_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a certificate\n").unwrap();

        match HttpClient::new(&with_ca_bundle(file.path().to_path_buf())) {
            Err(Error::Configuration(message)) => {
                assert!(message.starts_with("Invalid CA bundle"), "got {message}")
            }
            other => panic!("Expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn insecure_client_builds() {
        let config = HttpClientConfig {
            tls: TlsConfig {
                ca_bundle: None,
                accept_invalid_certs: true,
            },
            ..HttpClientConfig::default()
        };
        assert!(HttpClient::new(&config).is_ok());
    }

    #[test]
    fn only_200_is_ok() {
        let ok = HttpResponse {
            status: 200,
            body: String::new(),
        };
        let created = HttpResponse {
            status: 201,
            body: String::new(),
        };
        assert!(ok.is_ok());
        assert!(!created.is_ok());
    }
}
