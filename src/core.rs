pub mod error;
pub mod http;
pub mod types;

pub use error::{Error, Result};
pub use http::{HttpClient, HttpClientConfig, HttpResponse, TlsConfig};
pub use types::{ChatRole, Choice, Message, Response, ResponseMessage, Usage};
