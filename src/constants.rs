pub const AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const API_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "GigaChat";
pub const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";
pub const REPETITION_PENALTY: u32 = 1;

pub mod env {
    pub const CREDENTIALS: &str = "GIGACHAT_CREDENTIALS";
    pub const SCOPE: &str = "GIGACHAT_SCOPE";
    pub const MODEL: &str = "GIGACHAT_MODEL";
    pub const REQUEST_ID: &str = "GIGACHAT_RQUID";
    pub const AUTH_URL: &str = "GIGACHAT_AUTH_URL";
    pub const API_URL: &str = "GIGACHAT_API_URL";
}
