#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid envelope: {0}")]
    Parse(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("send delta failed: {status}")]
    Status { status: u16 },
}

impl From<reqwest::Error> for BusError {
    fn from(value: reqwest::Error) -> Self {
        Self::Request(value.to_string())
    }
}

impl From<serde_json::Error> for BusError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value.to_string())
    }
}
