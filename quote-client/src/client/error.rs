use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteClientError {
    #[error("QuoteClientError - Reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("QuoteClientError - SerdeJson: {0}")]
    Deserialization(#[from] serde_json::Error),
    #[error("QuoteClientError - UnexpectedResponse: {code:?} - {msg:?}")]
    UnexpectedResponse { msg: String, code: String },
    #[error("QuoteClientError - UnknownTicker: {0}")]
    UnknownTicker(String),
    #[error("QuoteClientError - NoPriceAvailable: {0}")]
    NoPriceAvailable(String),
    #[error("QuoteClientError - NoHistoryAvailable: {0}")]
    NoHistoryAvailable(String),
    #[error("QuoteClientError - InvalidPeriod: {0}")]
    InvalidPeriod(String),
    #[error("QuoteClientError - InvalidConfig: {0}")]
    InvalidConfig(String),
}

impl QuoteClientError {
    /// The provider had nothing usable for the ticker, or did not answer in time.
    pub fn is_unavailable(&self) -> bool {
        match self {
            QuoteClientError::UnknownTicker(_)
            | QuoteClientError::NoPriceAvailable(_)
            | QuoteClientError::NoHistoryAvailable(_) => true,
            QuoteClientError::Reqwest(e) => e.is_timeout(),
            _ => false,
        }
    }
}

impl From<(String, String)> for QuoteClientError {
    fn from((msg, code): (String, String)) -> Self {
        match code.as_str() {
            "Not Found" => QuoteClientError::UnknownTicker(msg),
            _ => QuoteClientError::UnexpectedResponse { msg, code },
        }
    }
}
