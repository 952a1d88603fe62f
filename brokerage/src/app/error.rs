use thiserror::Error;

use crate::{
    auth::AuthError, currency::CurrencyError, entity::AccountId, ledger::LedgerError,
    trade::TradeError,
};
use quote_client::QuoteClientError;

#[derive(Error, Debug)]
pub enum BrokerageAppError {
    #[error("BrokerageAppError - InvalidPeriod: {0}")]
    InvalidPeriod(String),
    #[error("BrokerageAppError - InvalidTicker: '{0}'")]
    InvalidTicker(String),
    #[error("BrokerageAppError - EmptyQuery")]
    EmptyQuery,
    #[error("BrokerageAppError - InvalidLimit: {0}")]
    InvalidLimit(usize),
    #[error("BrokerageAppError - InvalidUsername: '{0}'")]
    InvalidUsername(String),
    #[error("BrokerageAppError - InvalidPassword: shorter than {0} characters")]
    InvalidPassword(usize),
    #[error("BrokerageAppError - InvalidCredentials")]
    InvalidCredentials,
    #[error("BrokerageAppError - InvalidCompanyName")]
    InvalidCompanyName,
    #[error("BrokerageAppError - AccountNotFound: {0}")]
    AccountNotFound(AccountId),
    #[error("BrokerageAppError - QuoteUnavailable: {0}")]
    QuoteUnavailable(String),
    #[error("BrokerageAppError - Currency: {0}")]
    Currency(#[from] CurrencyError),
    #[error("BrokerageAppError - Auth: {0}")]
    Auth(#[from] AuthError),
    #[error("BrokerageAppError - Trade: {0}")]
    Trade(#[from] TradeError),
    #[error("BrokerageAppError - Ledger: {0}")]
    Ledger(#[from] LedgerError),
    #[error("BrokerageAppError - QuoteProvider: {0}")]
    QuoteProvider(QuoteClientError),
}

impl From<QuoteClientError> for BrokerageAppError {
    fn from(err: QuoteClientError) -> Self {
        match err {
            QuoteClientError::InvalidPeriod(period) => BrokerageAppError::InvalidPeriod(period),
            QuoteClientError::UnknownTicker(ticker)
            | QuoteClientError::NoPriceAvailable(ticker)
            | QuoteClientError::NoHistoryAvailable(ticker) => {
                BrokerageAppError::QuoteUnavailable(ticker)
            }
            err if err.is_unavailable() => BrokerageAppError::QuoteUnavailable(err.to_string()),
            err => BrokerageAppError::QuoteProvider(err),
        }
    }
}
