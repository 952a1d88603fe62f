use thiserror::Error;

use crate::{
    currency::*,
    entity::{AccountId, NewTransactionBuilderError},
    ledger::LedgerError,
};
use quote_client::QuoteClientError;

#[derive(Error, Debug)]
pub enum TradeError {
    #[error("TradeError - QuoteUnavailable: no usable price for {0}")]
    QuoteUnavailable(String),
    #[error("TradeError - InsufficientFunds: {required} required, {available} available")]
    InsufficientFunds {
        required: UsdAmount,
        available: UsdAmount,
    },
    #[error("TradeError - InsufficientShares: {requested} requested, {owned} owned")]
    InsufficientShares {
        requested: ShareQuantity,
        owned: ShareQuantity,
    },
    #[error("TradeError - HoldingNotFound: no shares of {0}")]
    HoldingNotFound(String),
    #[error("TradeError - SecurityNotFound: {0}")]
    SecurityNotFound(String),
    #[error("TradeError - ValidationError: {0}")]
    ValidationError(String),
    #[error("TradeError - AccountNotFound: {0}")]
    AccountNotFound(AccountId),
    #[error("TradeError - QuoteProvider: {0}")]
    QuoteProvider(#[from] QuoteClientError),
    #[error("TradeError - Ledger: {0}")]
    Ledger(LedgerError),
    #[error("TradeError - TransactionBuilder: {0}")]
    TransactionBuilder(#[from] NewTransactionBuilderError),
}

impl From<LedgerError> for TradeError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound(id) => TradeError::AccountNotFound(id),
            err => TradeError::Ledger(err),
        }
    }
}

impl From<CurrencyError> for TradeError {
    fn from(err: CurrencyError) -> Self {
        match err {
            CurrencyError::Malformed(raw) => {
                TradeError::ValidationError(format!("'{raw}' is not a valid quantity"))
            }
            CurrencyError::TooPrecise(_, places) => TradeError::ValidationError(format!(
                "quantity supports at most {places} decimal places"
            )),
            CurrencyError::Negative(_) => {
                TradeError::ValidationError("quantity must be positive".to_string())
            }
        }
    }
}
