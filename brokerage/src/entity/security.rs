use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use std::str::FromStr;

use crate::currency::UsdAmount;

shared::entity_id! { SecurityId }

#[derive(Error, Debug, PartialEq, Eq)]
#[error("InvalidTicker: '{0}'")]
pub struct InvalidTicker(pub String);

/// Upper-cased exchange symbol, e.g. `AAPL` or `BRK-B`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Ticker(String);

impl Ticker {
    pub const MAX_LEN: usize = 16;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Ticker {
    type Err = InvalidTicker;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ticker = s.trim().to_uppercase();
        let valid = !ticker.is_empty()
            && ticker.len() <= Self::MAX_LEN
            && ticker
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
        if !valid {
            return Err(InvalidTicker(s.to_string()));
        }
        Ok(Self(ticker))
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub id: SecurityId,
    pub ticker: Ticker,
    pub company_name: String,
    pub current_price: UsdAmount,
    pub price_updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct NewSecurity {
    pub(crate) id: SecurityId,
    pub(crate) ticker: Ticker,
    pub(crate) company_name: String,
}

impl NewSecurity {
    pub fn new(ticker: Ticker, company_name: impl Into<String>) -> Self {
        Self {
            id: SecurityId::new(),
            ticker,
            company_name: company_name.into(),
        }
    }
}
