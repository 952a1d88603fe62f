use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AccountId, SecurityId, Ticker};
use crate::currency::{ShareQuantity, UsdAmount};

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub account_id: AccountId,
    pub security_id: SecurityId,
    pub shares_owned: ShareQuantity,
    pub updated_at: DateTime<Utc>,
}

/// A holding joined with the security it is in.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub security_id: SecurityId,
    pub ticker: Ticker,
    pub company_name: String,
    pub shares_owned: ShareQuantity,
    pub current_price: UsdAmount,
    pub updated_at: DateTime<Utc>,
}
