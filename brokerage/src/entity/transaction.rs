use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::Serialize;

use super::{AccountId, SecurityId, Ticker};
use crate::currency::{ShareQuantity, UsdAmount};

shared::entity_id! { TransactionId }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, sqlx::Type)]
#[sqlx(type_name = "trade_side", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Completed trade. Rows are append-only.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub security_id: SecurityId,
    pub ticker: Ticker,
    pub side: TradeSide,
    pub quantity: ShareQuantity,
    pub price_per_share: UsdAmount,
    pub total_amount: UsdAmount,
    pub created_at: DateTime<Utc>,
}

#[derive(Builder, Clone, Debug)]
pub struct NewTransaction {
    #[builder(private)]
    pub(crate) id: TransactionId,
    pub(crate) account_id: AccountId,
    pub(crate) security_id: SecurityId,
    pub(crate) ticker: Ticker,
    pub(crate) side: TradeSide,
    pub(crate) quantity: ShareQuantity,
    pub(crate) price_per_share: UsdAmount,
    pub(crate) total_amount: UsdAmount,
}

impl NewTransaction {
    pub fn builder() -> NewTransactionBuilder {
        let mut builder = NewTransactionBuilder::default();
        builder.id(TransactionId::new());
        builder
    }

    pub(crate) fn into_transaction(self, created_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id: self.id,
            account_id: self.account_id,
            security_id: self.security_id,
            ticker: self.ticker,
            side: self.side,
            quantity: self.quantity,
            price_per_share: self.price_per_share,
            total_amount: self.total_amount,
            created_at,
        }
    }
}
