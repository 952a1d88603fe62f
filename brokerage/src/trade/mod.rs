mod config;
mod error;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use std::{str::FromStr, sync::Arc};

use crate::{currency::*, entity::*, ledger::LedgerStore, quote::QuoteProvider};
pub use config::*;
pub use error::*;

/// Outcome of an executed trade.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeExecution {
    pub cash_balance: UsdAmount,
    pub transaction: Transaction,
}

/// Parses a quantity sent as a decimal string.
pub fn parse_quantity(raw: &str) -> Result<Decimal, TradeError> {
    Decimal::from_str(raw.trim())
        .map_err(|_| TradeError::ValidationError(format!("'{raw}' is not a valid quantity")))
}

#[derive(Clone)]
pub struct TradeEngine {
    ledger: Arc<dyn LedgerStore>,
    quotes: Arc<dyn QuoteProvider>,
    config: TradeConfig,
}

impl TradeEngine {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        quotes: Arc<dyn QuoteProvider>,
        config: TradeConfig,
    ) -> Self {
        Self {
            ledger,
            quotes,
            config,
        }
    }

    #[instrument(name = "trade_engine.buy", skip(self),
        fields(error, error.level, error.message), err)]
    pub async fn buy(
        &self,
        account_id: AccountId,
        ticker: &str,
        quantity: Decimal,
    ) -> Result<TradeExecution, TradeError> {
        shared::tracing::record_error(tracing::Level::WARN, || async move {
            let quantity = validated_quantity(quantity)?;
            let (security, price) = self.refresh_price(ticker).await?;
            let total_cost = trade_value(price, quantity)?;
            if total_cost.is_zero() {
                return Err(TradeError::ValidationError(
                    "trade value rounds to less than one cent".to_string(),
                ));
            }

            let mut tx = self.ledger.begin().await?;
            let account = tx.lock_account(account_id).await?;
            let cash = account.cash.checked_sub(total_cost).ok_or(
                TradeError::InsufficientFunds {
                    required: total_cost,
                    available: account.cash,
                },
            )?;
            let shares_owned = match tx.lock_holding(account_id, security.id).await? {
                Some(holding) => holding.shares_owned.checked_add(quantity).ok_or_else(|| {
                    TradeError::ValidationError("holding would overflow".to_string())
                })?,
                None => quantity,
            };

            tx.set_cash(account_id, cash).await?;
            tx.set_holding(account_id, security.id, shares_owned).await?;
            let transaction = tx
                .append_transaction(
                    NewTransaction::builder()
                        .account_id(account_id)
                        .security_id(security.id)
                        .ticker(security.ticker)
                        .side(TradeSide::Buy)
                        .quantity(quantity)
                        .price_per_share(price)
                        .total_amount(total_cost)
                        .build()?,
                )
                .await?;
            tx.commit().await?;

            Ok(TradeExecution {
                cash_balance: cash,
                transaction,
            })
        })
        .await
    }

    #[instrument(name = "trade_engine.sell", skip(self),
        fields(error, error.level, error.message), err)]
    pub async fn sell(
        &self,
        account_id: AccountId,
        ticker: &str,
        quantity: Decimal,
    ) -> Result<TradeExecution, TradeError> {
        shared::tracing::record_error(tracing::Level::WARN, || async move {
            let quantity = validated_quantity(quantity)?;
            let (security, price) = self.refresh_price(ticker).await?;
            let total_revenue = trade_value(price, quantity)?;

            let mut tx = self.ledger.begin().await?;
            let account = tx.lock_account(account_id).await?;
            let holding = tx
                .lock_holding(account_id, security.id)
                .await?
                .ok_or_else(|| TradeError::HoldingNotFound(security.ticker.to_string()))?;
            let remaining = holding.shares_owned.checked_sub(quantity).ok_or(
                TradeError::InsufficientShares {
                    requested: quantity,
                    owned: holding.shares_owned,
                },
            )?;
            let cash = account.cash.checked_add(total_revenue).ok_or_else(|| {
                TradeError::ValidationError("cash balance would overflow".to_string())
            })?;

            tx.set_cash(account_id, cash).await?;
            if remaining.is_zero() {
                tx.delete_holding(account_id, security.id).await?;
            } else {
                tx.set_holding(account_id, security.id, remaining).await?;
            }
            let transaction = tx
                .append_transaction(
                    NewTransaction::builder()
                        .account_id(account_id)
                        .security_id(security.id)
                        .ticker(security.ticker)
                        .side(TradeSide::Sell)
                        .quantity(quantity)
                        .price_per_share(price)
                        .total_amount(total_revenue)
                        .build()?,
                )
                .await?;
            tx.commit().await?;

            Ok(TradeExecution {
                cash_balance: cash,
                transaction,
            })
        })
        .await
    }

    /// Fetches a fresh price and caches it on the security row.
    async fn refresh_price(&self, ticker: &str) -> Result<(Security, UsdAmount), TradeError> {
        let ticker = Ticker::from_str(ticker)
            .map_err(|_| TradeError::SecurityNotFound(ticker.trim().to_string()))?;
        let security = self
            .ledger
            .find_security(&ticker)
            .await?
            .ok_or_else(|| TradeError::SecurityNotFound(ticker.to_string()))?;

        let unavailable = || TradeError::QuoteUnavailable(ticker.to_string());
        let price = match tokio::time::timeout(
            self.config.quote_timeout,
            self.quotes.current_price(ticker.as_str()),
        )
        .await
        {
            Err(_) => return Err(unavailable()),
            Ok(Err(e)) if e.is_unavailable() => return Err(unavailable()),
            Ok(res) => res?,
        };
        let price = UsdAmount::rounded(price)
            .ok()
            .filter(|price| !price.is_zero())
            .ok_or_else(unavailable)?;

        let security = self
            .ledger
            .update_security_price(security.id, price)
            .await?;
        Ok((security, price))
    }
}

fn validated_quantity(quantity: Decimal) -> Result<ShareQuantity, TradeError> {
    let quantity = ShareQuantity::try_new(quantity)?;
    if quantity.is_zero() {
        return Err(TradeError::ValidationError(
            "quantity must be positive".to_string(),
        ));
    }
    Ok(quantity)
}

/// Sales may round to $0.00 so that dust holdings can always be closed out.
fn trade_value(price: UsdAmount, quantity: ShareQuantity) -> Result<UsdAmount, TradeError> {
    price
        .times(quantity)
        .ok_or_else(|| TradeError::ValidationError("trade value overflows".to_string()))
}
