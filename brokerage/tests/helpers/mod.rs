use async_trait::async_trait;
use rust_decimal::Decimal;

use std::sync::Mutex;

use brokerage::quote::QuoteProvider;
use quote_client::*;

/// Quotes every ticker at one settable price.
pub struct FixedQuotes(Mutex<Option<Decimal>>);

impl FixedQuotes {
    pub fn new(price: Decimal) -> Self {
        Self(Mutex::new(Some(price)))
    }

    pub fn set(&self, price: Option<Decimal>) {
        *self.0.lock().unwrap() = price;
    }

    fn price(&self, ticker: &str) -> Result<Decimal, QuoteClientError> {
        self.0
            .lock()
            .unwrap()
            .ok_or_else(|| QuoteClientError::NoPriceAvailable(ticker.to_string()))
    }
}

#[async_trait]
impl QuoteProvider for FixedQuotes {
    async fn current_price(&self, ticker: &str) -> Result<Decimal, QuoteClientError> {
        self.price(ticker)
    }

    async fn history(
        &self,
        ticker: &str,
        _period: HistoryPeriod,
    ) -> Result<PriceHistory, QuoteClientError> {
        Err(QuoteClientError::NoHistoryAvailable(ticker.to_string()))
    }

    async fn summary(&self, ticker: &str) -> Result<StockSummary, QuoteClientError> {
        Err(QuoteClientError::UnknownTicker(ticker.to_string()))
    }
}
