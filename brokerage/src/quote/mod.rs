use async_trait::async_trait;
use rust_decimal::Decimal;

use quote_client::*;

/// Source of live and historical prices.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn current_price(&self, ticker: &str) -> Result<Decimal, QuoteClientError>;
    async fn history(
        &self,
        ticker: &str,
        period: HistoryPeriod,
    ) -> Result<PriceHistory, QuoteClientError>;
    async fn summary(&self, ticker: &str) -> Result<StockSummary, QuoteClientError>;
}

#[async_trait]
impl QuoteProvider for QuoteClient {
    async fn current_price(&self, ticker: &str) -> Result<Decimal, QuoteClientError> {
        self.get_current_price(ticker).await
    }

    async fn history(
        &self,
        ticker: &str,
        period: HistoryPeriod,
    ) -> Result<PriceHistory, QuoteClientError> {
        self.get_history(ticker, period).await
    }

    async fn summary(&self, ticker: &str) -> Result<StockSummary, QuoteClientError> {
        self.get_summary(ticker).await
    }
}

#[cfg(test)]
mod dummy_impls {
    use chrono::Utc;

    use std::{collections::HashMap, sync::Mutex, time::Duration};

    use super::*;

    #[derive(Default)]
    pub struct DummyQuotes {
        prices: Mutex<HashMap<String, Decimal>>,
        delay: Option<Duration>,
    }

    impl DummyQuotes {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_price(self, ticker: &str, price: Decimal) -> Self {
            self.set_price(ticker, price);
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn set_price(&self, ticker: &str, price: Decimal) {
            self.prices
                .lock()
                .unwrap()
                .insert(ticker.to_uppercase(), price);
        }

        async fn lookup(&self, ticker: &str) -> Option<Decimal> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.prices
                .lock()
                .unwrap()
                .get(&ticker.to_uppercase())
                .copied()
        }
    }

    #[async_trait]
    impl QuoteProvider for DummyQuotes {
        async fn current_price(&self, ticker: &str) -> Result<Decimal, QuoteClientError> {
            self.lookup(ticker)
                .await
                .ok_or_else(|| QuoteClientError::NoPriceAvailable(ticker.to_string()))
        }

        async fn history(
            &self,
            ticker: &str,
            period: HistoryPeriod,
        ) -> Result<PriceHistory, QuoteClientError> {
            let price = self
                .lookup(ticker)
                .await
                .ok_or_else(|| QuoteClientError::NoHistoryAvailable(ticker.to_string()))?;
            let now = Utc::now();
            Ok(PriceHistory {
                ticker: ticker.to_uppercase(),
                period,
                bars: vec![PriceBar {
                    timestamp: now,
                    date: now.date_naive(),
                    open: Some(price),
                    high: Some(price),
                    low: Some(price),
                    close: Some(price),
                    volume: None,
                }],
            })
        }

        async fn summary(&self, ticker: &str) -> Result<StockSummary, QuoteClientError> {
            let price = self
                .lookup(ticker)
                .await
                .ok_or_else(|| QuoteClientError::UnknownTicker(ticker.to_string()))?;
            Ok(StockSummary {
                ticker: ticker.to_uppercase(),
                company_name: format!("{} Inc.", ticker.to_uppercase()),
                current_price: Some(price),
                previous_close: None,
                day_high: None,
                day_low: None,
                fifty_two_week_high: None,
                fifty_two_week_low: None,
                volume: None,
                exchange: None,
                currency: Some("USD".to_string()),
            })
        }
    }
}

#[cfg(test)]
pub use dummy_impls::*;
