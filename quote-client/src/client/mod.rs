mod config;
mod error;
mod primitives;
mod quote_response;

use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Jitter, Quota, RateLimiter,
};
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use rust_decimal::Decimal;
use tracing::instrument;
use url::Url;

use std::{num::NonZeroU32, sync::Arc, time::Duration};

pub use config::*;
pub use error::*;
pub use primitives::*;
use quote_response::*;

const CHART_PATH: [&str; 3] = ["v8", "finance", "chart"];

type Limiter = RateLimiter<&'static str, DefaultKeyedStateStore<&'static str>, DefaultClock>;

#[derive(Clone)]
pub struct QuoteClient {
    client: ReqwestClient,
    config: QuoteClientConfig,
    limiter: Arc<Limiter>,
}

impl QuoteClient {
    pub fn new(config: QuoteClientConfig) -> Result<Self, QuoteClientError> {
        let per_second = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            QuoteClientError::InvalidConfig("requests_per_second must be positive".to_string())
        })?;
        let client = ReqwestClient::builder()
            .use_rustls_tls()
            .timeout(config.timeout)
            .user_agent(concat!("papertrade/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            limiter: Arc::new(RateLimiter::keyed(Quota::per_second(per_second))),
            config,
        })
    }

    async fn rate_limit_client(&self, key: &'static str) -> &ReqwestClient {
        let jitter = Jitter::new(Duration::from_millis(0), Duration::from_millis(100));
        self.limiter.until_key_ready_with_jitter(&key, jitter).await;
        &self.client
    }

    #[instrument(name = "quote_client.get_current_price", skip(self), err)]
    pub async fn get_current_price(&self, ticker: &str) -> Result<Decimal, QuoteClientError> {
        let ticker = normalize(ticker);
        let data = self.chart(&ticker, "1d", "1d").await?;
        data.meta
            .current_price()
            .ok_or(QuoteClientError::NoPriceAvailable(ticker))
    }

    #[instrument(name = "quote_client.get_history", skip(self), err)]
    pub async fn get_history(
        &self,
        ticker: &str,
        period: HistoryPeriod,
    ) -> Result<PriceHistory, QuoteClientError> {
        let ticker = normalize(ticker);
        let data = self
            .chart(&ticker, period.as_str(), period.interval())
            .await?;
        let bars = data.into_bars();
        if bars.is_empty() {
            return Err(QuoteClientError::NoHistoryAvailable(ticker));
        }
        Ok(PriceHistory {
            ticker,
            period,
            bars,
        })
    }

    #[instrument(name = "quote_client.get_summary", skip(self), err)]
    pub async fn get_summary(&self, ticker: &str) -> Result<StockSummary, QuoteClientError> {
        let ticker = normalize(ticker);
        let ChartData { meta, .. } = self.chart(&ticker, "1d", "1d").await?;
        let company_name = meta
            .company_name()
            .ok_or_else(|| QuoteClientError::UnknownTicker(ticker.clone()))?;
        Ok(StockSummary {
            company_name,
            current_price: meta.current_price(),
            previous_close: meta.previous_close.or(meta.chart_previous_close),
            day_high: meta.regular_market_day_high,
            day_low: meta.regular_market_day_low,
            fifty_two_week_high: meta.fifty_two_week_high,
            fifty_two_week_low: meta.fifty_two_week_low,
            volume: meta.regular_market_volume,
            exchange: meta.full_exchange_name.or(meta.exchange_name),
            currency: meta.currency,
            ticker: meta.symbol.unwrap_or(ticker),
        })
    }

    async fn chart(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<ChartData, QuoteClientError> {
        let response = self
            .rate_limit_client("/chart")
            .await
            .get(self.url_for_chart(ticker)?)
            .query(&[("range", range), ("interval", interval)])
            .send()
            .await?;

        let ChartResponse { chart } = Self::extract_response_data(response).await?;
        if let Some(ChartError { code, description }) = chart.error {
            return Err(QuoteClientError::from((description, code)));
        }
        chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| QuoteClientError::UnknownTicker(ticker.to_string()))
    }

    async fn extract_response_data<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, QuoteClientError> {
        match response.status() {
            StatusCode::OK => {
                let response_text = response.text().await?;
                Ok(serde_json::from_str::<T>(&response_text)?)
            }
            status => {
                let response_text = response.text().await?;
                match serde_json::from_str::<ChartResponse>(&response_text) {
                    Ok(ChartResponse {
                        chart:
                            ChartEnvelope {
                                error: Some(ChartError { code, description }),
                                ..
                            },
                    }) => Err(QuoteClientError::from((description, code))),
                    _ => Err(QuoteClientError::UnexpectedResponse {
                        msg: response_text,
                        code: status.as_u16().to_string(),
                    }),
                }
            }
        }
    }

    fn url_for_chart(&self, ticker: &str) -> Result<Url, QuoteClientError> {
        let mut url = self.config.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                QuoteClientError::InvalidConfig(format!("bad api_url: {}", self.config.api_url))
            })?
            .pop_if_empty()
            .extend(CHART_PATH.iter().copied().chain(std::iter::once(ticker)));
        Ok(url)
    }
}

fn normalize(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}
