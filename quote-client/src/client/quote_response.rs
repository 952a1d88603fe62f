use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::primitives::*;

#[derive(Deserialize, Debug)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Deserialize, Debug)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartData>>,
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct ChartData {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: Option<String>,
    pub currency: Option<String>,
    pub exchange_name: Option<String>,
    pub full_exchange_name: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub regular_market_price: Option<Decimal>,
    pub previous_close: Option<Decimal>,
    pub chart_previous_close: Option<Decimal>,
    pub regular_market_day_high: Option<Decimal>,
    pub regular_market_day_low: Option<Decimal>,
    pub fifty_two_week_high: Option<Decimal>,
    pub fifty_two_week_low: Option<Decimal>,
    pub regular_market_volume: Option<u64>,
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Deserialize, Debug, Default)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
}

#[derive(Deserialize, Debug, Default)]
pub struct QuoteIndicator {
    #[serde(default)]
    pub open: Vec<Option<Decimal>>,
    #[serde(default)]
    pub high: Vec<Option<Decimal>>,
    #[serde(default)]
    pub low: Vec<Option<Decimal>>,
    #[serde(default)]
    pub close: Vec<Option<Decimal>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

impl ChartMeta {
    /// Live price, falling back to the last close when the market is shut.
    pub fn current_price(&self) -> Option<Decimal> {
        [
            self.regular_market_price,
            self.previous_close,
            self.chart_previous_close,
        ]
        .into_iter()
        .flatten()
        .find(|price| price.is_sign_positive() && !price.is_zero())
    }

    pub fn company_name(&self) -> Option<String> {
        self.short_name
            .as_ref()
            .or(self.long_name.as_ref())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }
}

impl ChartData {
    pub fn into_bars(self) -> Vec<PriceBar> {
        let offset = self.meta.gmtoffset;
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();
        self.timestamp
            .into_iter()
            .enumerate()
            .filter_map(|(idx, ts)| {
                let timestamp = Utc.timestamp_opt(ts, 0).single()?;
                let date = Utc.timestamp_opt(ts + offset, 0).single()?.date_naive();
                Some(PriceBar {
                    timestamp,
                    date,
                    open: value_at(&quote.open, idx),
                    high: value_at(&quote.high, idx),
                    low: value_at(&quote.low, idx),
                    close: value_at(&quote.close, idx),
                    volume: value_at(&quote.volume, idx),
                })
            })
            .collect()
    }
}

fn value_at<T: Copy>(values: &[Option<T>], idx: usize) -> Option<T> {
    values.get(idx).copied().flatten()
}
