use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use std::{fmt::Display, str::FromStr};

use super::error::QuoteClientError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl HistoryPeriod {
    pub const ALL: [HistoryPeriod; 11] = [
        HistoryPeriod::OneDay,
        HistoryPeriod::FiveDays,
        HistoryPeriod::OneMonth,
        HistoryPeriod::ThreeMonths,
        HistoryPeriod::SixMonths,
        HistoryPeriod::OneYear,
        HistoryPeriod::TwoYears,
        HistoryPeriod::FiveYears,
        HistoryPeriod::TenYears,
        HistoryPeriod::YearToDate,
        HistoryPeriod::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPeriod::OneDay => "1d",
            HistoryPeriod::FiveDays => "5d",
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::SixMonths => "6mo",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::TwoYears => "2y",
            HistoryPeriod::FiveYears => "5y",
            HistoryPeriod::TenYears => "10y",
            HistoryPeriod::YearToDate => "ytd",
            HistoryPeriod::Max => "max",
        }
    }

    /// Bar width requested from the provider for this range.
    pub fn interval(&self) -> &'static str {
        match self {
            HistoryPeriod::OneDay => "5m",
            HistoryPeriod::FiveDays => "30m",
            _ => "1d",
        }
    }
}

impl Default for HistoryPeriod {
    fn default() -> Self {
        HistoryPeriod::OneMonth
    }
}

impl Display for HistoryPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HistoryPeriod {
    type Err = QuoteClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HistoryPeriod::ALL
            .into_iter()
            .find(|period| period.as_str() == s)
            .ok_or_else(|| QuoteClientError::InvalidPeriod(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<u64>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistory {
    pub ticker: String,
    pub period: HistoryPeriod,
    pub bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub ticker: String,
    pub company_name: String,
    pub current_price: Option<Decimal>,
    pub previous_close: Option<Decimal>,
    pub day_high: Option<Decimal>,
    pub day_low: Option<Decimal>,
    pub fifty_two_week_high: Option<Decimal>,
    pub fifty_two_week_low: Option<Decimal>,
    pub volume: Option<u64>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
}
