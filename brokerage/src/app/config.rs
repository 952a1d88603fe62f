use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BrokerageAppConfig {
    #[serde(default = "default_opening_cash")]
    pub opening_cash: Decimal,
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    #[serde(default = "default_transaction_limit")]
    pub default_transaction_limit: usize,
    #[serde(default = "max_transaction_limit")]
    pub max_transaction_limit: usize,
}

impl Default for BrokerageAppConfig {
    fn default() -> Self {
        Self {
            opening_cash: default_opening_cash(),
            suggestion_limit: default_suggestion_limit(),
            default_transaction_limit: default_transaction_limit(),
            max_transaction_limit: max_transaction_limit(),
        }
    }
}

fn default_opening_cash() -> Decimal {
    dec!(10000.00)
}

fn default_suggestion_limit() -> usize {
    10
}

fn default_transaction_limit() -> usize {
    50
}

fn max_transaction_limit() -> usize {
    500
}
