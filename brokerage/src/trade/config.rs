use serde::{Deserialize, Serialize};

use std::time::Duration;

#[serde_with::serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TradeConfig {
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_quote_timeout")]
    pub quote_timeout: Duration,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            quote_timeout: default_quote_timeout(),
        }
    }
}

fn default_quote_timeout() -> Duration {
    Duration::from_secs(5)
}
