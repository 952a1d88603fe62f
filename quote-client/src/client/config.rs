use serde::{Deserialize, Serialize};
use url::Url;

use std::time::Duration;

#[serde_with::serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuoteClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: Url,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for QuoteClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout: default_timeout(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

fn default_api_url() -> Url {
    Url::parse("https://query1.finance.yahoo.com").unwrap()
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_requests_per_second() -> u32 {
    5
}
