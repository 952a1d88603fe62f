use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use std::path::Path;

use brokerage::{
    app::BrokerageAppConfig, auth::AuthConfig, server::ServerConfig, trade::TradeConfig,
};
use quote_client::QuoteClientConfig;

use super::{db::DbConfig, tracing::TracingConfig};

#[derive(Clone, Default, Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: BrokerageAppConfig,
    #[serde(default)]
    pub trade: TradeConfig,
    #[serde(default)]
    pub quote_client: QuoteClientConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Securities and accounts created on start when missing.
#[derive(Clone, Default, Debug, Deserialize, Serialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub securities: Vec<SeedSecurity>,
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SeedSecurity {
    pub ticker: String,
    pub company_name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SeedAccount {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub cash: Option<Decimal>,
}

pub struct EnvOverride {
    pub pg_con: String,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_path(
        path: Option<impl AsRef<Path>>,
        EnvOverride { pg_con, jwt_secret }: EnvOverride,
    ) -> anyhow::Result<Self> {
        let mut config: Config = match path {
            Some(path) => {
                let config_file =
                    std::fs::read_to_string(path).context("Couldn't read config file")?;
                serde_yaml::from_str(&config_file).context("Couldn't parse config file")?
            }
            None => Config::default(),
        };

        if !pg_con.is_empty() {
            config.db.pg_con = pg_con;
        }
        if !jwt_secret.is_empty() {
            config.auth.jwt_secret = jwt_secret;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn sections_default_when_missing() {
        let config: Config = serde_yaml::from_str(
            r#"
server:
  listen_port: 4000
trade:
  quote_timeout: 2
seed:
  securities:
    - ticker: AAPL
      company_name: Apple Inc.
  accounts:
    - username: demo
      password: demo-password
      cash: "2500.00"
"#,
        )
        .unwrap();
        assert_eq!(config.server.listen_port, 4000);
        assert_eq!(config.server.health_port, 8080);
        assert_eq!(config.trade.quote_timeout.as_secs(), 2);
        assert_eq!(config.app.opening_cash, dec!(10000.00));
        assert_eq!(config.app.suggestion_limit, 10);
        assert_eq!(config.seed.securities[0].ticker, "AAPL");
        assert_eq!(config.seed.accounts[0].password, "demo-password");
        assert_eq!(config.seed.accounts[0].cash, Some(dec!(2500.00)));
        assert!(config.db.pg_con.is_empty());
    }

    #[test]
    fn env_overrides_file() {
        let config = Config::from_path(
            None::<&str>,
            EnvOverride {
                pg_con: "postgres://localhost/papertrade".to_string(),
                jwt_secret: "secret".to_string(),
            },
        )
        .unwrap();
        assert_eq!(config.db.pg_con, "postgres://localhost/papertrade");
        assert_eq!(config.auth.jwt_secret, "secret");
    }
}
