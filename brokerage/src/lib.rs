#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

pub mod app;
pub mod auth;
pub mod currency;
pub mod entity;
mod error;
pub mod ledger;
pub mod quote;
pub mod server;
pub mod trade;

use std::sync::Arc;

use shared::health::HealthCheckTrigger;

use app::{BrokerageApp, BrokerageAppConfig};
use auth::{AuthConfig, JwtAuth};
pub use error::*;
use ledger::LedgerStore;
use quote::QuoteProvider;
use server::ServerConfig;
use trade::{TradeConfig, TradeEngine};

/// Wires the trade engine and read side over the given collaborators.
pub fn brokerage_app(
    ledger: Arc<dyn LedgerStore>,
    quotes: Arc<dyn QuoteProvider>,
    app_config: BrokerageAppConfig,
    trade_config: TradeConfig,
) -> BrokerageApp {
    let engine = TradeEngine::new(Arc::clone(&ledger), Arc::clone(&quotes), trade_config);
    BrokerageApp::new(ledger, quotes, engine, app_config)
}

pub async fn run(
    health_check_trigger: HealthCheckTrigger,
    server_config: ServerConfig,
    app_config: BrokerageAppConfig,
    trade_config: TradeConfig,
    auth_config: AuthConfig,
    ledger: Arc<dyn LedgerStore>,
    quotes: Arc<dyn QuoteProvider>,
) -> Result<(), BrokerageError> {
    let auth = JwtAuth::new(&auth_config)?;
    let app = brokerage_app(ledger, quotes, app_config, trade_config);
    app.spawn_health_checker(health_check_trigger);

    server::start(server_config, app, auth).await?;

    Ok(())
}
