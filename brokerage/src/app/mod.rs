mod config;
mod error;

use futures::StreamExt;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use std::sync::Arc;

use quote_client::{HistoryPeriod, PriceBar, StockSummary};
use shared::health::HealthCheckTrigger;

use crate::{
    auth,
    currency::*,
    entity::*,
    ledger::LedgerStore,
    quote::QuoteProvider,
    trade::{self, TradeEngine, TradeExecution},
};
pub use config::*;
pub use error::*;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDetails {
    pub stock_details: StockSummary,
    pub historical_data: Vec<PriceBar>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPosition {
    pub ticker: Ticker,
    pub company_name: String,
    pub shares_owned: ShareQuantity,
    pub current_price: UsdAmount,
    pub market_value: UsdAmount,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub account_id: AccountId,
    pub username: Username,
    pub cash_balance: UsdAmount,
    pub holdings_value: UsdAmount,
    pub holdings: Vec<PortfolioPosition>,
}

#[derive(Clone)]
pub struct BrokerageApp {
    ledger: Arc<dyn LedgerStore>,
    quotes: Arc<dyn QuoteProvider>,
    engine: TradeEngine,
    config: BrokerageAppConfig,
}

impl BrokerageApp {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        quotes: Arc<dyn QuoteProvider>,
        engine: TradeEngine,
        config: BrokerageAppConfig,
    ) -> Self {
        Self {
            ledger,
            quotes,
            engine,
            config,
        }
    }

    /// Answers health probes by pinging the ledger store.
    pub fn spawn_health_checker(&self, mut health_check_trigger: HealthCheckTrigger) {
        let ledger = Arc::clone(&self.ledger);
        tokio::spawn(async move {
            while let Some(check) = health_check_trigger.next().await {
                let _ = check.send(ledger.ping().await.map_err(|e| e.to_string()));
            }
        });
    }

    pub async fn buy(
        &self,
        account_id: AccountId,
        ticker: &str,
        quantity: &str,
    ) -> Result<TradeExecution, BrokerageAppError> {
        let quantity = trade::parse_quantity(quantity)?;
        Ok(self.engine.buy(account_id, ticker, quantity).await?)
    }

    pub async fn sell(
        &self,
        account_id: AccountId,
        ticker: &str,
        quantity: &str,
    ) -> Result<TradeExecution, BrokerageAppError> {
        let quantity = trade::parse_quantity(quantity)?;
        Ok(self.engine.sell(account_id, ticker, quantity).await?)
    }

    #[instrument(name = "brokerage_app.stock_summary", skip(self),
        fields(error, error.level, error.message), err)]
    pub async fn stock_summary(
        &self,
        ticker: &str,
        period: Option<&str>,
    ) -> Result<StockDetails, BrokerageAppError> {
        shared::tracing::record_error(tracing::Level::WARN, || async move {
            let period = match period {
                Some(period) => period.parse::<HistoryPeriod>()?,
                None => HistoryPeriod::default(),
            };
            let ticker = parse_ticker(ticker)?;
            let (stock_details, history) = futures::try_join!(
                self.quotes.summary(ticker.as_str()),
                self.quotes.history(ticker.as_str(), period),
            )?;
            Ok(StockDetails {
                stock_details,
                historical_data: history.bars,
            })
        })
        .await
    }

    #[instrument(name = "brokerage_app.ticker_suggestions", skip(self), err)]
    pub async fn ticker_suggestions(&self, query: &str) -> Result<Vec<Security>, BrokerageAppError> {
        let query = query.trim().to_uppercase();
        if query.is_empty() {
            return Err(BrokerageAppError::EmptyQuery);
        }
        Ok(self
            .ledger
            .search_securities(&query, self.config.suggestion_limit)
            .await?)
    }

    #[instrument(name = "brokerage_app.portfolio", skip(self), err)]
    pub async fn portfolio(&self, account_id: AccountId) -> Result<Portfolio, BrokerageAppError> {
        let account = self
            .ledger
            .find_account(account_id)
            .await?
            .ok_or(BrokerageAppError::AccountNotFound(account_id))?;
        let mut holdings_value = UsdAmount::zero();
        let mut holdings = Vec::new();
        for position in self.ledger.list_positions(account_id).await? {
            let market_value = position
                .current_price
                .times(position.shares_owned)
                .unwrap_or_else(UsdAmount::zero);
            holdings_value = holdings_value
                .checked_add(market_value)
                .unwrap_or(holdings_value);
            holdings.push(PortfolioPosition {
                ticker: position.ticker,
                company_name: position.company_name,
                shares_owned: position.shares_owned,
                current_price: position.current_price,
                market_value,
            });
        }
        Ok(Portfolio {
            account_id: account.id,
            username: account.username,
            cash_balance: account.cash,
            holdings_value,
            holdings,
        })
    }

    #[instrument(name = "brokerage_app.transactions", skip(self), err)]
    pub async fn transactions(
        &self,
        account_id: AccountId,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, BrokerageAppError> {
        let limit = match limit {
            None => self.config.default_transaction_limit,
            Some(0) => return Err(BrokerageAppError::InvalidLimit(0)),
            Some(limit) => limit.min(self.config.max_transaction_limit),
        };
        Ok(self.ledger.list_transactions(account_id, limit).await?)
    }

    #[instrument(name = "brokerage_app.open_account", skip(self, password), err)]
    pub async fn open_account(
        &self,
        username: &str,
        password: &str,
        opening_cash: Option<Decimal>,
    ) -> Result<Account, BrokerageAppError> {
        let username = username.trim();
        if username.is_empty() || username.len() > 150 {
            return Err(BrokerageAppError::InvalidUsername(username.to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(BrokerageAppError::InvalidPassword(MIN_PASSWORD_LEN));
        }
        let cash = UsdAmount::try_new(opening_cash.unwrap_or(self.config.opening_cash))?;
        let password_hash = auth::hash_password(password.to_string()).await?;
        Ok(self
            .ledger
            .create_account(NewAccount::new(username, password_hash, cash))
            .await?)
    }

    /// Checks a username / password pair. Unknown users and wrong passwords
    /// are indistinguishable to the caller.
    #[instrument(name = "brokerage_app.login", skip(self, password),
        fields(error, error.level, error.message), err)]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Account, BrokerageAppError> {
        shared::tracing::record_error(tracing::Level::WARN, || async move {
            let login = self
                .ledger
                .find_login(&Username::from(username.trim()))
                .await?
                .ok_or(BrokerageAppError::InvalidCredentials)?;
            if !auth::verify_password(password.to_string(), login.password_hash).await? {
                return Err(BrokerageAppError::InvalidCredentials);
            }
            Ok(login.account)
        })
        .await
    }

    #[instrument(name = "brokerage_app.list_security", skip(self), err)]
    pub async fn list_security(
        &self,
        ticker: &str,
        company_name: &str,
    ) -> Result<Security, BrokerageAppError> {
        let ticker = parse_ticker(ticker)?;
        let company_name = company_name.trim();
        if company_name.is_empty() {
            return Err(BrokerageAppError::InvalidCompanyName);
        }
        Ok(self
            .ledger
            .create_security(NewSecurity::new(ticker, company_name))
            .await?)
    }
}

fn parse_ticker(ticker: &str) -> Result<Ticker, BrokerageAppError> {
    ticker
        .parse()
        .map_err(|_| BrokerageAppError::InvalidTicker(ticker.to_string()))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{ledger::*, quote::DummyQuotes, trade::*};

    const PASSWORD: &str = "hunter22";

    fn app(quotes: DummyQuotes) -> BrokerageApp {
        let ledger: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        let quotes: Arc<dyn QuoteProvider> = Arc::new(quotes);
        let engine = TradeEngine::new(
            Arc::clone(&ledger),
            Arc::clone(&quotes),
            TradeConfig::default(),
        );
        BrokerageApp::new(ledger, quotes, engine, BrokerageAppConfig::default())
    }

    #[tokio::test]
    async fn open_account_defaults_cash() -> anyhow::Result<()> {
        let app = app(DummyQuotes::new());
        let account = app.open_account(" carol ", PASSWORD, None).await?;
        assert_eq!(account.username.as_str(), "carol");
        assert_eq!(account.cash.amount(), dec!(10000.00));

        let err = app.open_account("carol", PASSWORD, None).await.unwrap_err();
        assert!(matches!(
            err,
            BrokerageAppError::Ledger(LedgerError::DuplicateUsername(_))
        ));
        let err = app
            .open_account("dave", PASSWORD, Some(dec!(-5)))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerageAppError::Currency(_)));
        let err = app.open_account("dave", "short", None).await.unwrap_err();
        assert!(matches!(err, BrokerageAppError::InvalidPassword(8)));
        Ok(())
    }

    #[tokio::test]
    async fn login_checks_the_password() -> anyhow::Result<()> {
        let app = app(DummyQuotes::new());
        let opened = app.open_account("judy", PASSWORD, Some(dec!(250))).await?;

        let account = app.login(" judy ", PASSWORD).await?;
        assert_eq!(account.id, opened.id);
        assert_eq!(account.cash.amount(), dec!(250.00));

        for (username, password) in [("judy", "wrong password"), ("mallory", PASSWORD)] {
            assert!(matches!(
                app.login(username, password).await,
                Err(BrokerageAppError::InvalidCredentials)
            ));
        }
        Ok(())
    }

    #[tokio::test]
    async fn suggestions_match_ticker_or_name() -> anyhow::Result<()> {
        let app = app(DummyQuotes::new());
        app.list_security("MSFT", "Microsoft Corporation").await?;
        app.list_security("AAPL", "Apple Inc.").await?;
        app.list_security("PINS", "Pinterest, Inc.").await?;
        app.list_security("APLE", "Apple Hospitality REIT").await?;

        let found: Vec<_> = app
            .ticker_suggestions(" apple ")
            .await?
            .into_iter()
            .map(|s| s.ticker.to_string())
            .collect();
        assert_eq!(found, vec!["AAPL", "APLE"]);

        let found: Vec<_> = app
            .ticker_suggestions("in")
            .await?
            .into_iter()
            .map(|s| s.ticker.to_string())
            .collect();
        assert_eq!(found, vec!["AAPL", "PINS"]);

        assert!(matches!(
            app.ticker_suggestions("   ").await,
            Err(BrokerageAppError::EmptyQuery)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn suggestions_are_capped() -> anyhow::Result<()> {
        let app = app(DummyQuotes::new());
        for i in 0..15 {
            app.list_security(&format!("T{i:02}"), "Test Holdings").await?;
        }
        assert_eq!(app.ticker_suggestions("test").await?.len(), 10);
        Ok(())
    }

    #[tokio::test]
    async fn stock_summary_checks_period() -> anyhow::Result<()> {
        let app = app(DummyQuotes::new().with_price("AAPL", dec!(189.84)));
        let details = app.stock_summary("aapl", None).await?;
        assert_eq!(details.stock_details.ticker, "AAPL");
        assert_eq!(details.historical_data.len(), 1);

        let details = app.stock_summary("AAPL", Some("ytd")).await?;
        assert_eq!(details.stock_details.current_price, Some(dec!(189.84)));

        assert!(matches!(
            app.stock_summary("AAPL", Some("2w")).await,
            Err(BrokerageAppError::InvalidPeriod(_))
        ));
        assert!(matches!(
            app.stock_summary("NOPE", None).await,
            Err(BrokerageAppError::QuoteUnavailable(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn portfolio_and_history_follow_trades() -> anyhow::Result<()> {
        let app = app(DummyQuotes::new().with_price("AAPL", dec!(50)));
        app.list_security("AAPL", "Apple Inc.").await?;
        let account = app.open_account("erin", PASSWORD, Some(dec!(1000))).await?;

        app.buy(account.id, "AAPL", "10").await?;
        app.sell(account.id, "AAPL", "2.5").await?;

        let portfolio = app.portfolio(account.id).await?;
        assert_eq!(portfolio.cash_balance.amount(), dec!(625.00));
        assert_eq!(portfolio.holdings.len(), 1);
        assert_eq!(portfolio.holdings[0].shares_owned.amount(), dec!(7.5));
        assert_eq!(portfolio.holdings[0].market_value.amount(), dec!(375.00));
        assert_eq!(portfolio.holdings_value.amount(), dec!(375.00));

        let log = app.transactions(account.id, None).await?;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].side, TradeSide::Sell);
        assert_eq!(app.transactions(account.id, Some(1)).await?.len(), 1);
        assert!(matches!(
            app.transactions(account.id, Some(0)).await,
            Err(BrokerageAppError::InvalidLimit(0))
        ));

        let err = app.buy(account.id, "AAPL", "lots").await.unwrap_err();
        assert!(matches!(
            err,
            BrokerageAppError::Trade(TradeError::ValidationError(_))
        ));
        Ok(())
    }
}
