mod helpers;

use rust_decimal_macros::dec;
use serial_test::serial;
use sqlx::PgPool;

use std::sync::Arc;

use brokerage::{app::*, ledger::*, quote::QuoteProvider, trade::*};
use helpers::FixedQuotes;

async fn ledger() -> anyhow::Result<PgLedger> {
    let pg_host = std::env::var("PG_HOST").unwrap_or_else(|_| "localhost".to_string());
    let pg_con = format!("postgres://papertrade:papertrade@{pg_host}:5432/papertrade");
    let ledger = PgLedger::new(PgPool::connect(&pg_con).await?);
    ledger.migrate().await?;
    Ok(ledger)
}

fn unique(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &id[..8]).to_uppercase()
}

fn app(ledger: PgLedger, quotes: Arc<FixedQuotes>) -> BrokerageApp {
    brokerage::brokerage_app(
        Arc::new(ledger),
        quotes as Arc<dyn QuoteProvider>,
        BrokerageAppConfig::default(),
        TradeConfig::default(),
    )
}

#[tokio::test]
#[serial]
#[ignore = "requires postgres (PG_HOST)"]
async fn trades_round_trip_through_postgres() -> anyhow::Result<()> {
    let ledger = ledger().await?;
    let quotes = Arc::new(FixedQuotes::new(dec!(50)));
    let app = app(ledger.clone(), Arc::clone(&quotes));
    let ticker = unique("T");
    app.list_security(&ticker, "Test Corp").await?;
    let account = app.open_account(&unique("user"), "password1", Some(dec!(1000))).await?;

    let bought = app.buy(account.id, &ticker, "10").await?;
    assert_eq!(bought.cash_balance.amount(), dec!(500.00));

    quotes.set(Some(dec!(60)));
    let err = app.sell(account.id, &ticker, "10.0001").await.unwrap_err();
    assert!(matches!(
        err,
        BrokerageAppError::Trade(TradeError::InsufficientShares { .. })
    ));

    let sold = app.sell(account.id, &ticker, "10").await?;
    assert_eq!(sold.cash_balance.amount(), dec!(1100.00));

    assert!(ledger.list_positions(account.id).await?.is_empty());
    let log = ledger.list_transactions(account.id, 10).await?;
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].total_amount.amount(), dec!(600.00));
    assert_eq!(log[1].total_amount.amount(), dec!(500.00));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
#[ignore = "requires postgres (PG_HOST)"]
async fn concurrent_sells_serialize_on_the_account_row() -> anyhow::Result<()> {
    let ledger = ledger().await?;
    let app = app(ledger.clone(), Arc::new(FixedQuotes::new(dec!(10))));
    let ticker = unique("T");
    app.list_security(&ticker, "Test Corp").await?;
    let account = app.open_account(&unique("user"), "password1", Some(dec!(1000))).await?;
    app.buy(account.id, &ticker, "10").await?;

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let app = app.clone();
            let ticker = ticker.clone();
            tokio::spawn(async move { app.sell(account.id, &ticker, "4").await })
        })
        .collect();
    let mut filled = 0;
    for handle in handles {
        if handle.await?.is_ok() {
            filled += 1;
        }
    }
    assert_eq!(filled, 2);
    let positions = ledger.list_positions(account.id).await?;
    assert_eq!(positions[0].shares_owned.amount(), dec!(2));
    let account = ledger.find_account(account.id).await?.unwrap();
    assert_eq!(account.cash.amount(), dec!(980.00));
    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires postgres (PG_HOST)"]
async fn search_is_case_insensitive_and_literal() -> anyhow::Result<()> {
    let ledger = ledger().await?;
    let app = app(ledger, Arc::new(FixedQuotes::new(dec!(1))));
    let marker = unique("Z");
    app.list_security(&marker, &format!("{marker} 100% Holdings")).await?;

    let found = app.ticker_suggestions(&marker.to_lowercase()).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].ticker.as_str(), marker);

    let res = app.list_security(&marker, "Again").await;
    assert!(matches!(
        res,
        Err(BrokerageAppError::Ledger(LedgerError::DuplicateTicker(_)))
    ));
    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires postgres (PG_HOST)"]
async fn login_reads_the_stored_hash() -> anyhow::Result<()> {
    let ledger = ledger().await?;
    let app = app(ledger, Arc::new(FixedQuotes::new(dec!(1))));
    let username = unique("user");
    let opened = app
        .open_account(&username, "password1", Some(dec!(42)))
        .await?;

    let account = app.login(&username, "password1").await?;
    assert_eq!(account.id, opened.id);
    assert_eq!(account.cash.amount(), dec!(42.00));
    assert!(matches!(
        app.login(&username, "password2").await,
        Err(BrokerageAppError::InvalidCredentials)
    ));
    Ok(())
}
