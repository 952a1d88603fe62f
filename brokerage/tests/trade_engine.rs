mod helpers;

use rust_decimal_macros::dec;

use std::sync::Arc;

use brokerage::{
    app::*,
    entity::*,
    ledger::*,
    quote::QuoteProvider,
    trade::*,
};
use helpers::FixedQuotes;

fn setup(quotes: Arc<FixedQuotes>) -> (BrokerageApp, Arc<MemoryLedger>) {
    let ledger = Arc::new(MemoryLedger::new());
    let app = brokerage::brokerage_app(
        Arc::clone(&ledger) as Arc<dyn LedgerStore>,
        quotes as Arc<dyn QuoteProvider>,
        BrokerageAppConfig::default(),
        TradeConfig::default(),
    );
    (app, ledger)
}

#[tokio::test]
async fn buy_then_liquidate() -> anyhow::Result<()> {
    let quotes = Arc::new(FixedQuotes::new(dec!(50.00)));
    let (app, ledger) = setup(Arc::clone(&quotes));
    app.list_security("IBM", "International Business Machines").await?;
    let account = app.open_account("grace", "password1", Some(dec!(1000.00))).await?;

    let bought = app.buy(account.id, "IBM", "10").await?;
    assert_eq!(bought.cash_balance.amount(), dec!(500.00));
    assert_eq!(bought.transaction.total_amount.amount(), dec!(500.00));

    quotes.set(Some(dec!(60.00)));
    let sold = app.sell(account.id, "IBM", "10").await?;
    assert_eq!(sold.cash_balance.amount(), dec!(1100.00));
    assert_eq!(sold.transaction.total_amount.amount(), dec!(600.00));

    assert!(ledger.list_positions(account.id).await?.is_empty());
    let log = ledger.list_transactions(account.id, 10).await?;
    assert_eq!(
        log.iter().map(|t| t.side).collect::<Vec<_>>(),
        vec![TradeSide::Sell, TradeSide::Buy]
    );
    Ok(())
}

#[tokio::test]
async fn provider_outage_is_a_no_op() -> anyhow::Result<()> {
    let quotes = Arc::new(FixedQuotes::new(dec!(10)));
    let (app, ledger) = setup(Arc::clone(&quotes));
    app.list_security("IBM", "International Business Machines").await?;
    let account = app.open_account("heidi", "password1", None).await?;
    app.buy(account.id, "IBM", "1").await?;

    quotes.set(None);
    let err = app.sell(account.id, "IBM", "1").await.unwrap_err();
    assert!(matches!(
        err,
        BrokerageAppError::Trade(TradeError::QuoteUnavailable(_))
    ));
    let account = ledger.find_account(account.id).await?.unwrap();
    assert_eq!(account.cash.amount(), dec!(9990.00));
    assert_eq!(ledger.list_positions(account.id).await?.len(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_buys_never_overdraw() -> anyhow::Result<()> {
    let quotes = Arc::new(FixedQuotes::new(dec!(100)));
    let (app, ledger) = setup(quotes);
    app.list_security("IBM", "International Business Machines").await?;
    let account = app.open_account("ivan", "password1", Some(dec!(1000))).await?;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.buy(account.id, "IBM", "3").await })
        })
        .collect();
    let mut filled = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => filled += 1,
            Err(BrokerageAppError::Trade(TradeError::InsufficientFunds { .. })) => (),
            Err(e) => return Err(e.into()),
        }
    }
    assert_eq!(filled, 3);
    let account = ledger.find_account(account.id).await?.unwrap();
    assert_eq!(account.cash.amount(), dec!(100.00));
    let positions = ledger.list_positions(account.id).await?;
    assert_eq!(positions[0].shares_owned.amount(), dec!(9));
    Ok(())
}
