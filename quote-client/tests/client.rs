use serial_test::serial;

use quote_client::*;

fn configured_client() -> anyhow::Result<QuoteClient> {
    let mut config = QuoteClientConfig::default();
    if let Ok(url) = std::env::var("QUOTE_API_URL") {
        config.api_url = url.parse()?;
    }
    Ok(QuoteClient::new(config)?)
}

#[tokio::test]
#[serial]
#[ignore = "requires access to the quote provider"]
async fn current_price() -> anyhow::Result<()> {
    let client = configured_client()?;

    let price = client.get_current_price("aapl").await?;

    assert!(!price.is_zero());
    assert!(price.is_sign_positive());

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires access to the quote provider"]
async fn history_for_one_month() -> anyhow::Result<()> {
    let client = configured_client()?;

    let history = client.get_history("MSFT", HistoryPeriod::OneMonth).await?;

    assert_eq!(history.ticker, "MSFT");
    assert!(!history.is_empty());
    assert!(history.bars.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires access to the quote provider"]
async fn summary_has_company_name() -> anyhow::Result<()> {
    let client = configured_client()?;

    let summary = client.get_summary("ibm").await?;

    assert_eq!(summary.ticker, "IBM");
    assert!(!summary.company_name.is_empty());

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires access to the quote provider"]
async fn unknown_ticker() -> anyhow::Result<()> {
    let client = configured_client()?;

    let err = client
        .get_current_price("THISISNOTATICKER")
        .await
        .unwrap_err();

    assert!(err.is_unavailable(), "unexpected error: {err}");

    Ok(())
}
