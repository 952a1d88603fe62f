use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use brokerage::{
    app::{BrokerageApp, BrokerageAppError},
    auth::JwtAuth,
    entity::AccountId,
    ledger::{LedgerError, LedgerStore},
    quote::QuoteProvider,
};
use quote_client::{HistoryPeriod, QuoteClient};

use super::{config::*, db};

#[derive(Parser)]
#[clap(version, long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[clap(short, long, env = "PAPERTRADE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Connection string for the papertrade database
    #[clap(long, env = "PG_CON", default_value = "", hide_env_values = true)]
    pg_con: String,

    /// Secret used to sign bearer tokens
    #[clap(long, env = "JWT_SECRET", default_value = "", hide_env_values = true)]
    jwt_secret: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs the api server and the health server
    Run {
        /// Output config on crash
        #[clap(env = "CRASH_REPORT_CONFIG")]
        crash_report_config: Option<bool>,
    },
    /// Opens an account and prints its id
    OpenAccount {
        username: String,
        /// Password the account logs in with
        #[clap(long, env = "ACCOUNT_PASSWORD", hide_env_values = true)]
        password: String,
        /// Opening cash balance (defaults to app.opening_cash)
        #[clap(long)]
        cash: Option<Decimal>,
    },
    /// Makes a security tradable
    ListSecurity { ticker: String, company_name: String },
    /// Prints a bearer token for an account
    Token { account_id: AccountId },
    /// Prints a stock summary from the quote provider
    Quote {
        ticker: String,
        #[clap(short, long)]
        period: Option<HistoryPeriod>,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_path(
        cli.config,
        EnvOverride {
            pg_con: cli.pg_con,
            jwt_secret: cli.jwt_secret,
        },
    )?;

    match cli.command {
        Command::Run {
            crash_report_config,
        } => match (run_cmd(config.clone()).await, crash_report_config) {
            (Err(e), Some(true)) => {
                println!("Papertrade was started with the following config:");
                println!("{}", serde_yaml::to_string(&config)?);
                return Err(e);
            }
            (Err(e), _) => return Err(e),
            _ => (),
        },
        Command::OpenAccount {
            username,
            password,
            cash,
        } => {
            let app = operator_app(&config).await?;
            let account = app.open_account(&username, &password, cash).await?;
            println!("{}", account.id);
        }
        Command::ListSecurity {
            ticker,
            company_name,
        } => {
            let app = operator_app(&config).await?;
            let security = app.list_security(&ticker, &company_name).await?;
            println!("{} - {}", security.ticker, security.company_name);
        }
        Command::Token { account_id } => {
            let auth = JwtAuth::new(&config.auth)?;
            println!("{}", auth.issue_token(account_id)?);
        }
        Command::Quote { ticker, period } => {
            let client = QuoteClient::new(config.quote_client)?;
            let summary = client.get_summary(&ticker).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if let Some(period) = period {
                let history = client.get_history(&ticker, period).await?;
                println!("{}", serde_json::to_string_pretty(&history)?);
            }
        }
    }
    Ok(())
}

async fn run_cmd(
    Config {
        db,
        server,
        app,
        trade,
        quote_client,
        auth,
        tracing,
        seed,
    }: Config,
) -> anyhow::Result<()> {
    println!("Papertrade - v{}", env!("CARGO_PKG_VERSION"));
    println!("Starting server process");
    crate::tracing::init_tracer(tracing)?;

    let ledger = db::init_ledger(&db).await?;
    let quotes: Arc<dyn QuoteProvider> = Arc::new(QuoteClient::new(quote_client)?);
    let jwt = JwtAuth::new(&auth)?;
    seed_ledger(
        &brokerage::brokerage_app(
            Arc::clone(&ledger),
            Arc::clone(&quotes),
            app.clone(),
            trade.clone(),
        ),
        &jwt,
        seed,
    )
    .await?;

    let (send, mut receive) = tokio::sync::mpsc::channel(1);
    let mut handles = Vec::new();
    let mut checkers = HashMap::new();

    println!("Starting brokerage api on port {}", server.listen_port);
    let brokerage_send = send.clone();
    let (snd, recv) = shared::health::health_check_channel();
    checkers.insert("brokerage", snd);
    let health_port = server.health_port;
    handles.push(tokio::spawn(async move {
        let _ = brokerage_send.try_send(
            brokerage::run(recv, server, app, trade, auth, ledger, quotes)
                .await
                .context("Brokerage error"),
        );
    }));

    handles.push(tokio::spawn(async move {
        let _ = send.try_send(crate::health::run(health_port, checkers).await);
    }));
    let reason = receive
        .recv()
        .await
        .context("All processes exited without a reason")?;
    for handle in handles {
        handle.abort();
    }
    reason
}

async fn operator_app(config: &Config) -> anyhow::Result<BrokerageApp> {
    let ledger: Arc<dyn LedgerStore> = Arc::new(db::init_pg_ledger(&config.db).await?);
    let quotes: Arc<dyn QuoteProvider> =
        Arc::new(QuoteClient::new(config.quote_client.clone())?);
    Ok(brokerage::brokerage_app(
        ledger,
        quotes,
        config.app.clone(),
        config.trade.clone(),
    ))
}

async fn seed_ledger(app: &BrokerageApp, auth: &JwtAuth, seed: SeedConfig) -> anyhow::Result<()> {
    for SeedSecurity {
        ticker,
        company_name,
    } in seed.securities
    {
        match app.list_security(&ticker, &company_name).await {
            Ok(_) | Err(BrokerageAppError::Ledger(LedgerError::DuplicateTicker(_))) => (),
            Err(e) => return Err(e).context("Couldn't seed security"),
        }
    }
    for SeedAccount {
        username,
        password,
        cash,
    } in seed.accounts
    {
        match app.open_account(&username, &password, cash).await {
            Ok(account) => {
                println!(
                    "Seeded account {} ({}) token: {}",
                    account.username,
                    account.id,
                    auth.issue_token(account.id)?
                );
            }
            Err(BrokerageAppError::Ledger(LedgerError::DuplicateUsername(_))) => (),
            Err(e) => return Err(e).context("Couldn't seed account"),
        }
    }
    Ok(())
}
