mod config;
mod convert;
mod error;

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRef, FromRequestParts, Path, Query, State,
    },
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use std::net::SocketAddr;

use crate::{
    app::*,
    auth::{AuthError, JwtAuth},
    currency::UsdAmount,
    entity::*,
    trade::TradeExecution,
};
pub use config::*;
pub use error::*;

#[derive(Clone)]
pub struct ApiState {
    app: BrokerageApp,
    auth: JwtAuth,
}

impl ApiState {
    pub fn new(app: BrokerageApp, auth: JwtAuth) -> Self {
        Self { app, auth }
    }
}

impl FromRef<ApiState> for JwtAuth {
    fn from_ref(state: &ApiState) -> Self {
        state.auth.clone()
    }
}

/// Account named by a valid `Authorization: Bearer` token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedAccount(pub AccountId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedAccount
where
    JwtAuth: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let account_id = JwtAuth::from_ref(state).verify_token(token)?;
        Ok(Self(account_id))
    }
}

#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    pub quantity: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeResponse {
    pub message: &'static str,
    pub cash_balance: UsdAmount,
    pub transaction: Transaction,
}

impl TradeResponse {
    fn new(message: &'static str, TradeExecution { cash_balance, transaction }: TradeExecution) -> Self {
        Self {
            message,
            cash_balance,
            transaction,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub username: Username,
    pub cash: UsdAmount,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<usize>,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(query)| query)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

#[instrument(name = "api.login", skip_all, err)]
async fn login(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    shared::tracing::extract_tracing_from_headers(&headers);
    let LoginRequest { username, password } = json_body(body)?;
    let account = state.app.login(&username, &password).await?;
    Ok(Json(LoginResponse {
        access: state
            .auth
            .issue_token(account.id)
            .map_err(BrokerageAppError::from)?,
        username: account.username,
        cash: account.cash,
    }))
}

#[instrument(name = "api.buy", skip_all, fields(ticker = %ticker, account_id = %account_id), err)]
async fn buy(
    State(state): State<ApiState>,
    AuthenticatedAccount(account_id): AuthenticatedAccount,
    Path(ticker): Path<String>,
    headers: HeaderMap,
    body: Result<Json<TradeRequest>, JsonRejection>,
) -> Result<Json<TradeResponse>, ApiError> {
    shared::tracing::extract_tracing_from_headers(&headers);
    let TradeRequest { quantity } = json_body(body)?;
    let execution = state.app.buy(account_id, &ticker, &quantity).await?;
    Ok(Json(TradeResponse::new(
        "Stock purchased successfully.",
        execution,
    )))
}

#[instrument(name = "api.sell", skip_all, fields(ticker = %ticker, account_id = %account_id), err)]
async fn sell(
    State(state): State<ApiState>,
    AuthenticatedAccount(account_id): AuthenticatedAccount,
    Path(ticker): Path<String>,
    headers: HeaderMap,
    body: Result<Json<TradeRequest>, JsonRejection>,
) -> Result<Json<TradeResponse>, ApiError> {
    shared::tracing::extract_tracing_from_headers(&headers);
    let TradeRequest { quantity } = json_body(body)?;
    let execution = state.app.sell(account_id, &ticker, &quantity).await?;
    Ok(Json(TradeResponse::new("Stock sold successfully.", execution)))
}

#[instrument(name = "api.stock_summary", skip_all, fields(ticker = %ticker), err)]
async fn stock_summary(
    State(state): State<ApiState>,
    Path(ticker): Path<String>,
    headers: HeaderMap,
    params: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<StockDetails>, ApiError> {
    shared::tracing::extract_tracing_from_headers(&headers);
    let SummaryQuery { period } = query(params)?;
    Ok(Json(
        state
            .app
            .stock_summary(&ticker, period.as_deref())
            .await?,
    ))
}

#[instrument(name = "api.ticker_suggestions", skip_all, err)]
async fn ticker_suggestions(
    State(state): State<ApiState>,
    headers: HeaderMap,
    params: Result<Query<SuggestionsQuery>, QueryRejection>,
) -> Result<Json<Vec<Security>>, ApiError> {
    shared::tracing::extract_tracing_from_headers(&headers);
    let SuggestionsQuery { query: q } = query(params)?;
    Ok(Json(
        state
            .app
            .ticker_suggestions(q.as_deref().unwrap_or_default())
            .await?,
    ))
}

#[instrument(name = "api.portfolio", skip_all, fields(account_id = %account_id), err)]
async fn portfolio(
    State(state): State<ApiState>,
    AuthenticatedAccount(account_id): AuthenticatedAccount,
    headers: HeaderMap,
) -> Result<Json<Portfolio>, ApiError> {
    shared::tracing::extract_tracing_from_headers(&headers);
    Ok(Json(state.app.portfolio(account_id).await?))
}

#[instrument(name = "api.transactions", skip_all, fields(account_id = %account_id), err)]
async fn transactions(
    State(state): State<ApiState>,
    AuthenticatedAccount(account_id): AuthenticatedAccount,
    headers: HeaderMap,
    params: Result<Query<TransactionsQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    shared::tracing::extract_tracing_from_headers(&headers);
    let TransactionsQuery { limit } = query(params)?;
    Ok(Json(state.app.transactions(account_id, limit).await?))
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/stocks/:ticker/buy", post(buy))
        .route("/api/stocks/:ticker/sell", post(sell))
        .route("/api/stocks/:ticker/summary", get(stock_summary))
        .route("/api/tickers", get(ticker_suggestions))
        .route("/api/portfolio", get(portfolio))
        .route("/api/transactions", get(transactions))
        .with_state(state)
}

pub async fn start(
    server_config: ServerConfig,
    app: BrokerageApp,
    auth: JwtAuth,
) -> Result<(), ServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.listen_port));
    tracing::info!(%addr, "starting brokerage api");
    axum::Server::bind(&addr)
        .serve(router(ApiState::new(app, auth)).into_make_service())
        .await
        .map_err(|e| ServerError::Serve(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use rust_decimal_macros::dec;

    use std::sync::Arc;

    use super::*;
    use crate::{auth::AuthConfig, ledger::*, quote::*, trade::*};

    const PASSWORD: &str = "frank-pw-1";

    async fn state() -> anyhow::Result<(ApiState, AccountId)> {
        let ledger: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        let quotes: Arc<dyn QuoteProvider> =
            Arc::new(DummyQuotes::new().with_price("AAPL", dec!(50)));
        let engine = TradeEngine::new(
            Arc::clone(&ledger),
            Arc::clone(&quotes),
            TradeConfig::default(),
        );
        let app = BrokerageApp::new(ledger, quotes, engine, BrokerageAppConfig::default());
        app.list_security("AAPL", "Apple Inc.").await?;
        let account = app
            .open_account("frank", PASSWORD, Some(dec!(1000)))
            .await?;
        let auth = JwtAuth::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            ..Default::default()
        })?;
        Ok((ApiState::new(app, auth), account.id))
    }

    async fn authenticate(state: &ApiState, header: Option<&str>) -> Result<AccountId, ApiError> {
        let mut request = Request::builder().uri("/api/portfolio");
        if let Some(header) = header {
            request = request.header(AUTHORIZATION, header);
        }
        let (mut parts, _) = request.body(()).expect("request").into_parts();
        AuthenticatedAccount::from_request_parts(&mut parts, state)
            .await
            .map(|AuthenticatedAccount(id)| id)
    }

    #[tokio::test]
    async fn bearer_token_identifies_account() -> anyhow::Result<()> {
        let (state, account_id) = state().await?;
        let token = state.auth.issue_token(account_id)?;
        let header = format!("Bearer {token}");
        assert_eq!(authenticate(&state, Some(&header)).await?, account_id);

        for header in [None, Some("Bearer "), Some("Basic abc"), Some("Bearer junk")] {
            let err = authenticate(&state, header).await.unwrap_err();
            assert!(matches!(err, ApiError::Unauthenticated(_)));
        }
        Ok(())
    }

    fn login_request(username: &str, password: &str) -> Result<Json<LoginRequest>, JsonRejection> {
        Ok(Json(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }))
    }

    #[tokio::test]
    async fn login_issues_a_usable_token() -> anyhow::Result<()> {
        let (state, account_id) = state().await?;

        let Json(response) = login(
            State(state.clone()),
            HeaderMap::new(),
            login_request("frank", PASSWORD),
        )
        .await?;
        assert_eq!(response.username.as_str(), "frank");
        let body = serde_json::to_value(&response)?;
        assert_eq!(body["cash"], "1000.00");

        let header = format!("Bearer {}", response.access);
        assert_eq!(authenticate(&state, Some(&header)).await?, account_id);
        Ok(())
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() -> anyhow::Result<()> {
        let (state, _) = state().await?;
        for (username, password) in [("frank", "not-the-password"), ("nobody", PASSWORD)] {
            let err = login(
                State(state.clone()),
                HeaderMap::new(),
                login_request(username, password),
            )
            .await
            .unwrap_err();
            let (status, message) = err.status_and_message();
            assert_eq!(status, axum::http::StatusCode::UNAUTHORIZED);
            assert_eq!(message, "Invalid credentials.");
        }
        Ok(())
    }

    #[tokio::test]
    async fn buy_and_sell_handlers() -> anyhow::Result<()> {
        let (state, account_id) = state().await?;

        let Json(bought) = buy(
            State(state.clone()),
            AuthenticatedAccount(account_id),
            Path("aapl".to_string()),
            HeaderMap::new(),
            Ok(Json(TradeRequest {
                quantity: "10".to_string(),
            })),
        )
        .await?;
        assert_eq!(bought.message, "Stock purchased successfully.");
        assert_eq!(bought.cash_balance.amount(), dec!(500.00));

        let body = serde_json::to_value(&bought)?;
        assert_eq!(body["cashBalance"], "500.00");
        assert_eq!(body["transaction"]["side"], "BUY");
        assert_eq!(body["transaction"]["totalAmount"], "500.00");

        let err = sell(
            State(state.clone()),
            AuthenticatedAccount(account_id),
            Path("AAPL".to_string()),
            HeaderMap::new(),
            Ok(Json(TradeRequest {
                quantity: "11".to_string(),
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_and_message().1, "Insufficient shares to sell.");

        let Json(sold) = sell(
            State(state),
            AuthenticatedAccount(account_id),
            Path("AAPL".to_string()),
            HeaderMap::new(),
            Ok(Json(TradeRequest {
                quantity: "10".to_string(),
            })),
        )
        .await?;
        assert_eq!(sold.message, "Stock sold successfully.");
        assert_eq!(sold.cash_balance.amount(), dec!(1000.00));
        Ok(())
    }
}
