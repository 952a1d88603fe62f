use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::error::ApiError;
use crate::{app::BrokerageAppError, ledger::LedgerError, trade::TradeError};
use quote_client::HistoryPeriod;

const INTERNAL_ERROR: &str = "Internal server error.";

impl ApiError {
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Unauthenticated(_) => (
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided or are invalid.".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::App(err) => app_status_and_message(err),
        }
    }
}

fn app_status_and_message(err: &BrokerageAppError) -> (StatusCode, String) {
    use BrokerageAppError::*;
    let bad_request = |msg: String| (StatusCode::BAD_REQUEST, msg);
    match err {
        Trade(err) => trade_status_and_message(err),
        InvalidPeriod(period) => {
            let valid: Vec<_> = HistoryPeriod::ALL.iter().map(|p| p.as_str()).collect();
            bad_request(format!(
                "Invalid period '{period}'. Valid periods are: {}.",
                valid.join(", ")
            ))
        }
        InvalidTicker(ticker) => bad_request(format!("'{ticker}' is not a valid ticker.")),
        EmptyQuery => bad_request("Query parameter is required.".to_string()),
        InvalidLimit(limit) => bad_request(format!("Invalid limit {limit}.")),
        InvalidUsername(_) => bad_request("Invalid username.".to_string()),
        InvalidPassword(min) => bad_request(format!(
            "Password must be at least {min} characters long."
        )),
        InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "Invalid credentials.".to_string(),
        ),
        InvalidCompanyName => bad_request("Company name is required.".to_string()),
        QuoteUnavailable(ticker) => bad_request(format!("No data available for {ticker}.")),
        Currency(err) => bad_request(err.to_string()),
        AccountNotFound(_) => (StatusCode::NOT_FOUND, "Account not found.".to_string()),
        Ledger(LedgerError::DuplicateUsername(_)) => {
            (StatusCode::CONFLICT, "Username is already taken.".to_string())
        }
        Ledger(LedgerError::DuplicateTicker(_)) => {
            (StatusCode::CONFLICT, "Ticker is already listed.".to_string())
        }
        Ledger(_) | QuoteProvider(_) | Auth(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.to_string())
        }
    }
}

fn trade_status_and_message(err: &TradeError) -> (StatusCode, String) {
    use TradeError::*;
    match err {
        QuoteUnavailable(ticker) => (
            StatusCode::BAD_REQUEST,
            format!("Unable to fetch the current price for {ticker}."),
        ),
        InsufficientFunds { .. } => (StatusCode::BAD_REQUEST, "Insufficient balance.".to_string()),
        InsufficientShares { .. } => (
            StatusCode::BAD_REQUEST,
            "Insufficient shares to sell.".to_string(),
        ),
        HoldingNotFound(ticker) => (
            StatusCode::NOT_FOUND,
            format!("You do not own any shares of {ticker}."),
        ),
        SecurityNotFound(ticker) => (StatusCode::NOT_FOUND, format!("Stock {ticker} not found.")),
        ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AccountNotFound(_) => (StatusCode::NOT_FOUND, "Account not found.".to_string()),
        QuoteProvider(_) | Ledger(_) | TransactionBuilder(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %self, "api request failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
