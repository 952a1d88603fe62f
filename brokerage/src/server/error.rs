use thiserror::Error;

use crate::{app::BrokerageAppError, auth::AuthError};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("ServerError - Serve: {0}")]
    Serve(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Failure of a single api request.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("ApiError - Unauthenticated: {0}")]
    Unauthenticated(#[from] AuthError),
    #[error("ApiError - BadRequest: {0}")]
    BadRequest(String),
    #[error("ApiError - App: {0}")]
    App(#[from] BrokerageAppError),
}
