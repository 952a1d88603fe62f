use thiserror::Error;

use crate::{auth::AuthError, server::ServerError};

#[derive(Error, Debug)]
pub enum BrokerageError {
    #[error("BrokerageError - Auth: {0}")]
    Auth(#[from] AuthError),
    #[error("BrokerageError - Server: {0}")]
    Server(#[from] ServerError),
}
