use thiserror::Error;

use crate::entity::AccountId;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("LedgerError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("LedgerError - Migrate: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("LedgerError - AccountNotFound: {0}")]
    AccountNotFound(AccountId),
    #[error("LedgerError - DuplicateUsername: '{0}' is taken")]
    DuplicateUsername(String),
    #[error("LedgerError - DuplicateTicker: '{0}' is already listed")]
    DuplicateTicker(String),
}

const UNIQUE_VIOLATION: &str = "23505";

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(e) => e.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}
