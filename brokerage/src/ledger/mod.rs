mod error;
mod memory;
mod postgres;

use async_trait::async_trait;

use crate::{currency::*, entity::*};

pub use error::*;
pub use memory::*;
pub use postgres::*;

/// Persistent accounts, securities, holdings and the trade log.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens an atomic unit of work. Dropping it without `commit` discards its writes.
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError>;

    async fn create_account(&self, account: NewAccount) -> Result<Account, LedgerError>;
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError>;
    async fn find_login(&self, username: &Username) -> Result<Option<AccountLogin>, LedgerError>;

    async fn create_security(&self, security: NewSecurity) -> Result<Security, LedgerError>;
    async fn find_security(&self, ticker: &Ticker) -> Result<Option<Security>, LedgerError>;
    async fn update_security_price(
        &self,
        id: SecurityId,
        price: UsdAmount,
    ) -> Result<Security, LedgerError>;
    /// Case-insensitive substring match on ticker or company name, ordered by ticker.
    async fn search_securities(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Security>, LedgerError>;

    async fn list_positions(&self, account_id: AccountId) -> Result<Vec<Position>, LedgerError>;
    /// Newest first.
    async fn list_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError>;

    async fn ping(&self) -> Result<(), LedgerError>;
}

/// Reads inside a `LedgerTx` see the transaction's own writes and hold the
/// rows they return until commit or drop.
#[async_trait]
pub trait LedgerTx: Send {
    async fn lock_account(&mut self, id: AccountId) -> Result<Account, LedgerError>;
    async fn lock_holding(
        &mut self,
        account_id: AccountId,
        security_id: SecurityId,
    ) -> Result<Option<Holding>, LedgerError>;

    async fn set_cash(&mut self, id: AccountId, cash: UsdAmount) -> Result<(), LedgerError>;
    async fn set_holding(
        &mut self,
        account_id: AccountId,
        security_id: SecurityId,
        shares_owned: ShareQuantity,
    ) -> Result<Holding, LedgerError>;
    async fn delete_holding(
        &mut self,
        account_id: AccountId,
        security_id: SecurityId,
    ) -> Result<(), LedgerError>;
    async fn append_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<Transaction, LedgerError>;

    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;
}
