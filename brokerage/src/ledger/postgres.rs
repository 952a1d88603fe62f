use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use tracing::instrument;

use super::{error::*, LedgerStore, LedgerTx};
use crate::{currency::*, entity::*};

const SECURITY_COLUMNS: &str = "id, ticker, company_name, current_price, price_updated_at";

#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), LedgerError> {
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTx { tx }))
    }

    #[instrument(name = "ledger.create_account", skip(self, account), fields(username = %account.username), err)]
    async fn create_account(&self, account: NewAccount) -> Result<Account, LedgerError> {
        let NewAccount {
            id,
            username,
            password_hash,
            cash,
        } = account;
        let res = sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, username, password_hash, cash) VALUES ($1, $2, $3, $4)
             RETURNING id, username, cash, created_at",
        )
        .bind(id)
        .bind(&username)
        .bind(password_hash)
        .bind(cash)
        .fetch_one(&self.pool)
        .await;
        match res {
            Err(e) if is_unique_violation(&e) => {
                Err(LedgerError::DuplicateUsername(username.to_string()))
            }
            res => Ok(res?),
        }
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, username, cash, created_at FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn find_login(&self, username: &Username) -> Result<Option<AccountLogin>, LedgerError> {
        let login = sqlx::query_as::<_, AccountLogin>(
            "SELECT id, username, cash, created_at, password_hash
             FROM accounts WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(login)
    }

    #[instrument(name = "ledger.create_security", skip(self, security), fields(ticker = %security.ticker), err)]
    async fn create_security(&self, security: NewSecurity) -> Result<Security, LedgerError> {
        let NewSecurity {
            id,
            ticker,
            company_name,
        } = security;
        let res = sqlx::query_as::<_, Security>(&format!(
            "INSERT INTO securities (id, ticker, company_name) VALUES ($1, $2, $3)
             RETURNING {SECURITY_COLUMNS}"
        ))
        .bind(id)
        .bind(&ticker)
        .bind(company_name)
        .fetch_one(&self.pool)
        .await;
        match res {
            Err(e) if is_unique_violation(&e) => Err(LedgerError::DuplicateTicker(ticker.to_string())),
            res => Ok(res?),
        }
    }

    async fn find_security(&self, ticker: &Ticker) -> Result<Option<Security>, LedgerError> {
        let security = sqlx::query_as::<_, Security>(&format!(
            "SELECT {SECURITY_COLUMNS} FROM securities WHERE ticker = $1"
        ))
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;
        Ok(security)
    }

    #[instrument(name = "ledger.update_security_price", skip(self), err)]
    async fn update_security_price(
        &self,
        id: SecurityId,
        price: UsdAmount,
    ) -> Result<Security, LedgerError> {
        let security = sqlx::query_as::<_, Security>(&format!(
            "UPDATE securities SET current_price = $2, price_updated_at = now()
             WHERE id = $1 RETURNING {SECURITY_COLUMNS}"
        ))
        .bind(id)
        .bind(price)
        .fetch_one(&self.pool)
        .await?;
        Ok(security)
    }

    async fn search_securities(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Security>, LedgerError> {
        let securities = sqlx::query_as::<_, Security>(&format!(
            "SELECT {SECURITY_COLUMNS} FROM securities
             WHERE ticker ILIKE $1 OR company_name ILIKE $1
             ORDER BY ticker LIMIT $2"
        ))
        .bind(like_pattern(query))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(securities)
    }

    async fn list_positions(&self, account_id: AccountId) -> Result<Vec<Position>, LedgerError> {
        let positions = sqlx::query_as::<_, Position>(
            "SELECT h.security_id, s.ticker, s.company_name, h.shares_owned, s.current_price, h.updated_at
             FROM holdings h JOIN securities s ON s.id = h.security_id
             WHERE h.account_id = $1
             ORDER BY s.ticker",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(positions)
    }

    async fn list_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT t.id, t.account_id, t.security_id, s.ticker, t.side, t.quantity,
                    t.price_per_share, t.total_amount, t.created_at
             FROM transactions t JOIN securities s ON s.id = t.security_id
             WHERE t.account_id = $1
             ORDER BY t.created_at DESC, t.id
             LIMIT $2",
        )
        .bind(account_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub struct PgLedgerTx {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_account(&mut self, id: AccountId) -> Result<Account, LedgerError> {
        sqlx::query_as::<_, Account>(
            "SELECT id, username, cash, created_at FROM accounts WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn lock_holding(
        &mut self,
        account_id: AccountId,
        security_id: SecurityId,
    ) -> Result<Option<Holding>, LedgerError> {
        let holding = sqlx::query_as::<_, Holding>(
            "SELECT account_id, security_id, shares_owned, updated_at FROM holdings
             WHERE account_id = $1 AND security_id = $2 FOR UPDATE",
        )
        .bind(account_id)
        .bind(security_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(holding)
    }

    async fn set_cash(&mut self, id: AccountId, cash: UsdAmount) -> Result<(), LedgerError> {
        let res = sqlx::query("UPDATE accounts SET cash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(cash)
            .execute(&mut *self.tx)
            .await?;
        if res.rows_affected() == 0 {
            return Err(LedgerError::AccountNotFound(id));
        }
        Ok(())
    }

    async fn set_holding(
        &mut self,
        account_id: AccountId,
        security_id: SecurityId,
        shares_owned: ShareQuantity,
    ) -> Result<Holding, LedgerError> {
        let holding = sqlx::query_as::<_, Holding>(
            "INSERT INTO holdings (account_id, security_id, shares_owned) VALUES ($1, $2, $3)
             ON CONFLICT (account_id, security_id)
             DO UPDATE SET shares_owned = EXCLUDED.shares_owned, updated_at = now()
             RETURNING account_id, security_id, shares_owned, updated_at",
        )
        .bind(account_id)
        .bind(security_id)
        .bind(shares_owned)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(holding)
    }

    async fn delete_holding(
        &mut self,
        account_id: AccountId,
        security_id: SecurityId,
    ) -> Result<(), LedgerError> {
        sqlx::query("DELETE FROM holdings WHERE account_id = $1 AND security_id = $2")
            .bind(account_id)
            .bind(security_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn append_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        let (created_at,): (DateTime<Utc>,) = sqlx::query_as(
            "INSERT INTO transactions
               (id, account_id, security_id, side, quantity, price_per_share, total_amount)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING created_at",
        )
        .bind(transaction.id)
        .bind(transaction.account_id)
        .bind(transaction.security_id)
        .bind(transaction.side)
        .bind(transaction.quantity)
        .bind(transaction.price_per_share)
        .bind(transaction.total_amount)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(transaction.into_transaction(created_at))
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.commit().await?;
        Ok(())
    }
}
