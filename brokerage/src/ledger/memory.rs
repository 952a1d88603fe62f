use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use std::{collections::HashMap, sync::Arc};

use super::{error::*, LedgerStore, LedgerTx};
use crate::{currency::*, entity::*};

#[derive(Clone, Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    password_hashes: HashMap<AccountId, String>,
    securities: HashMap<SecurityId, Security>,
    holdings: HashMap<(AccountId, SecurityId), Holding>,
    transactions: Vec<Transaction>,
}

impl LedgerState {
    fn security_by_ticker(&self, ticker: &Ticker) -> Option<&Security> {
        self.securities.values().find(|s| &s.ticker == ticker)
    }
}

/// Process-local store. Transactions run one at a time and publish their
/// writes only on commit.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryLedgerTx { guard, working }))
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, LedgerError> {
        let mut state = self.state.lock().await;
        if state
            .accounts
            .values()
            .any(|a| a.username == account.username)
        {
            return Err(LedgerError::DuplicateUsername(account.username.to_string()));
        }
        let NewAccount {
            id,
            username,
            password_hash,
            cash,
        } = account;
        let account = Account {
            id,
            username,
            cash,
            created_at: Utc::now(),
        };
        state.password_hashes.insert(id, password_hash);
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        Ok(self.state.lock().await.accounts.get(&id).cloned())
    }

    async fn find_login(&self, username: &Username) -> Result<Option<AccountLogin>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .find(|a| &a.username == username)
            .and_then(|account| {
                Some(AccountLogin {
                    password_hash: state.password_hashes.get(&account.id)?.clone(),
                    account: account.clone(),
                })
            }))
    }

    async fn create_security(&self, security: NewSecurity) -> Result<Security, LedgerError> {
        let mut state = self.state.lock().await;
        if state.security_by_ticker(&security.ticker).is_some() {
            return Err(LedgerError::DuplicateTicker(security.ticker.to_string()));
        }
        let security = Security {
            id: security.id,
            ticker: security.ticker,
            company_name: security.company_name,
            current_price: UsdAmount::zero(),
            price_updated_at: None,
        };
        state.securities.insert(security.id, security.clone());
        Ok(security)
    }

    async fn find_security(&self, ticker: &Ticker) -> Result<Option<Security>, LedgerError> {
        Ok(self.state.lock().await.security_by_ticker(ticker).cloned())
    }

    async fn update_security_price(
        &self,
        id: SecurityId,
        price: UsdAmount,
    ) -> Result<Security, LedgerError> {
        let mut state = self.state.lock().await;
        let security = state
            .securities
            .get_mut(&id)
            .ok_or(LedgerError::Sqlx(sqlx::Error::RowNotFound))?;
        security.current_price = price;
        security.price_updated_at = Some(Utc::now());
        Ok(security.clone())
    }

    async fn search_securities(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Security>, LedgerError> {
        let needle = query.to_uppercase();
        let state = self.state.lock().await;
        let mut found: Vec<_> = state
            .securities
            .values()
            .filter(|s| {
                s.ticker.as_str().contains(&needle)
                    || s.company_name.to_uppercase().contains(&needle)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        found.truncate(limit);
        Ok(found)
    }

    async fn list_positions(&self, account_id: AccountId) -> Result<Vec<Position>, LedgerError> {
        let state = self.state.lock().await;
        let mut positions: Vec<_> = state
            .holdings
            .values()
            .filter(|h| h.account_id == account_id)
            .filter_map(|h| {
                let security = state.securities.get(&h.security_id)?;
                Some(Position {
                    security_id: h.security_id,
                    ticker: security.ticker.clone(),
                    company_name: security.company_name.clone(),
                    shares_owned: h.shares_owned,
                    current_price: security.current_price,
                    updated_at: h.updated_at,
                })
            })
            .collect();
        positions.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(positions)
    }

    async fn list_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.account_id == account_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

pub struct MemoryLedgerTx {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn lock_account(&mut self, id: AccountId) -> Result<Account, LedgerError> {
        self.working
            .accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn lock_holding(
        &mut self,
        account_id: AccountId,
        security_id: SecurityId,
    ) -> Result<Option<Holding>, LedgerError> {
        Ok(self
            .working
            .holdings
            .get(&(account_id, security_id))
            .cloned())
    }

    async fn set_cash(&mut self, id: AccountId, cash: UsdAmount) -> Result<(), LedgerError> {
        let account = self
            .working
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        account.cash = cash;
        Ok(())
    }

    async fn set_holding(
        &mut self,
        account_id: AccountId,
        security_id: SecurityId,
        shares_owned: ShareQuantity,
    ) -> Result<Holding, LedgerError> {
        let holding = Holding {
            account_id,
            security_id,
            shares_owned,
            updated_at: Utc::now(),
        };
        self.working
            .holdings
            .insert((account_id, security_id), holding.clone());
        Ok(holding)
    }

    async fn delete_holding(
        &mut self,
        account_id: AccountId,
        security_id: SecurityId,
    ) -> Result<(), LedgerError> {
        self.working.holdings.remove(&(account_id, security_id));
        Ok(())
    }

    async fn append_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        let transaction = transaction.into_transaction(Utc::now());
        self.working.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let MemoryLedgerTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
