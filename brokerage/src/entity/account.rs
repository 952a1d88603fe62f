use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::currency::UsdAmount;

shared::entity_id! { AccountId }
shared::string_wrapper! { Username }

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub username: Username,
    pub cash: UsdAmount,
    pub created_at: DateTime<Utc>,
}

/// An account together with its stored password hash (PHC string).
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AccountLogin {
    #[sqlx(flatten)]
    pub account: Account,
    pub password_hash: String,
}

#[derive(Clone, Debug)]
pub struct NewAccount {
    pub(crate) id: AccountId,
    pub(crate) username: Username,
    pub(crate) password_hash: String,
    pub(crate) cash: UsdAmount,
}

impl NewAccount {
    pub fn new(username: impl Into<Username>, password_hash: String, cash: UsdAmount) -> Self {
        Self {
            id: AccountId::new(),
            username: username.into(),
            password_hash,
            cash,
        }
    }
}
