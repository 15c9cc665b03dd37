//! In-process stores backing the unit and router tests.

use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User, DEFAULT_AVATAR},
    },
    error::{AppError, AppResult},
    ledger::{
        period::Period,
        repo::LedgerStore,
        repo_types::{LedgerEntry, LedgerKind, NewLedgerEntry},
    },
};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    expenses: Mutex<Vec<LedgerEntry>>,
    deposits: Mutex<Vec<LedgerEntry>>,
}

impl MemoryStore {
    fn entries(&self, kind: LedgerKind) -> &Mutex<Vec<LedgerEntry>> {
        match kind {
            LedgerKind::Expense => &self.expenses,
            LedgerKind::Deposit => &self.deposits,
        }
    }

    fn select(
        &self,
        kind: LedgerKind,
        keep: impl Fn(&LedgerEntry) -> bool,
    ) -> Vec<LedgerEntry> {
        let mut rows: Vec<LedgerEntry> = self
            .entries(kind)
            .lock()
            .unwrap()
            .iter()
            .filter(|e| keep(e))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        rows
    }
}

fn conflict() -> AppError {
    AppError::Conflict("Username or email already in use".into())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(conflict());
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            avatar: new_user.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_username(&self, id: Uuid, username: &str) -> AppResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.id != id && u.username == username) {
            return Err(conflict());
        }
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.username = username.to_string();
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert(&self, kind: LedgerKind, entry: NewLedgerEntry) -> AppResult<LedgerEntry> {
        let row = LedgerEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            amount: entry.amount,
            category: entry.category,
            description: entry.description,
            payment_method: entry.payment_method,
            date: entry.date,
            created_at: OffsetDateTime::now_utc(),
        };
        self.entries(kind).lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn find(&self, kind: LedgerKind, id: Uuid) -> AppResult<Option<LedgerEntry>> {
        let rows = self.entries(kind).lock().unwrap();
        Ok(rows.iter().find(|e| e.id == id).cloned())
    }

    async fn list_by_owner(&self, kind: LedgerKind, user_id: Uuid) -> AppResult<Vec<LedgerEntry>> {
        Ok(self.select(kind, |e| e.user_id == user_id))
    }

    async fn list_in_period(
        &self,
        kind: LedgerKind,
        user_id: Uuid,
        period: &Period,
    ) -> AppResult<Vec<LedgerEntry>> {
        Ok(self.select(kind, |e| {
            e.user_id == user_id && period.start <= e.date && e.date < period.end
        }))
    }

    async fn save(&self, kind: LedgerKind, entry: &LedgerEntry) -> AppResult<Option<LedgerEntry>> {
        let mut rows = self.entries(kind).lock().unwrap();
        Ok(rows.iter_mut().find(|e| e.id == entry.id).map(|stored| {
            stored.amount = entry.amount;
            stored.category = entry.category.clone();
            stored.description = entry.description.clone();
            stored.payment_method = entry.payment_method.clone();
            stored.date = entry.date;
            stored.clone()
        }))
    }

    async fn delete(&self, kind: LedgerKind, id: Uuid) -> AppResult<bool> {
        let mut rows = self.entries(kind).lock().unwrap();
        let before = rows.len();
        rows.retain(|e| e.id != id);
        Ok(rows.len() < before)
    }

    async fn sum_amounts(&self, kind: LedgerKind, user_id: Uuid) -> AppResult<Decimal> {
        let rows = self.entries(kind).lock().unwrap();
        Ok(rows
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.amount)
            .sum())
    }
}
