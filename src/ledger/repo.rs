use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    period::Period,
    repo_types::{LedgerEntry, LedgerKind, NewLedgerEntry},
};
use crate::error::AppResult;

const ENTRY_COLUMNS: &str =
    "id, user_id, amount, category, description, payment_method, occurred_at AS date, created_at";

/// Persistence for expenses and deposits.
///
/// Every method takes the [`LedgerKind`] it works on; the two kinds never mix.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert(&self, kind: LedgerKind, entry: NewLedgerEntry) -> AppResult<LedgerEntry>;

    async fn find(&self, kind: LedgerKind, id: Uuid) -> AppResult<Option<LedgerEntry>>;

    /// Most recent first.
    async fn list_by_owner(&self, kind: LedgerKind, user_id: Uuid) -> AppResult<Vec<LedgerEntry>>;

    /// Entries dated within `period`, most recent first.
    async fn list_in_period(
        &self,
        kind: LedgerKind,
        user_id: Uuid,
        period: &Period,
    ) -> AppResult<Vec<LedgerEntry>>;

    /// Overwrites the stored entry with `entry`. Returns `None` if it is gone.
    async fn save(&self, kind: LedgerKind, entry: &LedgerEntry) -> AppResult<Option<LedgerEntry>>;

    /// Returns whether an entry was removed.
    async fn delete(&self, kind: LedgerKind, id: Uuid) -> AppResult<bool>;

    async fn sum_amounts(&self, kind: LedgerKind, user_id: Uuid) -> AppResult<Decimal>;
}

#[derive(Clone)]
pub struct PgLedgerStore {
    db: PgPool,
}

impl PgLedgerStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn insert(&self, kind: LedgerKind, entry: NewLedgerEntry) -> AppResult<LedgerEntry> {
        let sql = format!(
            r#"
            INSERT INTO {} (id, user_id, amount, category, description, payment_method, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ENTRY_COLUMNS}
            "#,
            kind.table()
        );
        let row = sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(Uuid::new_v4())
            .bind(entry.user_id)
            .bind(entry.amount)
            .bind(&entry.category)
            .bind(&entry.description)
            .bind(&entry.payment_method)
            .bind(entry.date)
            .fetch_one(&self.db)
            .await?;
        Ok(row)
    }

    async fn find(&self, kind: LedgerKind, id: Uuid) -> AppResult<Option<LedgerEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM {} WHERE id = $1", kind.table());
        let row = sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn list_by_owner(&self, kind: LedgerKind, user_id: Uuid) -> AppResult<Vec<LedgerEntry>> {
        let sql = format!(
            r#"
            SELECT {ENTRY_COLUMNS}
              FROM {}
             WHERE user_id = $1
             ORDER BY occurred_at DESC, created_at DESC
            "#,
            kind.table()
        );
        let rows = sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn list_in_period(
        &self,
        kind: LedgerKind,
        user_id: Uuid,
        period: &Period,
    ) -> AppResult<Vec<LedgerEntry>> {
        let sql = format!(
            r#"
            SELECT {ENTRY_COLUMNS}
              FROM {}
             WHERE user_id = $1 AND occurred_at >= $2 AND occurred_at < $3
             ORDER BY occurred_at DESC, created_at DESC
            "#,
            kind.table()
        );
        let rows = sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(user_id)
            .bind(period.start)
            .bind(period.end)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn save(&self, kind: LedgerKind, entry: &LedgerEntry) -> AppResult<Option<LedgerEntry>> {
        let sql = format!(
            r#"
            UPDATE {}
               SET amount = $2, category = $3, description = $4,
                   payment_method = $5, occurred_at = $6
             WHERE id = $1
            RETURNING {ENTRY_COLUMNS}
            "#,
            kind.table()
        );
        let row = sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(entry.id)
            .bind(entry.amount)
            .bind(&entry.category)
            .bind(&entry.description)
            .bind(&entry.payment_method)
            .bind(entry.date)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn delete(&self, kind: LedgerKind, id: Uuid) -> AppResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn sum_amounts(&self, kind: LedgerKind, user_id: Uuid) -> AppResult<Decimal> {
        let sql = format!(
            "SELECT COALESCE(SUM(amount), 0) FROM {} WHERE user_id = $1",
            kind.table()
        );
        let total = sqlx::query_scalar::<_, Decimal>(&sql)
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }
}
