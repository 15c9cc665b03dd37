use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// The two ledgers a user keeps. They share one shape but live in separate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    Expense,
    Deposit,
}

impl LedgerKind {
    pub fn table(self) -> &'static str {
        match self {
            Self::Expense => "expenses",
            Self::Deposit => "deposits",
        }
    }

    /// Capitalized noun used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Expense => "Expense",
            Self::Deposit => "Deposit",
        }
    }
}

/// Writes an instant as integer milliseconds since the Unix epoch.
fn epoch_millis<S: Serializer>(instant: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    let millis = instant.unix_timestamp_nanos() / 1_000_000;
    serializer.serialize_i64(millis as i64)
}

/// A single expense or deposit.
///
/// Serialized with `_id` and epoch-millisecond `date`/`createdAt`, the shape
/// the web client sorts and routes by.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub payment_method: String,
    #[serde(serialize_with = "epoch_millis")]
    pub date: OffsetDateTime,
    #[serde(serialize_with = "epoch_millis")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub payment_method: String,
    pub date: OffsetDateTime,
}

/// Fields of an entry a partial update supplied. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub date: Option<OffsetDateTime>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.payment_method.is_none()
            && self.date.is_none()
    }

    pub fn apply(self, entry: &mut LedgerEntry) {
        if let Some(amount) = self.amount {
            entry.amount = amount;
        }
        if let Some(category) = self.category {
            entry.category = category;
        }
        if let Some(description) = self.description {
            entry.description = description;
        }
        if let Some(payment_method) = self.payment_method {
            entry.payment_method = payment_method;
        }
        if let Some(date) = self.date {
            entry.date = date;
        }
    }
}

/// Sum and count of one category's entries within a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub month: &'static str,
    pub income: Decimal,
    pub expenses: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub year: i32,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub monthly: Vec<MonthlyTotals>,
}
