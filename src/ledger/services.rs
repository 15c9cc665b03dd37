use rust_decimal::Decimal;
use time::{OffsetDateTime, UtcOffset};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{NewEntryRequest, UpdateEntryRequest},
    guard::ensure_owner,
    period::{parse_month_year, parse_year, Period},
    repo::LedgerStore,
    repo_types::{CategoryTotal, EntryPatch, LedgerEntry, LedgerKind, NewLedgerEntry, Overview},
    summary::{monthly_series, summarize_by_category},
};
use crate::error::{AppError, AppResult};

fn check_amount(amount: Decimal) -> AppResult<Decimal> {
    if amount > Decimal::ZERO {
        Ok(amount)
    } else {
        Err(AppError::validation("Amount must be greater than zero"))
    }
}

fn check_label(value: String, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(AppError::validation(format!("{field} cannot be empty")))
    } else {
        Ok(value.to_string())
    }
}

async fn find_owned(
    store: &dyn LedgerStore,
    kind: LedgerKind,
    requester: Uuid,
    id: Uuid,
    action: &str,
) -> AppResult<LedgerEntry> {
    let entry = store
        .find(kind, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("{} not found", kind.label())))?;
    if let Err(e) = ensure_owner(requester, &entry, kind, action) {
        warn!(%requester, entry_id = %id, owner = %entry.user_id, action, "ownership check failed");
        return Err(e);
    }
    Ok(entry)
}

pub async fn add_entry(
    store: &dyn LedgerStore,
    kind: LedgerKind,
    owner: Uuid,
    req: NewEntryRequest,
    offset: UtcOffset,
) -> AppResult<LedgerEntry> {
    let (Some(amount), Some(category), Some(payment_method)) =
        (req.amount, req.category, req.payment_method)
    else {
        return Err(AppError::validation(
            "Amount, category and payment method are required",
        ));
    };

    let date = match req.date {
        Some(date) => date.resolve(offset)?,
        None => OffsetDateTime::now_utc(),
    };

    let entry = store
        .insert(
            kind,
            NewLedgerEntry {
                user_id: owner,
                amount: check_amount(amount)?,
                category: check_label(category, "Category")?,
                description: req.description.unwrap_or_default(),
                payment_method: check_label(payment_method, "Payment method")?,
                date,
            },
        )
        .await?;

    info!(kind = ?kind, entry_id = %entry.id, user_id = %owner, "entry added");
    Ok(entry)
}

pub async fn list_entries(
    store: &dyn LedgerStore,
    kind: LedgerKind,
    owner: Uuid,
) -> AppResult<Vec<LedgerEntry>> {
    store.list_by_owner(kind, owner).await
}

pub async fn get_entry(
    store: &dyn LedgerStore,
    kind: LedgerKind,
    requester: Uuid,
    id: Uuid,
) -> AppResult<LedgerEntry> {
    find_owned(store, kind, requester, id, "view").await
}

/// Applies the supplied fields of `req` to an entry the requester owns.
///
/// Concurrent updates of one entry are last-write-wins.
pub async fn update_entry(
    store: &dyn LedgerStore,
    kind: LedgerKind,
    requester: Uuid,
    id: Uuid,
    req: UpdateEntryRequest,
    offset: UtcOffset,
) -> AppResult<LedgerEntry> {
    let mut entry = find_owned(store, kind, requester, id, "update").await?;

    let patch = EntryPatch {
        amount: req.amount.map(check_amount).transpose()?,
        category: req
            .category
            .map(|c| check_label(c, "Category"))
            .transpose()?,
        description: req.description,
        payment_method: req
            .payment_method
            .map(|p| check_label(p, "Payment method"))
            .transpose()?,
        date: req.date.map(|d| d.resolve(offset)).transpose()?,
    };
    if patch.is_empty() {
        return Err(AppError::validation("At least one field is required"));
    }
    patch.apply(&mut entry);

    let updated = store
        .save(kind, &entry)
        .await?
        .ok_or_else(|| AppError::not_found(format!("{} not found", kind.label())))?;

    info!(kind = ?kind, entry_id = %id, "entry updated");
    Ok(updated)
}

pub async fn delete_entry(
    store: &dyn LedgerStore,
    kind: LedgerKind,
    requester: Uuid,
    id: Uuid,
) -> AppResult<()> {
    find_owned(store, kind, requester, id, "delete").await?;

    if !store.delete(kind, id).await? {
        return Err(AppError::not_found(format!("{} not found", kind.label())));
    }

    info!(kind = ?kind, entry_id = %id, "entry deleted");
    Ok(())
}

/// Per-category totals of the owner's entries in one calendar month.
pub async fn category_summary(
    store: &dyn LedgerStore,
    kind: LedgerKind,
    owner: Uuid,
    month: Option<&str>,
    year: Option<&str>,
    offset: UtcOffset,
) -> AppResult<Vec<CategoryTotal>> {
    let (year, month) = parse_month_year(month, year)?;
    let period = Period::month(year, month, offset)?;
    let entries = store.list_in_period(kind, owner, &period).await?;
    Ok(summarize_by_category(&entries))
}

/// All-time totals plus the monthly income/expense series of `year`
/// (the current year when absent).
pub async fn overview(
    store: &dyn LedgerStore,
    owner: Uuid,
    year: Option<&str>,
    offset: UtcOffset,
) -> AppResult<Overview> {
    let year = match year.filter(|y| !y.trim().is_empty()) {
        Some(y) => parse_year(y)?,
        None => OffsetDateTime::now_utc().to_offset(offset).year(),
    };
    let period = Period::year(year, offset)?;

    let total_income = store.sum_amounts(LedgerKind::Deposit, owner).await?;
    let total_expense = store.sum_amounts(LedgerKind::Expense, owner).await?;
    let deposits = store
        .list_in_period(LedgerKind::Deposit, owner, &period)
        .await?;
    let expenses = store
        .list_in_period(LedgerKind::Expense, owner, &period)
        .await?;

    Ok(Overview {
        year,
        total_income,
        total_expense,
        balance: total_income - total_expense,
        monthly: monthly_series(&deposits, &expenses, offset),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ledger::dto::DateInput, memory::MemoryStore};
    use rust_decimal_macros::dec;

    const UTC: UtcOffset = UtcOffset::UTC;

    fn expense(amount: Decimal, category: &str, date: &str) -> NewEntryRequest {
        NewEntryRequest {
            amount: Some(amount),
            category: Some(category.into()),
            description: None,
            payment_method: Some("Card".into()),
            date: Some(DateInput::Text(date.into())),
        }
    }

    async fn add(store: &MemoryStore, owner: Uuid, amount: Decimal, category: &str, date: &str) -> LedgerEntry {
        add_entry(store, LedgerKind::Expense, owner, expense(amount, category, date), UTC)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn add_defaults_description_and_date() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        let before = OffsetDateTime::now_utc();
        let entry = add_entry(
            &store,
            LedgerKind::Deposit,
            owner,
            NewEntryRequest {
                amount: Some(dec!(2500)),
                category: Some("Salary".into()),
                payment_method: Some("Bank".into()),
                ..Default::default()
            },
            UTC,
        )
        .await
        .unwrap();

        assert_eq!(entry.user_id, owner);
        assert_eq!(entry.description, "");
        assert!(entry.date >= before);
    }

    #[tokio::test]
    async fn add_requires_amount_category_and_payment_method() {
        let store = MemoryStore::default();
        let mut req = expense(dec!(10), "Food", "2024-03-15");
        req.payment_method = None;
        let err = add_entry(&store, LedgerKind::Expense, Uuid::new_v4(), req, UTC)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn add_rejects_non_positive_amounts() {
        let store = MemoryStore::default();
        for amount in [dec!(0), dec!(-5)] {
            let err = add_entry(
                &store,
                LedgerKind::Expense,
                Uuid::new_v4(),
                expense(amount, "Food", "2024-03-15"),
                UTC,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn identical_submissions_create_distinct_entries() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        let a = add(&store, owner, dec!(10), "Food", "2024-03-15").await;
        let b = add(&store, owner, dec!(10), "Food", "2024-03-15").await;
        assert_ne!(a.id, b.id);
        assert_eq!(list_entries(&store, LedgerKind::Expense, owner).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_is_most_recent_first_and_per_owner() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        add(&store, owner, dec!(1), "Food", "2024-01-01").await;
        add(&store, owner, dec!(2), "Food", "2024-03-01").await;
        add(&store, owner, dec!(3), "Food", "2024-02-01").await;
        add(&store, Uuid::new_v4(), dec!(4), "Food", "2024-04-01").await;

        let amounts: Vec<_> = list_entries(&store, LedgerKind::Expense, owner)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.amount)
            .collect();
        assert_eq!(amounts, [dec!(2), dec!(3), dec!(1)]);
    }

    #[tokio::test]
    async fn kinds_are_kept_apart() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        let entry = add(&store, owner, dec!(1), "Food", "2024-01-01").await;
        assert!(list_entries(&store, LedgerKind::Deposit, owner).await.unwrap().is_empty());
        let err = get_entry(&store, LedgerKind::Deposit, owner, entry.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_entry_is_idempotent() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        let entry = add(&store, owner, dec!(42), "Books", "2024-05-05").await;
        let first = get_entry(&store, LedgerKind::Expense, owner, entry.id).await.unwrap();
        let second = get_entry(&store, LedgerKind::Expense, owner, entry.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, entry);
    }

    #[tokio::test]
    async fn get_entry_of_someone_else_is_refused() {
        let store = MemoryStore::default();
        let entry = add(&store, Uuid::new_v4(), dec!(42), "Books", "2024-05-05").await;
        let err = get_entry(&store, LedgerKind::Expense, Uuid::new_v4(), entry.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn update_by_non_owner_leaves_entry_unchanged() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        let entry = add(&store, owner, dec!(500), "Food", "2024-03-15").await;

        let err = update_entry(
            &store,
            LedgerKind::Expense,
            Uuid::new_v4(),
            entry.id,
            UpdateEntryRequest {
                amount: Some(dec!(1)),
                ..Default::default()
            },
            UTC,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));

        let stored = get_entry(&store, LedgerKind::Expense, owner, entry.id).await.unwrap();
        assert_eq!(stored, entry);
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        let entry = add(&store, owner, dec!(500), "Food", "2024-03-15").await;

        let updated = update_entry(
            &store,
            LedgerKind::Expense,
            owner,
            entry.id,
            UpdateEntryRequest {
                category: Some("Travel".into()),
                description: Some(String::new()),
                ..Default::default()
            },
            UTC,
        )
        .await
        .unwrap();

        assert_eq!(updated.category, "Travel");
        assert_eq!(updated.description, "");
        assert_eq!(updated.amount, dec!(500));
        assert_eq!(updated.date, entry.date);
        assert_eq!(updated.payment_method, entry.payment_method);
    }

    #[tokio::test]
    async fn update_checks_existence_then_ownership_then_fields() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();

        let missing = update_entry(
            &store,
            LedgerKind::Expense,
            owner,
            Uuid::new_v4(),
            UpdateEntryRequest::default(),
            UTC,
        )
        .await
        .unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));

        let entry = add(&store, owner, dec!(5), "Food", "2024-03-15").await;
        let stranger = update_entry(
            &store,
            LedgerKind::Expense,
            Uuid::new_v4(),
            entry.id,
            UpdateEntryRequest::default(),
            UTC,
        )
        .await
        .unwrap_err();
        assert!(matches!(stranger, AppError::Auth(_)));

        let empty = update_entry(
            &store,
            LedgerKind::Expense,
            owner,
            entry.id,
            UpdateEntryRequest::default(),
            UTC,
        )
        .await
        .unwrap_err();
        assert!(matches!(empty, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_scenario_between_two_users() {
        let store = MemoryStore::default();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();
        let entry = add(&store, user_a, dec!(500), "Food", "2024-03-15").await;

        let err = delete_entry(&store, LedgerKind::Expense, user_b, entry.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
        assert_eq!(list_entries(&store, LedgerKind::Expense, user_a).await.unwrap().len(), 1);

        delete_entry(&store, LedgerKind::Expense, user_a, entry.id)
            .await
            .unwrap();
        let remaining = list_entries(&store, LedgerKind::Expense, user_a).await.unwrap();
        assert!(remaining.iter().all(|e| e.id != entry.id));

        let again = delete_entry(&store, LedgerKind::Expense, user_a, entry.id)
            .await
            .unwrap_err();
        assert!(matches!(again, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn category_summary_of_march() {
        let store = MemoryStore::default();
        let user_a = Uuid::new_v4();
        add(&store, user_a, dec!(100), "Food", "2024-03-02").await;
        add(&store, user_a, dec!(200), "Food", "2024-03-20").await;
        add(&store, user_a, dec!(50), "Travel", "2024-03-31T23:59:59Z").await;
        add(&store, user_a, dec!(999), "Food", "2024-04-01").await;
        add(&store, Uuid::new_v4(), dec!(999), "Food", "2024-03-10").await;

        let summary = category_summary(
            &store,
            LedgerKind::Expense,
            user_a,
            Some("3"),
            Some("2024"),
            UTC,
        )
        .await
        .unwrap();

        assert_eq!(
            summary,
            vec![
                CategoryTotal {
                    category: "Food".into(),
                    total: dec!(300),
                    count: 2
                },
                CategoryTotal {
                    category: "Travel".into(),
                    total: dec!(50),
                    count: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn category_summary_matches_raw_entries() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        let amounts = [dec!(12.40), dec!(7.60), dec!(100), dec!(0.99), dec!(45)];
        let categories = ["Food", "Fun", "Rent", "Food", "Fun"];
        for (amount, category) in amounts.iter().zip(categories) {
            add(&store, owner, *amount, category, "2024-07-14").await;
        }

        let summary = category_summary(&store, LedgerKind::Expense, owner, Some("7"), Some("2024"), UTC)
            .await
            .unwrap();
        let total: Decimal = summary.iter().map(|c| c.total).sum();
        let count: i64 = summary.iter().map(|c| c.count).sum();
        assert_eq!(total, amounts.iter().copied().sum::<Decimal>());
        assert_eq!(count, amounts.len() as i64);
    }

    #[tokio::test]
    async fn empty_month_is_an_empty_list() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        add(&store, owner, dec!(10), "Food", "2024-03-15").await;
        let summary = category_summary(&store, LedgerKind::Expense, owner, Some("2"), Some("2024"), UTC)
            .await
            .unwrap();
        assert!(summary.is_empty());
    }

    #[tokio::test]
    async fn category_summary_requires_month_and_year() {
        let store = MemoryStore::default();
        let err = category_summary(&store, LedgerKind::Expense, Uuid::new_v4(), None, Some("2024"), UTC)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn overview_totals_and_series() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        add(&store, owner, dec!(100), "Food", "2024-01-10").await;
        add(&store, owner, dec!(40), "Food", "2023-12-31").await;
        add_entry(
            &store,
            LedgerKind::Deposit,
            owner,
            NewEntryRequest {
                amount: Some(dec!(1000)),
                category: Some("Salary".into()),
                payment_method: Some("Bank".into()),
                date: Some(DateInput::Text("2024-01-01".into())),
                ..Default::default()
            },
            UTC,
        )
        .await
        .unwrap();

        let overview = overview(&store, owner, Some("2024"), UTC).await.unwrap();
        assert_eq!(overview.year, 2024);
        assert_eq!(overview.total_income, dec!(1000));
        assert_eq!(overview.total_expense, dec!(140));
        assert_eq!(overview.balance, dec!(860));
        assert_eq!(overview.monthly.len(), 12);
        assert_eq!(overview.monthly[0].income, dec!(1000));
        assert_eq!(overview.monthly[0].expenses, dec!(100));
        assert!(overview.monthly[1..].iter().all(|m| m.expenses == Decimal::ZERO));
    }

    #[tokio::test]
    async fn overview_defaults_to_the_current_year() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        let entry = add_entry(
            &store,
            LedgerKind::Expense,
            owner,
            NewEntryRequest {
                amount: Some(dec!(30)),
                category: Some("Food".into()),
                payment_method: Some("Cash".into()),
                ..Default::default()
            },
            UTC,
        )
        .await
        .unwrap();
        let month = usize::from(u8::from(entry.date.month())) - 1;

        for year in [None, Some(""), Some("  ")] {
            let overview = overview(&store, owner, year, UTC).await.unwrap();
            assert_eq!(overview.year, entry.date.year());
            assert_eq!(overview.monthly[month].expenses, dec!(30));
        }
    }

    #[tokio::test]
    async fn summary_for_a_year_past_the_calendar_is_a_validation_error() {
        let store = MemoryStore::default();
        let err = category_summary(
            &store,
            LedgerKind::Expense,
            Uuid::new_v4(),
            Some("12"),
            Some("2147483647"),
            UTC,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
