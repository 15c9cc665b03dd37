use uuid::Uuid;

use super::repo_types::{LedgerEntry, LedgerKind};
use crate::error::{AppError, AppResult};

/// Allows access only to the entry's owner.
pub fn authorize(requester: Uuid, entry: &LedgerEntry) -> bool {
    requester == entry.user_id
}

/// [`authorize`], turned into an auth error naming the refused `action`.
pub fn ensure_owner(
    requester: Uuid,
    entry: &LedgerEntry,
    kind: LedgerKind,
    action: &str,
) -> AppResult<()> {
    if authorize(requester, entry) {
        Ok(())
    } else {
        Err(AppError::auth(format!(
            "You can only {action} your own {}s",
            kind.label().to_lowercase()
        )))
    }
}
