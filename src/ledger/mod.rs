use crate::state::AppState;
use axum::Router;

use repo_types::LedgerKind;

pub mod dto;
pub mod guard;
pub mod handlers;
pub mod period;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod summary;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/expenses", handlers::entry_routes(LedgerKind::Expense))
        .nest("/deposits", handlers::entry_routes(LedgerKind::Deposit))
        .merge(handlers::overview_routes())
}
