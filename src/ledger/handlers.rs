use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    ledger::{
        dto::{
            CategorySummaryResponse, EntriesResponse, EntryResponse, MessageResponse,
            NewEntryRequest, OverviewQuery, OverviewResponse, SingleEntryResponse, SummaryQuery,
            UpdateEntryRequest,
        },
        repo_types::LedgerKind,
        services,
    },
    state::AppState,
};

/// Routes of one ledger. The same handlers serve both kinds; the kind
/// travels in a request extension.
pub fn entry_routes(kind: LedgerKind) -> Router<AppState> {
    Router::new()
        .route("/", post(add_entry).get(list_entries))
        .route("/categories", get(category_summary))
        .route("/update/:id", patch(update_entry))
        .route("/delete/:id", delete(delete_entry))
        .route("/:id", get(get_entry))
        .layer(Extension(kind))
}

pub fn overview_routes() -> Router<AppState> {
    Router::new().route("/overview", get(overview))
}

#[instrument(skip(state, payload))]
pub async fn add_entry(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<NewEntryRequest>,
) -> AppResult<(StatusCode, Json<EntryResponse>)> {
    let entry = services::add_entry(
        state.ledger.as_ref(),
        kind,
        user_id,
        payload,
        state.config.report_offset,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(EntryResponse {
            success: true,
            message: format!("{} Added", kind.label()),
            entry,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<EntriesResponse>> {
    let entries = services::list_entries(state.ledger.as_ref(), kind, user_id).await?;
    Ok(Json(EntriesResponse::new(kind, entries)))
}

#[instrument(skip(state))]
pub async fn get_entry(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<SingleEntryResponse>> {
    let entry = services::get_entry(state.ledger.as_ref(), kind, user_id, id).await?;
    Ok(Json(SingleEntryResponse::new(kind, entry)))
}

#[instrument(skip(state, payload))]
pub async fn update_entry(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateEntryRequest>,
) -> AppResult<Json<EntryResponse>> {
    let entry = services::update_entry(
        state.ledger.as_ref(),
        kind,
        user_id,
        id,
        payload,
        state.config.report_offset,
    )
    .await?;
    Ok(Json(EntryResponse {
        success: true,
        message: format!("{} Updated", kind.label()),
        entry,
    }))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    services::delete_entry(state.ledger.as_ref(), kind, user_id, id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: format!("{} Deleted Successfully", kind.label()),
    }))
}

#[instrument(skip(state))]
pub async fn category_summary(
    State(state): State<AppState>,
    Extension(kind): Extension<LedgerKind>,
    AuthUser(user_id): AuthUser,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> AppResult<Json<CategorySummaryResponse>> {
    let categories = services::category_summary(
        state.ledger.as_ref(),
        kind,
        user_id,
        query.month.as_deref(),
        query.year.as_deref(),
        state.config.report_offset,
    )
    .await?;
    Ok(Json(CategorySummaryResponse {
        success: true,
        categories,
    }))
}

#[instrument(skip(state))]
pub async fn overview(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(query): ApiQuery<OverviewQuery>,
) -> AppResult<Json<OverviewResponse>> {
    let overview = services::overview(
        state.ledger.as_ref(),
        user_id,
        query.year.as_deref(),
        state.config.report_offset,
    )
    .await?;
    Ok(Json(OverviewResponse {
        success: true,
        overview,
    }))
}
