//! Loan listing endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{error::AppResult, models::book_instance::Loan};

use super::{today, LoanPage, MaybeUser, PageQuery, PaginatedResponse};

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/loans/mine",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Caller's loans, soonest due first", body = LoanPage),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn my_loans(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Loan>>> {
    let loans = state.services.loans.loans_for_user(caller.as_ref(), today()).await?;
    Ok(Json(PaginatedResponse::slice(
        loans,
        &query,
        state.config.catalog.loans_per_page,
    )))
}

/// All outstanding loans
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Every copy on loan, soonest due first", body = LoanPage),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned capability", body = crate::error::ErrorResponse)
    )
)]
pub async fn all_loans(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Loan>>> {
    let loans = state
        .services
        .loans
        .all_outstanding_loans(caller.as_ref(), today())
        .await?;
    Ok(Json(PaginatedResponse::slice(
        loans,
        &query,
        state.config.catalog.loans_per_page,
    )))
}
