//! Book copy endpoints: availability, renewal, lending and return

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book_instance::{BookInstance, CreateBookInstance, LendRequest, RenewRequest},
};

use super::{today, InstancePage, MaybeUser, PageQuery, PaginatedResponse};

/// Where clients go after a successful renewal
pub const OUTSTANDING_LOANS_PATH: &str = "/api/v1/loans";

/// Proposed renewal date for the renewal form
#[derive(Serialize, ToSchema)]
pub struct ProposedRenewal {
    pub instance_id: Uuid,
    pub renewal_date: NaiveDate,
}

/// Renewal result with the view to redirect to
#[derive(Serialize, ToSchema)]
pub struct RenewResponse {
    pub instance: BookInstance,
    /// Outstanding-loans listing
    pub next: String,
}

/// Copies available for lending
#[utoipa::path(
    get,
    path = "/instances/available",
    tag = "instances",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of available copies", body = InstancePage)
    )
)]
pub async fn available_copies(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BookInstance>>> {
    let copies = state.services.loans.available_copies().await?;
    Ok(Json(PaginatedResponse::slice(
        copies,
        &query,
        state.config.catalog.loans_per_page,
    )))
}

/// Get a copy
#[utoipa::path(
    get,
    path = "/instances/{id}",
    tag = "instances",
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Copy details", body = BookInstance),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_instance(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.catalog.get_instance(id).await?;
    Ok(Json(instance))
}

/// Register a new copy of a book
#[utoipa::path(
    post,
    path = "/books/{id}/instances",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = CreateBookInstance,
    responses(
        (status = 201, description = "Copy created", body = BookInstance),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing catalog_staff capability", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_instance(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Path(book_id): Path<i32>,
    Json(input): Json<CreateBookInstance>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    let instance = state
        .services
        .catalog
        .create_instance(book_id, input, caller.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// Proposed renewal date (three weeks from today)
#[utoipa::path(
    get,
    path = "/instances/{id}/renew",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Proposed date", body = ProposedRenewal),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned capability", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn proposed_renewal(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProposedRenewal>> {
    let renewal_date = state
        .services
        .loans
        .proposed_renewal(id, caller.as_ref(), today())
        .await?;

    Ok(Json(ProposedRenewal {
        instance_id: id,
        renewal_date,
    }))
}

/// Renew a copy until a new date (at most four weeks ahead)
#[utoipa::path(
    post,
    path = "/instances/{id}/renew",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    request_body = RenewRequest,
    responses(
        (status = 200, description = "Copy renewed", body = RenewResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned capability", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Renewal date in the past or too far ahead", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew_instance(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RenewRequest>,
) -> AppResult<Json<RenewResponse>> {
    let instance = state
        .services
        .loans
        .renew(id, request.renewal_date, caller.as_ref(), today())
        .await?;

    Ok(Json(RenewResponse {
        instance,
        next: OUTSTANDING_LOANS_PATH.to_string(),
    }))
}

/// Lend a copy to a borrower
#[utoipa::path(
    post,
    path = "/instances/{id}/lend",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    request_body = LendRequest,
    responses(
        (status = 200, description = "Copy lent", body = BookInstance),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned capability", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy or borrower not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy already on loan", body = crate::error::ErrorResponse),
        (status = 422, description = "Due date in the past or too far ahead", body = crate::error::ErrorResponse)
    )
)]
pub async fn lend_instance(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<Uuid>,
    Json(request): Json<LendRequest>,
) -> AppResult<Json<BookInstance>> {
    let instance = state
        .services
        .loans
        .lend(id, request, caller.as_ref(), today())
        .await?;
    Ok(Json(instance))
}

/// Mark a copy returned
#[utoipa::path(
    post,
    path = "/instances/{id}/return",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Copy returned and available", body = BookInstance),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned capability", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy is not on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_instance(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    let instance = state
        .services
        .loans
        .mark_returned(id, caller.as_ref())
        .await?;
    Ok(Json(instance))
}
