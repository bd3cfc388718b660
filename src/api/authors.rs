//! Author endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::author::{Author, AuthorDetails, AuthorInput},
};

use super::{AuthorPage, MaybeUser, PageQuery, PaginatedResponse};

/// List authors by last name
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of authors", body = AuthorPage)
    )
)]
pub async fn list_authors(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Author>>> {
    let authors = state.services.catalog.list_authors().await?;
    Ok(Json(PaginatedResponse::slice(
        authors,
        &query,
        state.config.catalog.authors_per_page,
    )))
}

/// Get author details with their books
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDetails),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetails>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Create an author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorInput,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing catalog_staff capability", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Json(input): Json<AuthorInput>,
) -> AppResult<(StatusCode, Json<Author>)> {
    let author = state
        .services
        .catalog
        .create_author(input, caller.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// Update an author
#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    request_body = AuthorInput,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing catalog_staff capability", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<i32>,
    Json(input): Json<AuthorInput>,
) -> AppResult<Json<Author>> {
    let author = state
        .services
        .catalog
        .update_author(id, input, caller.as_ref())
        .await?;
    Ok(Json(author))
}

/// Delete an author without books
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing catalog_staff capability", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Author still has books", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_author(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state
        .services
        .catalog
        .delete_author(id, caller.as_ref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
