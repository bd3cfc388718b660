//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::book::{Book, BookDetails, BookInput, BookQuery},
};

use super::{BookPage, MaybeUser, PageQuery, PaginatedResponse};

/// List books, optionally filtered by a title substring
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Page of books ordered by title", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let books = state
        .services
        .catalog
        .list_books(query.title.as_deref())
        .await?;

    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    };
    Ok(Json(PaginatedResponse::slice(
        books,
        &page,
        state.config.catalog.books_per_page,
    )))
}

/// Get book details
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book with author, language, genres and copies", body = BookDetails),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing catalog_staff capability", body = crate::error::ErrorResponse),
        (status = 404, description = "Author, language or genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Json(input): Json<BookInput>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state
        .services
        .catalog
        .create_book(input, caller.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing catalog_staff capability", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or a referenced record not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<i32>,
    Json(input): Json<BookInput>,
) -> AppResult<Json<Book>> {
    let book = state
        .services
        .catalog
        .update_book(id, input, caller.as_ref())
        .await?;
    Ok(Json(book))
}

/// Delete a book without copies
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing catalog_staff capability", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book still has copies", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(id, caller.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
