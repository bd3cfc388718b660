//! API handlers for the catalog REST endpoints

pub mod auth;
pub mod authors;
pub mod books;
pub mod catalog;
pub mod health;
pub mod instances;
pub mod loans;
pub mod openapi;
pub mod reference;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppError,
    models::{
        author::Author,
        book::Book,
        book_instance::{BookInstance, Loan},
        user::UserClaims,
    },
    AppState,
};

/// Caller identity taken from an optional bearer token.
///
/// No `Authorization` header means an anonymous caller; a header that does
/// not carry a valid token is rejected.
pub struct MaybeUser(pub Option<UserClaims>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(AUTHORIZATION) else {
            return Ok(MaybeUser(None));
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = state.services.auth.decode_token(token)?;
        Ok(MaybeUser(Some(claims)))
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[aliases(
    BookPage = PaginatedResponse<Book>,
    AuthorPage = PaginatedResponse<Author>,
    InstancePage = PaginatedResponse<BookInstance>,
    LoanPage = PaginatedResponse<Loan>
)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Items of the requested page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-based)
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Slice one page out of a complete, ordered list. Pages past the end are empty.
    pub fn slice(all: Vec<T>, query: &PageQuery, default_per_page: i64) -> Self {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(default_per_page).clamp(1, 100);
        let total = all.len() as i64;
        let skip = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);

        Self {
            items: all.into_iter().skip(skip).take(per_page as usize).collect(),
            total,
            page,
            per_page,
        }
    }
}

/// Page selection query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Local calendar date used for renewal and lending checks
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Catalog home
        .route("/catalog", get(catalog::summary))
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/books/:id/instances", post(instances::create_instance))
        // Reference data
        .route("/genres", get(reference::list_genres).post(reference::create_genre))
        .route(
            "/languages",
            get(reference::list_languages).post(reference::create_language),
        )
        // Copies
        .route("/instances/available", get(instances::available_copies))
        .route("/instances/:id", get(instances::get_instance))
        .route(
            "/instances/:id/renew",
            get(instances::proposed_renewal).post(instances::renew_instance),
        )
        .route("/instances/:id/lend", post(instances::lend_instance))
        .route("/instances/:id/return", post(instances::return_instance))
        // Loans
        .route("/loans", get(loans::all_loans))
        .route("/loans/mine", get(loans::my_loans))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
