//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, catalog, health, instances, loans, reference};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "1.0.0",
        description = "Library catalog REST API: authors, books, copies and loans",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Catalog home
        catalog::summary,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Reference data
        reference::list_genres,
        reference::create_genre,
        reference::list_languages,
        reference::create_language,
        // Copies
        instances::available_copies,
        instances::get_instance,
        instances::create_instance,
        instances::proposed_renewal,
        instances::renew_instance,
        instances::lend_instance,
        instances::return_instance,
        // Loans
        loans::my_loans,
        loans::all_loans,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::LoginRequest,
            crate::models::user::Capability,
            auth::LoginResponse,
            auth::UserInfo,
            // Catalog home
            catalog::CatalogSummary,
            crate::services::catalog::CatalogCounts,
            // Authors
            crate::models::author::Author,
            crate::models::author::AuthorDetails,
            crate::models::author::AuthorInput,
            super::AuthorPage,
            // Books
            crate::models::book::Book,
            crate::models::book::BookDetails,
            crate::models::book::BookInput,
            super::BookPage,
            // Reference data
            crate::models::reference::Genre,
            crate::models::reference::Language,
            crate::models::reference::CreateNamed,
            // Copies
            crate::models::book_instance::BookInstance,
            crate::models::book_instance::Loan,
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::CreateBookInstance,
            crate::models::book_instance::RenewRequest,
            crate::models::book_instance::LendRequest,
            instances::ProposedRenewal,
            instances::RenewResponse,
            super::InstancePage,
            super::LoanPage,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "catalog", description = "Catalog home counts"),
        (name = "authors", description = "Author management"),
        (name = "books", description = "Book management"),
        (name = "reference", description = "Genres and languages"),
        (name = "instances", description = "Book copies: renewal, lending and return"),
        (name = "loans", description = "Loan listings")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
