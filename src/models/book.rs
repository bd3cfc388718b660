//! Book (catalog title) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{
    author::Author,
    book_instance::BookInstance,
    reference::{Genre, Language},
};

/// Full book model from database.
///
/// Genres are held as explicit ids (backed by the `book_genres` join table);
/// callers resolve them through the reference repository when they need names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: i32,
    pub language_id: i32,
    pub genre_ids: Vec<i32>,
}

/// Genre names joined for display, e.g. "Fantasy, Horror"
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Book with its relations resolved
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub author: Author,
    pub language: Language,
    pub genres: Vec<Genre>,
    pub display_genre: String,
    pub instances: Vec<BookInstance>,
}

/// Create or update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    pub summary: String,
    #[validate(custom(function = "crate::validation::validate_isbn"))]
    pub isbn: String,
    pub author_id: i32,
    pub language_id: i32,
    #[validate(length(min = 1, message = "A book needs at least one genre"))]
    pub genre_ids: Vec<i32>,
}

/// Book list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive title substring
    pub title: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
