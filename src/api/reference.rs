//! Genre and language endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::reference::{CreateNamed, Genre, Language},
};

use super::MaybeUser;

/// List genres
#[utoipa::path(
    get,
    path = "/genres",
    tag = "reference",
    responses(
        (status = 200, description = "All genres by name", body = Vec<Genre>)
    )
)]
pub async fn list_genres(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.services.catalog.list_genres().await?;
    Ok(Json(genres))
}

/// Create a genre
#[utoipa::path(
    post,
    path = "/genres",
    tag = "reference",
    security(("bearer_auth" = [])),
    request_body = CreateNamed,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Invalid name", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing catalog_staff capability", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_genre(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Json(input): Json<CreateNamed>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    let genre = state
        .services
        .catalog
        .create_genre(input, caller.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// List languages
#[utoipa::path(
    get,
    path = "/languages",
    tag = "reference",
    responses(
        (status = 200, description = "All languages by name", body = Vec<Language>)
    )
)]
pub async fn list_languages(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Language>>> {
    let languages = state.services.catalog.list_languages().await?;
    Ok(Json(languages))
}

/// Create a language
#[utoipa::path(
    post,
    path = "/languages",
    tag = "reference",
    security(("bearer_auth" = [])),
    request_body = CreateNamed,
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 400, description = "Invalid name", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing catalog_staff capability", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_language(
    State(state): State<crate::AppState>,
    MaybeUser(caller): MaybeUser,
    Json(input): Json<CreateNamed>,
) -> AppResult<(StatusCode, Json<Language>)> {
    let language = state
        .services
        .catalog
        .create_language(input, caller.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(language)))
}
