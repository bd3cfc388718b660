//! Catalog home endpoint: headline counts and the session visit counter

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{error::AppResult, services::catalog::CatalogCounts};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// Also count titles containing this phrase (case-insensitive)
    pub title: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CatalogSummary {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    /// Visits this session made before the current one
    pub num_visits: u64,
}

/// Random 32-character session key
fn new_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Catalog summary
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Catalog counts and session visit count", body = CatalogSummary)
    )
)]
pub async fn summary(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    Query(query): Query<SummaryQuery>,
) -> AppResult<(CookieJar, Json<CatalogSummary>)> {
    let cookie_name = state.config.session.cookie_name.clone();
    let session_id = match jar.get(&cookie_name) {
        Some(cookie) => cookie.value().to_string(),
        None => new_session_id(),
    };

    let num_visits = state.services.sessions.record_visit(&session_id).await?;
    let counts = state.services.catalog.summary(query.title.as_deref()).await?;

    let cookie = Cookie::build((cookie_name, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((jar.add(cookie), Json(CatalogSummary { counts, num_visits })))
}
