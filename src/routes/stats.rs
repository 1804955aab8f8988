use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        common::PageQuery,
        stats::{LeaderboardPage, StatsView},
    },
    error::AppError,
    services::stats_service,
    state::SharedState,
};

/// Routes exposing the statistics read path.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/quiz/users/{id}/statistics", get(user_statistics))
        .route("/quiz/leaderboard", get(leaderboard))
}

/// Aggregated statistics for one user over their finished matches.
#[utoipa::path(
    get,
    path = "/quiz/users/{id}/statistics",
    tag = "stats",
    params(("id" = Uuid, Path, description = "Identifier of the user")),
    responses(
        (status = 200, description = "User statistics", body = StatsView),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn user_statistics(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatsView>, AppError> {
    let stats = stats_service::statistics(&state, id).await?;
    Ok(Json(stats))
}

/// Page through the global leaderboard.
#[utoipa::path(
    get,
    path = "/quiz/leaderboard",
    tag = "stats",
    params(PageQuery),
    responses(
        (status = 200, description = "Leaderboard page", body = LeaderboardPage),
        (status = 400, description = "Invalid sort criteria")
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<LeaderboardPage>, AppError> {
    let page = stats_service::leaderboard(
        &state,
        query.sort.as_deref(),
        query.page(),
        query.page_size(),
    )
    .await?;
    Ok(Json(page))
}
