use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        common::PageQuery,
        quiz::{
            AnswerRequest, AnswerResult, ConnectRequest, MatchPage, MatchView, MyMatchesQuery,
            ViewerQuery,
        },
    },
    error::AppError,
    services::match_service,
    state::SharedState,
};

/// Routes handling matchmaking, answers, and match views.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/quiz/connect", post(connect))
        .route("/quiz/answer", post(submit_answer))
        .route("/quiz/matches/{id}", get(get_match))
        .route("/quiz/matches", get(my_matches))
}

/// Join the waiting opponent or open a new waiting slot.
#[utoipa::path(
    post,
    path = "/quiz/connect",
    tag = "quiz",
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "Joined or created a match", body = MatchView),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn connect(
    State(state): State<SharedState>,
    Json(payload): Json<ConnectRequest>,
) -> Result<Json<MatchView>, AppError> {
    let view = match_service::connect(&state, payload.user_id).await?;
    Ok(Json(view))
}

/// Submit an answer to the caller's current question.
#[utoipa::path(
    post,
    path = "/quiz/answer",
    tag = "quiz",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = AnswerResult),
        (status = 409, description = "No active match accepting answers")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResult>, AppError> {
    payload.validate()?;
    let result = match_service::submit_answer(&state, payload.user_id, &payload.answer).await?;
    Ok(Json(result))
}

/// Fetch one match; only its participants may look.
#[utoipa::path(
    get,
    path = "/quiz/matches/{id}",
    tag = "quiz",
    params(
        ("id" = Uuid, Path, description = "Identifier of the match"),
        ViewerQuery
    ),
    responses(
        (status = 200, description = "Match details", body = MatchView),
        (status = 403, description = "Caller is not a participant"),
        (status = 404, description = "Match not found")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ViewerQuery>,
) -> Result<Json<MatchView>, AppError> {
    let view = match_service::get_match(&state, id, query.user_id).await?;
    Ok(Json(view))
}

/// Page through the caller's matches.
#[utoipa::path(
    get,
    path = "/quiz/matches",
    tag = "quiz",
    params(MyMatchesQuery),
    responses(
        (status = 200, description = "Page of the caller's matches", body = MatchPage)
    )
)]
pub async fn my_matches(
    State(state): State<SharedState>,
    Query(query): Query<MyMatchesQuery>,
) -> Result<Json<MatchPage>, AppError> {
    let paging = PageQuery {
        page: query.page,
        page_size: query.page_size,
        sort: None,
    };
    let page = match_service::my_matches(
        &state,
        query.user_id,
        paging.page(),
        paging.page_size(),
        query.sort.as_deref(),
    )
    .await?;
    Ok(Json(page))
}
