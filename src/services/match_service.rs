//! Matchmaking and answer processing over the match store.

use std::time::SystemTime;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        match_store::{AppendOutcome, ConnectOutcome},
        models::{AnswerEntity, BoundQuestion, MatchEntity, MatchStatus, Verdict, answer_matches},
    },
    dto::{
        common::paginate,
        quiz::{AnswerResult, MatchPage, MatchView},
        sort::{MatchSortField, SortCriterion, SortDirection, parse_criteria},
    },
    error::ServiceError,
    state::SharedState,
};

/// Submissions that keep losing the optimistic race are abandoned after this
/// many attempts.
const MAX_SUBMIT_ATTEMPTS: usize = 3;

/// Join the pending match or open a new waiting slot for `user_id`.
pub async fn connect(state: &SharedState, user_id: Uuid) -> Result<MatchView, ServiceError> {
    ensure_user_exists(state, user_id).await?;

    // Sampled before the store's critical section; only bound on the join
    // path, so the frozen set always comes from the pairing moment.
    let needed = state.config().questions_per_match;
    let sampled = state.catalog().sample_published(needed).await?;
    if sampled.len() < needed {
        return Err(ServiceError::InsufficientQuestions {
            available: sampled.len(),
            needed,
        });
    }
    let questions: Vec<BoundQuestion> = sampled.into_iter().map(BoundQuestion::from).collect();

    let outcome = state
        .matches()
        .connect(user_id, questions, SystemTime::now())
        .await?;

    match &outcome {
        ConnectOutcome::Created(game) => {
            info!(match_id = %game.id, %user_id, "opened a new waiting slot")
        }
        ConnectOutcome::Joined(game) => {
            info!(match_id = %game.id, %user_id, "second player joined; match active")
        }
        ConnectOutcome::AlreadyWaiting(game) => {
            debug!(match_id = %game.id, %user_id, "caller already waiting for an opponent")
        }
    }

    build_view(state, &outcome.into_match(), user_id).await
}

/// Evaluate and record an answer for the caller's current question.
pub async fn submit_answer(
    state: &SharedState,
    user_id: Uuid,
    raw_answer: &str,
) -> Result<AnswerResult, ServiceError> {
    ensure_user_exists(state, user_id).await?;
    let store = state.matches();
    let grace_window = state.config().grace_window;

    for _ in 0..MAX_SUBMIT_ATTEMPTS {
        let Some(game) = store.find_active_for_user(user_id).await? else {
            return Err(ServiceError::NoActiveMatch);
        };
        let Some(progress) = game.progress_of(user_id) else {
            return Err(ServiceError::NoActiveMatch);
        };

        let index = progress.answers.len();
        let Some(question) = game.questions.get(index) else {
            // Caller already answered the full set; the match is waiting on
            // the opponent or the sweep.
            return Err(ServiceError::NoActiveMatch);
        };

        let verdict = if answer_matches(&question.accepted_answers, raw_answer) {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        };
        let answer = AnswerEntity {
            question_id: question.id,
            verdict,
            answered_at: SystemTime::now(),
        };

        match store
            .append_answer(game.id, user_id, index, answer, grace_window, SystemTime::now())
            .await?
        {
            AppendOutcome::Recorded(updated) => {
                let running_score = updated
                    .progress_of(user_id)
                    .map(|progress| progress.score)
                    .unwrap_or_default();
                debug!(
                    match_id = %updated.id,
                    %user_id,
                    ?verdict,
                    running_score,
                    "answer recorded"
                );
                return Ok(AnswerResult {
                    match_id: updated.id,
                    verdict: verdict.into(),
                    running_score,
                    answered: index + 1,
                    match_finished: updated.status == MatchStatus::Finished,
                });
            }
            AppendOutcome::OutOfSync => {
                // A concurrent writer advanced the match; re-read and retry.
                debug!(match_id = %game.id, %user_id, "answer append lost a race; retrying");
                continue;
            }
            AppendOutcome::NotEligible => return Err(ServiceError::NoActiveMatch),
        }
    }

    Err(ServiceError::Conflict(
        "answer submission kept racing with concurrent writes".into(),
    ))
}

/// Fetch a match by id for one of its participants.
pub async fn get_match(
    state: &SharedState,
    match_id: Uuid,
    user_id: Uuid,
) -> Result<MatchView, ServiceError> {
    let Some(game) = state.matches().find(match_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "match `{match_id}` not found"
        )));
    };
    if !game.is_participant(user_id) {
        return Err(ServiceError::Forbidden(
            "only participants may view a match".into(),
        ));
    }
    build_view(state, &game, user_id).await
}

/// List the caller's matches, newest first unless the sort says otherwise.
pub async fn my_matches(
    state: &SharedState,
    user_id: Uuid,
    page: usize,
    page_size: usize,
    sort: Option<&str>,
) -> Result<MatchPage, ServiceError> {
    ensure_user_exists(state, user_id).await?;

    let criteria: Vec<SortCriterion<MatchSortField>> = match sort {
        Some(raw) => parse_criteria(raw)
            .map_err(|err| ServiceError::InvalidInput(err.to_string()))?,
        None => Vec::new(),
    };

    // The store returns newest first; only an explicit ascending sort flips it.
    let mut games = state.matches().matches_for_user(user_id).await?;
    if let Some(criterion) = criteria.first()
        && criterion.field == MatchSortField::CreatedAt
        && criterion.direction == SortDirection::Asc
    {
        games.reverse();
    }

    let (page_items, total) = paginate(games, page, page_size);
    let mut items = Vec::with_capacity(page_items.len());
    for game in &page_items {
        items.push(build_view(state, game, user_id).await?);
    }

    Ok(MatchPage {
        items,
        page,
        page_size,
        total,
    })
}

async fn ensure_user_exists(state: &SharedState, user_id: Uuid) -> Result<(), ServiceError> {
    if state.users().exists(user_id).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("user `{user_id}` not found")))
    }
}

/// Resolve display names and project the match for `viewer`.
async fn build_view(
    state: &SharedState,
    game: &MatchEntity,
    viewer: Uuid,
) -> Result<MatchView, ServiceError> {
    let users = state.users();
    let viewer_name = users
        .display_name(viewer)
        .await?
        .unwrap_or_else(|| viewer.to_string());
    let opponent_name = match game.opponent_of(viewer) {
        Some(progress) => users.display_name(progress.user_id).await?,
        None => None,
    };

    MatchView::project(game, viewer, viewer_name, opponent_name).ok_or_else(|| {
        ServiceError::Forbidden("only participants may view a match".into())
    })
}
