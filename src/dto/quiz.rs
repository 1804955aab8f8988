use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{AnswerEntity, MatchEntity, MatchStatus, ProgressEntity, Verdict},
    dto::format_system_time,
};

/// Payload for joining or opening a match.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConnectRequest {
    /// Caller's user identifier.
    pub user_id: Uuid,
}

/// Payload for submitting an answer to the caller's current question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    /// Caller's user identifier.
    pub user_id: Uuid,
    /// Raw answer text; compared trimmed and case-insensitive.
    #[validate(length(min = 1, message = "answer must not be empty"))]
    pub answer: String,
}

/// Query identifying the caller on read endpoints.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ViewerQuery {
    /// Caller's user identifier.
    pub user_id: Uuid,
}

/// Query parameters for listing the caller's matches.
#[derive(Debug, Deserialize, IntoParams)]
pub struct MyMatchesQuery {
    /// Caller's user identifier.
    pub user_id: Uuid,
    /// 1-based page number.
    pub page: Option<usize>,
    /// Items per page.
    pub page_size: Option<usize>,
    /// Sort criteria, e.g. `created_at:asc`.
    pub sort: Option<String>,
}

/// Public projection of a match lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatusDto {
    /// Waiting for a second player.
    Pending,
    /// Both players attached; answers are accepted.
    Active,
    /// Closed; scores are final.
    Finished,
}

impl From<MatchStatus> for MatchStatusDto {
    fn from(status: MatchStatus) -> Self {
        match status {
            MatchStatus::Pending => MatchStatusDto::Pending,
            MatchStatus::Active => MatchStatusDto::Active,
            MatchStatus::Finished => MatchStatusDto::Finished,
        }
    }
}

/// Public projection of an answer verdict.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerdictDto {
    /// The answer was accepted.
    Correct,
    /// The answer was not accepted.
    Incorrect,
}

impl From<Verdict> for VerdictDto {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Correct => VerdictDto::Correct,
            Verdict::Incorrect => VerdictDto::Incorrect,
        }
    }
}

/// Question as shown to a player (accepted answers are never exposed).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionView {
    /// Catalog identifier of the question.
    pub id: Uuid,
    /// Question text.
    pub body: String,
}

/// One recorded answer in the caller's own progress.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnswerView {
    /// Question the answer targets.
    pub question_id: Uuid,
    /// Whether the answer was accepted.
    pub verdict: VerdictDto,
    /// When the answer was recorded (RFC 3339).
    pub answered_at: String,
}

impl From<&AnswerEntity> for AnswerView {
    fn from(answer: &AnswerEntity) -> Self {
        Self {
            question_id: answer.question_id,
            verdict: answer.verdict.into(),
            answered_at: format_system_time(answer.answered_at),
        }
    }
}

/// The caller's own progress within a match.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnProgressView {
    /// Caller's user identifier.
    pub user_id: Uuid,
    /// Display name from the user directory.
    pub display_name: String,
    /// Current score.
    pub score: u32,
    /// Ordered answers recorded so far.
    pub answers: Vec<AnswerView>,
    /// Whether the speed bonus was granted.
    pub bonus_applied: bool,
}

/// Opponent progress summary; per-answer verdicts stay hidden while playing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OpponentProgressView {
    /// Opponent's user identifier.
    pub user_id: Uuid,
    /// Display name from the user directory.
    pub display_name: String,
    /// Current score.
    pub score: u32,
    /// Number of questions the opponent has answered.
    pub answered: usize,
    /// Whether the opponent has answered the full set.
    pub completed: bool,
    /// Whether the speed bonus was granted.
    pub bonus_applied: bool,
}

/// Projection of a match for one of its participants.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchView {
    /// Match identifier.
    pub id: Uuid,
    /// Lifecycle status.
    pub status: MatchStatusDto,
    /// When the waiting slot was opened (RFC 3339).
    pub created_at: String,
    /// When the second player attached, if paired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// When the match was finalized, if finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    /// Deadline for the slower player, while armed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_deadline: Option<String>,
    /// The caller's next unanswered question, while the match is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<QuestionView>,
    /// The caller's own progress.
    pub you: OwnProgressView,
    /// The opponent's progress, once paired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent: Option<OpponentProgressView>,
}

impl MatchView {
    /// Project `entity` for `viewer`, with display names already resolved.
    ///
    /// Callers must have verified that `viewer` participates in the match.
    pub fn project(
        entity: &MatchEntity,
        viewer: Uuid,
        viewer_name: String,
        opponent_name: Option<String>,
    ) -> Option<Self> {
        let own = entity.progress_of(viewer)?;
        let opponent = entity.opponent_of(viewer);
        let total = entity.questions.len();

        let current_question = if entity.status == MatchStatus::Active {
            entity
                .questions
                .get(own.answers.len())
                .map(|question| QuestionView {
                    id: question.id,
                    body: question.body.clone(),
                })
        } else {
            None
        };

        Some(Self {
            id: entity.id,
            status: entity.status.into(),
            created_at: format_system_time(entity.pair_created_at),
            started_at: entity.started_at.map(format_system_time),
            finished_at: entity.finished_at.map(format_system_time),
            finish_deadline: entity.finish_deadline.map(format_system_time),
            current_question,
            you: own_progress_view(own, viewer_name),
            opponent: opponent.map(|progress| OpponentProgressView {
                user_id: progress.user_id,
                display_name: opponent_name.unwrap_or_else(|| progress.user_id.to_string()),
                score: progress.score,
                answered: progress.answers.len(),
                completed: total > 0 && progress.answers.len() >= total,
                bonus_applied: progress.bonus_applied,
            }),
        })
    }
}

fn own_progress_view(progress: &ProgressEntity, display_name: String) -> OwnProgressView {
    OwnProgressView {
        user_id: progress.user_id,
        display_name,
        score: progress.score,
        answers: progress.answers.iter().map(AnswerView::from).collect(),
        bonus_applied: progress.bonus_applied,
    }
}

/// Verdict and running score returned after an answer submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResult {
    /// Match the answer was recorded in.
    pub match_id: Uuid,
    /// Whether the answer was accepted.
    pub verdict: VerdictDto,
    /// Caller's score after this answer.
    pub running_score: u32,
    /// Number of questions the caller has answered.
    pub answered: usize,
    /// Whether the match was finalized by this submission.
    pub match_finished: bool,
}

/// One page of the caller's matches.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchPage {
    /// Matches on this page.
    pub items: Vec<MatchView>,
    /// 1-based page number.
    pub page: usize,
    /// Requested page size.
    pub page_size: usize,
    /// Total matches across all pages.
    pub total: usize,
}
