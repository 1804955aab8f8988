use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Number of questions bound to every match at pairing time.
pub const QUESTIONS_PER_MATCH: usize = 5;

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// One player is waiting for an opponent; no questions bound yet.
    Pending,
    /// Both players are attached and answering the shared question set.
    Active,
    /// The match is closed and immutable; scores are final.
    Finished,
}

/// Outcome recorded for a single submitted answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The answer matched one of the accepted answers.
    Correct,
    /// The answer did not match any accepted answer.
    Incorrect,
}

/// Trivia question as authored in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Question text shown to players.
    pub body: String,
    /// Set of answers counted as correct.
    pub accepted_answers: Vec<String>,
    /// Only published questions are eligible for matches.
    pub published: bool,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the question was updated.
    pub updated_at: SystemTime,
}

/// Snapshot of a question frozen into a match at pairing time.
///
/// Later catalog edits must never change an in-flight match, so the match
/// carries its own copy of the body and accepted answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundQuestion {
    /// Identifier of the catalog question this snapshot was taken from.
    pub id: Uuid,
    /// Question text shown to players.
    pub body: String,
    /// Accepted answers at the time the match was paired.
    pub accepted_answers: Vec<String>,
}

impl From<QuestionEntity> for BoundQuestion {
    fn from(question: QuestionEntity) -> Self {
        Self {
            id: question.id,
            body: question.body,
            accepted_answers: question.accepted_answers,
        }
    }
}

/// A single recorded answer. Append-only; never mutated once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    /// Question this answer targets (always `questions[i]` for answer `i`).
    pub question_id: Uuid,
    /// Whether the answer was accepted.
    pub verdict: Verdict,
    /// When the answer was recorded.
    pub answered_at: SystemTime,
}

/// One player's running state within a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEntity {
    /// Identifier of the player in the external user store.
    pub user_id: Uuid,
    /// Current score: one point per correct answer plus at most one bonus.
    pub score: u32,
    /// Ordered answers; `answers[i]` corresponds to `questions[i]`.
    pub answers: Vec<AnswerEntity>,
    /// Whether the speed bonus has been granted to this player.
    pub bonus_applied: bool,
}

impl ProgressEntity {
    /// Fresh progress for a player joining a match.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            score: 0,
            answers: Vec::new(),
            bonus_applied: false,
        }
    }

    /// Timestamp of the final answer, present once all questions are answered.
    pub fn completed_at(&self, total_questions: usize) -> Option<SystemTime> {
        if total_questions > 0 && self.answers.len() >= total_questions {
            self.answers.last().map(|answer| answer.answered_at)
        } else {
            None
        }
    }
}

/// Result of applying the finalization routine to a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeApplied {
    /// The match transitioned to finished; carries the bonus recipient, if any.
    Closed {
        /// Player granted the speed bonus, when the fast player scored > 0.
        bonus_user: Option<Uuid>,
    },
    /// The match was already finished; nothing changed.
    AlreadyFinished,
}

/// Aggregate match entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Primary key of the match.
    pub id: Uuid,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// When the waiting slot was opened by the first player.
    pub pair_created_at: SystemTime,
    /// When the second player attached and the questions were bound.
    pub started_at: Option<SystemTime>,
    /// When the match was finalized.
    pub finished_at: Option<SystemTime>,
    /// Deadline for the slower player once the faster one has finished.
    pub finish_deadline: Option<SystemTime>,
    /// Frozen question set, bound at pairing time (empty while pending).
    pub questions: Vec<BoundQuestion>,
    /// Progress of the player who opened the match.
    pub player_one: ProgressEntity,
    /// Progress of the player who joined; `None` iff the match is pending.
    pub player_two: Option<ProgressEntity>,
}

impl MatchEntity {
    /// Open a new waiting slot for `user_id`.
    pub fn pending(user_id: Uuid, now: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: MatchStatus::Pending,
            pair_created_at: now,
            started_at: None,
            finished_at: None,
            finish_deadline: None,
            questions: Vec::new(),
            player_one: ProgressEntity::new(user_id),
            player_two: None,
        }
    }

    /// Whether `user_id` plays in this match.
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.progress_of(user_id).is_some()
    }

    /// Progress for `user_id`, if they participate.
    pub fn progress_of(&self, user_id: Uuid) -> Option<&ProgressEntity> {
        if self.player_one.user_id == user_id {
            Some(&self.player_one)
        } else {
            self.player_two
                .as_ref()
                .filter(|progress| progress.user_id == user_id)
        }
    }

    /// Mutable progress for `user_id`, if they participate.
    pub fn progress_of_mut(&mut self, user_id: Uuid) -> Option<&mut ProgressEntity> {
        if self.player_one.user_id == user_id {
            Some(&mut self.player_one)
        } else {
            self.player_two
                .as_mut()
                .filter(|progress| progress.user_id == user_id)
        }
    }

    /// Progress of the opponent of `user_id`, if both players are attached.
    pub fn opponent_of(&self, user_id: Uuid) -> Option<&ProgressEntity> {
        if self.player_one.user_id == user_id {
            self.player_two.as_ref()
        } else if self
            .player_two
            .as_ref()
            .is_some_and(|progress| progress.user_id == user_id)
        {
            Some(&self.player_one)
        } else {
            None
        }
    }

    /// Whether every attached player has answered the full question set.
    pub fn both_complete(&self) -> bool {
        let total = self.questions.len();
        total > 0
            && self.player_one.answers.len() >= total
            && self
                .player_two
                .as_ref()
                .is_some_and(|progress| progress.answers.len() >= total)
    }

    /// Selection predicate used by the finisher sweep.
    pub fn due_for_finish(&self, now: SystemTime) -> bool {
        self.status == MatchStatus::Active
            && (self.both_complete()
                || self
                    .finish_deadline
                    .is_some_and(|deadline| deadline <= now))
    }

    /// The player who completed the full set first, by fifth-answer timestamp.
    ///
    /// When only one side completed, that side is the fast player by definition.
    pub fn fast_player(&self) -> Option<Uuid> {
        let total = self.questions.len();
        let one = self.player_one.completed_at(total);
        let two = self
            .player_two
            .as_ref()
            .and_then(|progress| progress.completed_at(total));

        match (one, two) {
            (Some(first), Some(second)) => {
                if first <= second {
                    Some(self.player_one.user_id)
                } else {
                    self.player_two.as_ref().map(|progress| progress.user_id)
                }
            }
            (Some(_), None) => Some(self.player_one.user_id),
            (None, Some(_)) => self.player_two.as_ref().map(|progress| progress.user_id),
            (None, None) => None,
        }
    }

    /// Close the match: grant the speed bonus, clear the deadline, freeze state.
    ///
    /// Idempotent: an already-finished match is left untouched, so concurrent
    /// sweeps finalizing the same match converge on one end state.
    pub fn finalize(&mut self, now: SystemTime) -> FinalizeApplied {
        if self.status == MatchStatus::Finished {
            return FinalizeApplied::AlreadyFinished;
        }

        let mut bonus_user = None;
        if let Some(fast_user) = self.fast_player()
            && let Some(progress) = self.progress_of_mut(fast_user)
            && progress.score > 0
        {
            progress.score += 1;
            progress.bonus_applied = true;
            bonus_user = Some(fast_user);
        }

        self.finish_deadline = None;
        self.status = MatchStatus::Finished;
        self.finished_at = Some(now);

        FinalizeApplied::Closed { bonus_user }
    }

    /// Deadline granted to the slower player once the faster one finishes.
    pub fn arm_finish_deadline(&mut self, now: SystemTime, grace_window: Duration) {
        self.finish_deadline = Some(now + grace_window);
    }
}

/// Compare a raw submission against the accepted answers of a question.
///
/// Comparison trims surrounding whitespace and ignores case.
pub fn answer_matches(accepted_answers: &[String], raw_answer: &str) -> bool {
    let given = raw_answer.trim().to_lowercase();
    accepted_answers
        .iter()
        .any(|accepted| accepted.trim().to_lowercase() == given)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_question() -> BoundQuestion {
        BoundQuestion {
            id: Uuid::new_v4(),
            body: "capital of France?".into(),
            accepted_answers: vec!["Paris".into()],
        }
    }

    fn active_match(now: SystemTime) -> MatchEntity {
        let mut game = MatchEntity::pending(Uuid::new_v4(), now);
        game.player_two = Some(ProgressEntity::new(Uuid::new_v4()));
        game.questions = (0..QUESTIONS_PER_MATCH).map(|_| bound_question()).collect();
        game.status = MatchStatus::Active;
        game.started_at = Some(now);
        game
    }

    fn answer_all(game: &mut MatchEntity, user_id: Uuid, correct: usize, finished_at: SystemTime) {
        let questions = game.questions.clone();
        let progress = game.progress_of_mut(user_id).unwrap();
        for (index, question) in questions.iter().enumerate() {
            let verdict = if index < correct {
                Verdict::Correct
            } else {
                Verdict::Incorrect
            };
            if verdict == Verdict::Correct {
                progress.score += 1;
            }
            progress.answers.push(AnswerEntity {
                question_id: question.id,
                verdict,
                answered_at: finished_at,
            });
        }
    }

    #[test]
    fn answer_matching_ignores_case_and_whitespace() {
        let accepted = vec!["Paris".to_string(), " Lutetia ".to_string()];
        assert!(answer_matches(&accepted, "paris"));
        assert!(answer_matches(&accepted, "  PARIS  "));
        assert!(answer_matches(&accepted, "lutetia"));
        assert!(!answer_matches(&accepted, "London"));
        assert!(!answer_matches(&accepted, ""));
    }

    #[test]
    fn fast_player_prefers_earlier_completion() {
        let now = SystemTime::now();
        let mut game = active_match(now);
        let one = game.player_one.user_id;
        let two = game.player_two.as_ref().unwrap().user_id;

        answer_all(&mut game, one, 4, now);
        answer_all(&mut game, two, 5, now + Duration::from_secs(3));

        assert_eq!(game.fast_player(), Some(one));
    }

    #[test]
    fn sole_finisher_is_fast_player() {
        let now = SystemTime::now();
        let mut game = active_match(now);
        let two = game.player_two.as_ref().unwrap().user_id;

        answer_all(&mut game, two, 2, now);

        assert_eq!(game.fast_player(), Some(two));
    }

    #[test]
    fn finalize_grants_bonus_only_with_positive_score() {
        let now = SystemTime::now();
        let mut game = active_match(now);
        let one = game.player_one.user_id;
        let two = game.player_two.as_ref().unwrap().user_id;

        // Fast player finished with zero correct answers: no bonus.
        answer_all(&mut game, one, 0, now);
        answer_all(&mut game, two, 3, now + Duration::from_secs(1));

        let applied = game.finalize(now + Duration::from_secs(12));
        assert_eq!(applied, FinalizeApplied::Closed { bonus_user: None });
        assert_eq!(game.status, MatchStatus::Finished);
        assert_eq!(game.progress_of(one).unwrap().score, 0);
        assert!(!game.progress_of(one).unwrap().bonus_applied);
        assert_eq!(game.progress_of(two).unwrap().score, 3);
    }

    #[test]
    fn finalize_applies_speed_bonus_to_fast_scorer() {
        let now = SystemTime::now();
        let mut game = active_match(now);
        let one = game.player_one.user_id;
        let two = game.player_two.as_ref().unwrap().user_id;

        answer_all(&mut game, one, 4, now);
        answer_all(&mut game, two, 3, now + Duration::from_secs(5));

        let applied = game.finalize(now + Duration::from_secs(12));
        assert_eq!(applied, FinalizeApplied::Closed {
            bonus_user: Some(one)
        });
        let winner = game.progress_of(one).unwrap();
        assert_eq!(winner.score, 5);
        assert!(winner.bonus_applied);
        assert!(game.finish_deadline.is_none());
        assert!(game.finished_at.is_some());
    }

    #[test]
    fn finalize_twice_is_a_no_op() {
        let now = SystemTime::now();
        let mut game = active_match(now);
        let one = game.player_one.user_id;
        let two = game.player_two.as_ref().unwrap().user_id;

        answer_all(&mut game, one, 4, now);
        answer_all(&mut game, two, 3, now + Duration::from_secs(1));

        game.finalize(now + Duration::from_secs(12));
        let first = game.clone();
        let applied = game.finalize(now + Duration::from_secs(20));

        assert_eq!(applied, FinalizeApplied::AlreadyFinished);
        assert_eq!(game, first);
    }

    #[test]
    fn due_for_finish_requires_deadline_or_both_complete() {
        let now = SystemTime::now();
        let mut game = active_match(now);
        let one = game.player_one.user_id;

        assert!(!game.due_for_finish(now));

        answer_all(&mut game, one, 5, now);
        game.arm_finish_deadline(now, Duration::from_secs(10));
        assert!(!game.due_for_finish(now + Duration::from_secs(9)));
        assert!(game.due_for_finish(now + Duration::from_secs(10)));

        let two = game.player_two.as_ref().unwrap().user_id;
        answer_all(&mut game, two, 1, now + Duration::from_secs(2));
        assert!(game.due_for_finish(now + Duration::from_secs(3)));
    }
}
