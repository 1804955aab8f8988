pub mod memory;

use std::time::{Duration, SystemTime};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{AnswerEntity, BoundQuestion, MatchEntity};
use crate::dao::storage::StorageResult;

/// Outcome of a matchmaking connect call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// No pending slot was available; the caller now waits for an opponent.
    Created(MatchEntity),
    /// The caller was attached as the second player and the match went active.
    Joined(MatchEntity),
    /// The caller already owns the pending slot; returned unchanged.
    AlreadyWaiting(MatchEntity),
}

impl ConnectOutcome {
    /// The match carried by any outcome variant.
    pub fn into_match(self) -> MatchEntity {
        match self {
            ConnectOutcome::Created(entity)
            | ConnectOutcome::Joined(entity)
            | ConnectOutcome::AlreadyWaiting(entity) => entity,
        }
    }
}

/// Outcome of an optimistic answer append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The answer was recorded; carries the updated match.
    Recorded(Box<MatchEntity>),
    /// Another writer advanced the player's progress since the caller read it.
    OutOfSync,
    /// The match is not active, the user does not participate, or the set is
    /// already fully answered.
    NotEligible,
}

/// Outcome of a conditional finalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The match was closed by this call; carries the finalized match.
    Finalized(Box<MatchEntity>),
    /// A concurrent finalize got there first; nothing changed.
    AlreadyFinished,
    /// The match is active but no longer meets the finish predicate.
    NotDue,
    /// No match exists under this identifier.
    NotFound,
}

/// Abstraction over the persistence layer for matches and player progress.
///
/// Every method is one atomic read-modify-write: implementations must
/// serialize writes to the same match and guard the pending-slot lookup so
/// that at most one caller ever attaches as the second player.
pub trait MatchStore: Send + Sync {
    /// Join the pending match or open a new waiting slot.
    ///
    /// `questions` is a freshly sampled set; it is bound only on the join
    /// path so both players always receive an identical frozen set.
    fn connect(
        &self,
        user_id: Uuid,
        questions: Vec<BoundQuestion>,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<ConnectOutcome>>;

    /// Fetch a match by id.
    fn find(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;

    /// The most recently started active match in which `user_id` plays.
    fn find_active_for_user(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;

    /// Append an answer for `user_id`, guarded by the answer index the caller
    /// read. Increments the score on a correct verdict, arms the finish
    /// deadline on the player's final answer, and finalizes in place when
    /// both players are done.
    fn append_answer(
        &self,
        match_id: Uuid,
        user_id: Uuid,
        expected_index: usize,
        answer: AnswerEntity,
        grace_window: Duration,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<AppendOutcome>>;

    /// Identifiers of active matches meeting the finish predicate at `now`.
    fn due_for_finish(&self, now: SystemTime) -> BoxFuture<'static, StorageResult<Vec<Uuid>>>;

    /// Conditionally finalize a match; a no-op when it is already finished.
    fn finalize(
        &self,
        match_id: Uuid,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<FinalizeOutcome>>;

    /// Every match in which `user_id` plays, most recently created first.
    fn matches_for_user(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;

    /// Every finished match, in finalization order (the statistics read path).
    fn finished_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;
}
