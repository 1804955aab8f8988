//! In-memory match store honoring the engine's atomicity rules.
//!
//! Matches live in a [`DashMap`]; every mutation happens under the map's
//! per-entry lock, so writes to the same match are serialized. The global
//! waiting slot is a single id behind a [`Mutex`], which removes the
//! check-then-act race on "find the one pending match".

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::dao::match_store::{AppendOutcome, ConnectOutcome, FinalizeOutcome, MatchStore};
use crate::dao::models::{AnswerEntity, BoundQuestion, MatchEntity, MatchStatus, ProgressEntity, Verdict};
use crate::dao::storage::StorageResult;

/// Process-local [`MatchStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryMatchStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    matches: DashMap<Uuid, MatchEntity>,
    /// Identifier of the single pending match, when one exists.
    pending: Mutex<Option<Uuid>>,
    /// Finalization order, preserved for the statistics read path.
    finished_order: Mutex<Vec<Uuid>>,
}

impl MemoryMatchStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    async fn connect(
        &self,
        user_id: Uuid,
        questions: Vec<BoundQuestion>,
        now: SystemTime,
    ) -> StorageResult<ConnectOutcome> {
        let mut pending = self.pending.lock().await;

        if let Some(pending_id) = *pending
            && let Some(mut entry) = self.matches.get_mut(&pending_id)
        {
            let game = entry.value_mut();
            if game.player_one.user_id == user_id {
                return Ok(ConnectOutcome::AlreadyWaiting(game.clone()));
            }

            game.player_two = Some(ProgressEntity::new(user_id));
            game.questions = questions;
            game.status = MatchStatus::Active;
            game.started_at = Some(now);
            let snapshot = game.clone();
            drop(entry);

            *pending = None;
            return Ok(ConnectOutcome::Joined(snapshot));
        }

        let game = MatchEntity::pending(user_id, now);
        *pending = Some(game.id);
        self.matches.insert(game.id, game.clone());
        Ok(ConnectOutcome::Created(game))
    }

    async fn append_answer(
        &self,
        match_id: Uuid,
        user_id: Uuid,
        expected_index: usize,
        answer: AnswerEntity,
        grace_window: Duration,
        now: SystemTime,
    ) -> StorageResult<AppendOutcome> {
        let finalized;
        let snapshot;
        {
            let Some(mut entry) = self.matches.get_mut(&match_id) else {
                return Ok(AppendOutcome::NotEligible);
            };
            let game = entry.value_mut();

            if game.status != MatchStatus::Active {
                return Ok(AppendOutcome::NotEligible);
            }

            let total = game.questions.len();
            let expected_question = game.questions.get(expected_index).map(|question| question.id);
            let Some(progress) = game.progress_of_mut(user_id) else {
                return Ok(AppendOutcome::NotEligible);
            };

            if progress.answers.len() >= total {
                return Ok(AppendOutcome::NotEligible);
            }
            if progress.answers.len() != expected_index
                || expected_question != Some(answer.question_id)
            {
                return Ok(AppendOutcome::OutOfSync);
            }

            if answer.verdict == Verdict::Correct {
                progress.score += 1;
            }
            progress.answers.push(answer);
            let player_done = progress.answers.len() >= total;

            finalized = player_done && game.both_complete();
            if finalized {
                game.finalize(now);
            } else if player_done {
                game.arm_finish_deadline(now, grace_window);
            }

            snapshot = game.clone();
        }

        if finalized {
            self.finished_order.lock().await.push(match_id);
        }
        Ok(AppendOutcome::Recorded(Box::new(snapshot)))
    }

    async fn finalize(&self, match_id: Uuid, now: SystemTime) -> StorageResult<FinalizeOutcome> {
        let snapshot;
        {
            let Some(mut entry) = self.matches.get_mut(&match_id) else {
                return Ok(FinalizeOutcome::NotFound);
            };
            let game = entry.value_mut();

            if game.status == MatchStatus::Finished {
                return Ok(FinalizeOutcome::AlreadyFinished);
            }
            if !game.due_for_finish(now) {
                return Ok(FinalizeOutcome::NotDue);
            }

            game.finalize(now);
            snapshot = game.clone();
        }

        self.finished_order.lock().await.push(match_id);
        Ok(FinalizeOutcome::Finalized(Box::new(snapshot)))
    }

    fn find_active_for_user(&self, user_id: Uuid) -> Option<MatchEntity> {
        self.matches
            .iter()
            .filter(|entry| {
                entry.status == MatchStatus::Active && entry.is_participant(user_id)
            })
            .max_by_key(|entry| entry.started_at)
            .map(|entry| entry.value().clone())
    }

    fn due_for_finish(&self, now: SystemTime) -> Vec<Uuid> {
        self.matches
            .iter()
            .filter(|entry| entry.due_for_finish(now))
            .map(|entry| entry.id)
            .collect()
    }

    fn matches_for_user(&self, user_id: Uuid) -> Vec<MatchEntity> {
        let mut result: Vec<MatchEntity> = self
            .matches
            .iter()
            .filter(|entry| entry.is_participant(user_id))
            .map(|entry| entry.value().clone())
            .collect();
        result.sort_by(|a, b| b.pair_created_at.cmp(&a.pair_created_at));
        result
    }

    async fn finished_matches(&self) -> Vec<MatchEntity> {
        let order = self.finished_order.lock().await;
        order
            .iter()
            .filter_map(|id| self.matches.get(id).map(|entry| entry.value().clone()))
            .collect()
    }
}

impl MatchStore for MemoryMatchStore {
    fn connect(
        &self,
        user_id: Uuid,
        questions: Vec<BoundQuestion>,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<ConnectOutcome>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.connect(user_id, questions, now).await })
    }

    fn find(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.matches.get(&id).map(|entry| entry.value().clone())) })
    }

    fn find_active_for_user(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.find_active_for_user(user_id)) })
    }

    fn append_answer(
        &self,
        match_id: Uuid,
        user_id: Uuid,
        expected_index: usize,
        answer: AnswerEntity,
        grace_window: Duration,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<AppendOutcome>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner
                .append_answer(match_id, user_id, expected_index, answer, grace_window, now)
                .await
        })
    }

    fn due_for_finish(&self, now: SystemTime) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.due_for_finish(now)) })
    }

    fn finalize(
        &self,
        match_id: Uuid,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<FinalizeOutcome>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.finalize(match_id, now).await })
    }

    fn matches_for_user(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.matches_for_user(user_id)) })
    }

    fn finished_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.finished_matches().await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_questions() -> Vec<BoundQuestion> {
        (0..5)
            .map(|index| BoundQuestion {
                id: Uuid::new_v4(),
                body: format!("question {index}"),
                accepted_answers: vec!["yes".into()],
            })
            .collect()
    }

    fn correct_answer(question_id: Uuid, at: SystemTime) -> AnswerEntity {
        AnswerEntity {
            question_id,
            verdict: Verdict::Correct,
            answered_at: at,
        }
    }

    async fn paired_match(store: &MemoryMatchStore, now: SystemTime) -> (MatchEntity, Uuid, Uuid) {
        let one = Uuid::new_v4();
        let two = Uuid::new_v4();
        store
            .connect(one, sample_questions(), now)
            .await
            .unwrap();
        let joined = store
            .connect(two, sample_questions(), now)
            .await
            .unwrap()
            .into_match();
        (joined, one, two)
    }

    async fn answer_all(
        store: &MemoryMatchStore,
        game: &MatchEntity,
        user_id: Uuid,
        at: SystemTime,
    ) -> MatchEntity {
        let mut latest = game.clone();
        for index in 0..game.questions.len() {
            let answer = correct_answer(game.questions[index].id, at);
            match store
                .append_answer(game.id, user_id, index, answer, Duration::from_secs(10), at)
                .await
                .unwrap()
            {
                AppendOutcome::Recorded(updated) => latest = *updated,
                other => panic!("unexpected append outcome: {other:?}"),
            }
        }
        latest
    }

    #[tokio::test]
    async fn first_connect_opens_pending_slot() {
        let store = MemoryMatchStore::new();
        let user = Uuid::new_v4();
        let now = SystemTime::now();

        let outcome = store.connect(user, sample_questions(), now).await.unwrap();
        let ConnectOutcome::Created(game) = outcome else {
            panic!("expected a created pending match");
        };
        assert_eq!(game.status, MatchStatus::Pending);
        assert!(game.questions.is_empty());
        assert!(game.player_two.is_none());
    }

    #[tokio::test]
    async fn second_connect_joins_and_binds_questions() {
        let store = MemoryMatchStore::new();
        let now = SystemTime::now();
        let (game, one, two) = paired_match(&store, now).await;

        assert_eq!(game.status, MatchStatus::Active);
        assert_eq!(game.questions.len(), 5);
        assert_eq!(game.player_one.user_id, one);
        assert_eq!(game.player_two.as_ref().unwrap().user_id, two);
        assert_eq!(game.started_at, Some(now));
    }

    #[tokio::test]
    async fn waiting_player_reconnect_returns_own_slot() {
        let store = MemoryMatchStore::new();
        let user = Uuid::new_v4();
        let now = SystemTime::now();

        let created = store
            .connect(user, sample_questions(), now)
            .await
            .unwrap()
            .into_match();
        let outcome = store.connect(user, sample_questions(), now).await.unwrap();

        let ConnectOutcome::AlreadyWaiting(game) = outcome else {
            panic!("expected the existing pending match");
        };
        assert_eq!(game.id, created.id);
        assert_eq!(game.status, MatchStatus::Pending);
    }

    #[tokio::test]
    async fn concurrent_connects_never_overfill_a_match() {
        let store = MemoryMatchStore::new();
        let now = SystemTime::now();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .connect(Uuid::new_v4(), sample_questions(), now)
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut seen_players = HashSet::new();
        let mut active = 0;
        let mut pending = 0;
        for entry in store.inner.matches.iter() {
            assert!(seen_players.insert(entry.player_one.user_id));
            match entry.status {
                MatchStatus::Active => {
                    let two = entry.player_two.as_ref().expect("active match has player two");
                    assert_ne!(two.user_id, entry.player_one.user_id);
                    assert!(seen_players.insert(two.user_id));
                    assert_eq!(entry.questions.len(), 5);
                    active += 1;
                }
                MatchStatus::Pending => {
                    assert!(entry.player_two.is_none());
                    pending += 1;
                }
                MatchStatus::Finished => panic!("no match should be finished"),
            }
        }
        assert_eq!(active * 2 + pending, 10);
        assert!(pending <= 1, "at most one pending match system-wide");
    }

    #[tokio::test]
    async fn stale_append_is_rejected_out_of_sync() {
        let store = MemoryMatchStore::new();
        let now = SystemTime::now();
        let (game, one, _) = paired_match(&store, now).await;

        let answer = correct_answer(game.questions[0].id, now);
        let first = store
            .append_answer(game.id, one, 0, answer.clone(), Duration::from_secs(10), now)
            .await
            .unwrap();
        assert!(matches!(first, AppendOutcome::Recorded(_)));

        // Same expected index again simulates a racing duplicate submission.
        let second = store
            .append_answer(game.id, one, 0, answer, Duration::from_secs(10), now)
            .await
            .unwrap();
        assert_eq!(second, AppendOutcome::OutOfSync);
    }

    #[tokio::test]
    async fn sixth_answer_is_not_eligible() {
        let store = MemoryMatchStore::new();
        let now = SystemTime::now();
        let (game, one, _) = paired_match(&store, now).await;

        answer_all(&store, &game, one, now).await;
        let extra = correct_answer(game.questions[4].id, now);
        let outcome = store
            .append_answer(game.id, one, 5, extra, Duration::from_secs(10), now)
            .await
            .unwrap();
        assert_eq!(outcome, AppendOutcome::NotEligible);
    }

    #[tokio::test]
    async fn final_answer_arms_deadline_while_opponent_plays() {
        let store = MemoryMatchStore::new();
        let now = SystemTime::now();
        let (game, one, _) = paired_match(&store, now).await;

        let updated = answer_all(&store, &game, one, now).await;
        assert_eq!(updated.status, MatchStatus::Active);
        assert_eq!(updated.finish_deadline, Some(now + Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn both_players_done_finalizes_without_sweep() {
        let store = MemoryMatchStore::new();
        let now = SystemTime::now();
        let (game, one, two) = paired_match(&store, now).await;

        answer_all(&store, &game, one, now).await;
        let updated = answer_all(&store, &game, two, now + Duration::from_secs(2)).await;

        assert_eq!(updated.status, MatchStatus::Finished);
        assert!(updated.finish_deadline.is_none());
        // Player one finished first with a positive score: speed bonus applied.
        assert_eq!(updated.player_one.score, 6);
        assert!(updated.player_one.bonus_applied);
        assert_eq!(updated.player_two.as_ref().unwrap().score, 5);
        assert_eq!(store.finished_matches().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn finalize_is_conditional_and_idempotent() {
        let store = MemoryMatchStore::new();
        let now = SystemTime::now();
        let (game, one, _) = paired_match(&store, now).await;

        // Not due yet: nobody finished.
        assert_eq!(
            store.finalize(game.id, now).await.unwrap(),
            FinalizeOutcome::NotDue
        );

        answer_all(&store, &game, one, now).await;
        let after_deadline = now + Duration::from_secs(11);
        let due = store.due_for_finish(after_deadline).await.unwrap();
        assert_eq!(due, vec![game.id]);

        let first = store.finalize(game.id, after_deadline).await.unwrap();
        let FinalizeOutcome::Finalized(finalized) = first else {
            panic!("expected finalization");
        };
        assert_eq!(finalized.status, MatchStatus::Finished);
        assert_eq!(finalized.player_one.score, 6);

        // Second sweep racing on the same match is a no-op.
        let second = store.finalize(game.id, after_deadline).await.unwrap();
        assert_eq!(second, FinalizeOutcome::AlreadyFinished);
        assert_eq!(store.finished_matches().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn question_set_is_frozen_once_active() {
        let store = MemoryMatchStore::new();
        let now = SystemTime::now();
        let (game, one, _) = paired_match(&store, now).await;

        let bound = game.questions.clone();
        answer_all(&store, &game, one, now).await;

        let reread = store.find(game.id).await.unwrap().unwrap();
        assert_eq!(reread.questions, bound);
    }
}
