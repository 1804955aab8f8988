//! Question catalog consumed by the engine (random published sampling only).

use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use futures::future::BoxFuture;
use rand::seq::IteratorRandom;
use uuid::Uuid;

use crate::dao::models::QuestionEntity;
use crate::dao::storage::StorageResult;

/// Read-only view onto the published trivia questions.
///
/// Question authoring lives elsewhere; the engine only samples and fetches.
pub trait QuestionCatalog: Send + Sync {
    /// Draw up to `count` distinct published questions uniformly at random.
    fn sample_published(
        &self,
        count: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;

    /// Fetch questions by id, skipping unknown identifiers.
    fn fetch(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;

    /// Number of questions currently eligible for matchmaking.
    fn published_count(&self) -> BoxFuture<'static, StorageResult<usize>>;
}

/// Process-local [`QuestionCatalog`] backed by a concurrent map.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    questions: Arc<DashMap<Uuid, QuestionEntity>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog from `(body, accepted_answers, published)` triples.
    pub fn seeded(entries: impl IntoIterator<Item = (String, Vec<String>, bool)>) -> Self {
        let catalog = Self::new();
        let now = SystemTime::now();
        for (body, accepted_answers, published) in entries {
            let question = QuestionEntity {
                id: Uuid::new_v4(),
                body,
                accepted_answers,
                published,
                created_at: now,
                updated_at: now,
            };
            catalog.questions.insert(question.id, question);
        }
        catalog
    }
}

impl QuestionCatalog for MemoryCatalog {
    fn sample_published(
        &self,
        count: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let questions = self.questions.clone();
        Box::pin(async move {
            let mut rng = rand::rng();
            let sampled = questions
                .iter()
                .filter(|entry| entry.published)
                .map(|entry| entry.value().clone())
                .choose_multiple(&mut rng, count);
            Ok(sampled)
        })
    }

    fn fetch(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let questions = self.questions.clone();
        Box::pin(async move {
            Ok(ids
                .into_iter()
                .filter_map(|id| questions.get(&id).map(|entry| entry.value().clone()))
                .collect())
        })
    }

    fn published_count(&self) -> BoxFuture<'static, StorageResult<usize>> {
        let questions = self.questions.clone();
        Box::pin(async move { Ok(questions.iter().filter(|entry| entry.published).count()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sampling_only_returns_published_questions() {
        let catalog = MemoryCatalog::seeded([
            ("q1".to_string(), vec!["a".to_string()], true),
            ("q2".to_string(), vec!["b".to_string()], false),
            ("q3".to_string(), vec!["c".to_string()], true),
        ]);

        let sampled = catalog.sample_published(5).await.unwrap();
        assert_eq!(sampled.len(), 2);
        assert!(sampled.iter().all(|question| question.published));
    }

    #[tokio::test]
    async fn sampling_draws_distinct_questions() {
        let catalog = MemoryCatalog::seeded(
            (0..20).map(|index| (format!("q{index}"), vec!["a".to_string()], true)),
        );

        let sampled = catalog.sample_published(5).await.unwrap();
        assert_eq!(sampled.len(), 5);
        let mut ids: Vec<Uuid> = sampled.iter().map(|question| question.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }
}
