use std::sync::Arc;

use crate::{
    config::AppConfig,
    dao::{
        catalog::{MemoryCatalog, QuestionCatalog},
        match_store::{MatchStore, memory::MemoryMatchStore},
        users::{MemoryUserDirectory, UserDirectory},
    },
};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state storing the store seams and runtime configuration.
pub struct AppState {
    matches: Arc<dyn MatchStore>,
    catalog: Arc<dyn QuestionCatalog>,
    users: Arc<dyn UserDirectory>,
    config: AppConfig,
}

impl AppState {
    /// Build the shared state from configuration, seeding the in-memory stores.
    pub fn new(config: AppConfig) -> SharedState {
        let catalog = MemoryCatalog::seeded(config.questions.iter().map(|seed| {
            (
                seed.body.clone(),
                seed.accepted_answers.clone(),
                seed.published,
            )
        }));

        let users: Arc<dyn UserDirectory> = if config.users.is_empty() {
            Arc::new(MemoryUserDirectory::open())
        } else {
            Arc::new(MemoryUserDirectory::seeded(
                config
                    .users
                    .iter()
                    .map(|seed| (seed.id, seed.display_name.clone())),
            ))
        };

        Arc::new(Self {
            matches: Arc::new(MemoryMatchStore::new()),
            catalog: Arc::new(catalog),
            users,
            config,
        })
    }

    /// Build the shared state over explicit store implementations.
    pub fn with_stores(
        config: AppConfig,
        matches: Arc<dyn MatchStore>,
        catalog: Arc<dyn QuestionCatalog>,
        users: Arc<dyn UserDirectory>,
    ) -> SharedState {
        Arc::new(Self {
            matches,
            catalog,
            users,
            config,
        })
    }

    /// Handle to the match store.
    pub fn matches(&self) -> Arc<dyn MatchStore> {
        self.matches.clone()
    }

    /// Handle to the question catalog.
    pub fn catalog(&self) -> Arc<dyn QuestionCatalog> {
        self.catalog.clone()
    }

    /// Handle to the user directory.
    pub fn users(&self) -> Arc<dyn UserDirectory> {
        self.users.clone()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
