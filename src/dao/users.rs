//! Identity lookup consumed by the engine (existence and display names only).

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::storage::StorageResult;

/// Read-only seam onto the external user store.
pub trait UserDirectory: Send + Sync {
    /// Whether the user id resolves to a known account.
    fn exists(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Display name for leaderboard and progress views, if the user exists.
    fn display_name(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<Option<String>>>;
}

/// Process-local [`UserDirectory`].
///
/// In open mode every id resolves, with a short form of the uuid as display
/// name; a seeded directory only knows the configured accounts.
#[derive(Clone)]
pub struct MemoryUserDirectory {
    users: Arc<DashMap<Uuid, String>>,
    open: bool,
}

impl MemoryUserDirectory {
    /// Directory that accepts any user id (no identity seed configured).
    pub fn open() -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            open: true,
        }
    }

    /// Directory restricted to the given `(id, display_name)` accounts.
    pub fn seeded(users: impl IntoIterator<Item = (Uuid, String)>) -> Self {
        let map = DashMap::new();
        for (id, name) in users {
            map.insert(id, name);
        }
        Self {
            users: Arc::new(map),
            open: false,
        }
    }
}

fn short_name(user_id: Uuid) -> String {
    let text = user_id.to_string();
    format!("player-{}", &text[..8])
}

impl UserDirectory for MemoryUserDirectory {
    fn exists(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let users = self.users.clone();
        let open = self.open;
        Box::pin(async move { Ok(open || users.contains_key(&user_id)) })
    }

    fn display_name(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let users = self.users.clone();
        let open = self.open;
        Box::pin(async move {
            let name = users.get(&user_id).map(|entry| entry.value().clone());
            Ok(name.or_else(|| open.then(|| short_name(user_id))))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_directory_rejects_unknown_users() {
        let known = Uuid::new_v4();
        let directory = MemoryUserDirectory::seeded([(known, "alice".to_string())]);

        assert!(directory.exists(known).await.unwrap());
        assert!(!directory.exists(Uuid::new_v4()).await.unwrap());
        assert_eq!(
            directory.display_name(known).await.unwrap().as_deref(),
            Some("alice")
        );
    }

    #[tokio::test]
    async fn open_directory_accepts_anyone() {
        let directory = MemoryUserDirectory::open();
        let user = Uuid::new_v4();

        assert!(directory.exists(user).await.unwrap());
        assert!(directory.display_name(user).await.unwrap().is_some());
    }
}
