//! User store collaborator
//!
//! Handlers receive an `Arc<dyn UserStore>` rather than reaching for a
//! process-wide database handle, so tests can swap in [`MemoryUserStore`].

use crate::{AccountError, Result, User};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persistence for user documents
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user whose username equals `username` or whose email equals `email`
    ///
    /// Empty arguments never match.
    async fn find_by_username_or_email(&self, username: &str, email: &str) -> Result<Option<User>>;

    /// Insert a new user, assigning its id
    ///
    /// Fails with [`AccountError::Conflict`] when the username or email is taken.
    async fn insert(&self, user: User) -> Result<User>;

    /// Check that the store is reachable
    async fn ping(&self) -> Result<()>;
}

/// In-memory user store
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn matches_identity(user: &User, username: &str, email: &str) -> bool {
    (!username.is_empty() && user.user_name == username)
        || (!email.is_empty() && user.email == email)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username_or_email(&self, username: &str, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| matches_identity(u, username, email))
            .cloned())
    }

    async fn insert(&self, mut user: User) -> Result<User> {
        let mut users = self.users.write().await;

        if users
            .iter()
            .any(|u| matches_identity(u, &user.user_name, &user.email))
        {
            return Err(AccountError::Conflict(
                "User with this email or username already exists".to_string(),
            ));
        }

        user.id = Some(Uuid::new_v4().to_string());
        users.push(user.clone());
        Ok(user)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str) -> User {
        User::new(
            name.to_string(),
            email.to_string(),
            "$argon2id$placeholder".to_string(),
            "Test User".to_string(),
        )
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = MemoryUserStore::new();
        let created = store.insert(user("jdoe", "jdoe@example.com")).await.unwrap();

        assert!(created.id.is_some());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_by_either_identity() {
        let store = MemoryUserStore::new();
        store.insert(user("jdoe", "jdoe@example.com")).await.unwrap();

        let by_name = store.find_by_username_or_email("jdoe", "").await.unwrap();
        let by_email = store
            .find_by_username_or_email("", "jdoe@example.com")
            .await
            .unwrap();
        let missing = store
            .find_by_username_or_email("nobody", "nobody@example.com")
            .await
            .unwrap();

        assert_eq!(by_name.unwrap().email, "jdoe@example.com");
        assert_eq!(by_email.unwrap().user_name, "jdoe");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_empty_identity_never_matches() {
        let store = MemoryUserStore::new();
        store.insert(user("jdoe", "jdoe@example.com")).await.unwrap();

        let found = store.find_by_username_or_email("", "").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email_conflicts() {
        let store = MemoryUserStore::new();
        store.insert(user("jdoe", "jdoe@example.com")).await.unwrap();

        let same_name = store.insert(user("jdoe", "other@example.com")).await;
        let same_email = store.insert(user("other", "jdoe@example.com")).await;

        assert!(matches!(same_name, Err(AccountError::Conflict(_))));
        assert!(matches!(same_email, Err(AccountError::Conflict(_))));
        assert_eq!(store.len().await, 1);
    }
}
