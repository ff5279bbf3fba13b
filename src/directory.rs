//! Credential repository seam.
//!
//! User CRUD lives outside this crate; the auth flows only need lookup by
//! username and the `token_id` back-pointer to the user's current session.
//! The session store record, not the pointer, is the source of truth for
//! liveness.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Minimal user fields the auth flows read and write.
#[derive(Clone, Debug)]
pub struct UserAccount {
    pub user_id: String,
    pub username: String,
    pub email: String,
    /// Stored salted password hash.
    pub password_hash: String,
    /// Back-pointer to the user's current session id, if any.
    pub token_id: Option<String>,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>>;

    /// Read the `token_id` back-pointer for a user.
    async fn find_token_id(&self, user_id: &str) -> Result<Option<String>>;

    /// Persist the session id onto the user's `token_id` field.
    /// Last writer wins under concurrent logins.
    async fn update_token_id(&self, user_id: &str, session_id: &str) -> Result<()>;
}

/// In-memory directory for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryDirectory {
    users: Mutex<HashMap<String, UserAccount>>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, account: UserAccount) {
        let mut users = self.users.lock().await;
        users.insert(account.user_id.clone(), account);
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    async fn find_token_id(&self, user_id: &str) -> Result<Option<String>> {
        let users = self.users.lock().await;
        Ok(users.get(user_id).and_then(|account| account.token_id.clone()))
    }

    async fn update_token_id(&self, user_id: &str, session_id: &str) -> Result<()> {
        let mut users = self.users.lock().await;
        if let Some(account) = users.get_mut(user_id) {
            account.token_id = Some(session_id.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryDirectory, UserAccount, UserDirectory};

    fn account() -> UserAccount {
        UserAccount {
            user_id: "user_1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            token_id: None,
        }
    }

    #[tokio::test]
    async fn find_by_username_matches_exactly() {
        let directory = MemoryDirectory::new();
        directory.insert(account()).await;

        let found = directory.find_by_username("alice").await.unwrap();
        assert_eq!(found.map(|account| account.user_id), Some("user_1".into()));
        assert!(directory.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_token_id_sets_the_back_pointer() {
        let directory = MemoryDirectory::new();
        directory.insert(account()).await;

        assert_eq!(directory.find_token_id("user_1").await.unwrap(), None);
        directory.update_token_id("user_1", "sid-1").await.unwrap();
        assert_eq!(
            directory.find_token_id("user_1").await.unwrap(),
            Some("sid-1".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_user_reads_as_absent() {
        let directory = MemoryDirectory::new();
        assert_eq!(directory.find_token_id("ghost").await.unwrap(), None);
        // Updating an unknown user is a no-op, not an error.
        directory.update_token_id("ghost", "sid-1").await.unwrap();
    }
}
