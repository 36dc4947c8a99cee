use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace, warn};
use uuid::Uuid;

#[derive(Default)]
struct UserStorage {
    by_id: HashMap<Uuid, User>,
    id_by_email: HashMap<String, Uuid>,
}

#[derive(Clone)]
pub struct InMemoryUserRepository {
    storage: Arc<RwLock<UserStorage>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(UserStorage::default())),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id, email = %user.email))]
    async fn insert_user(&self, user: User) -> Result<()> {
        trace!("Acquiring write lock for user storage");
        let mut storage = self.storage.write().await;
        if storage.id_by_email.contains_key(&user.email) {
            warn!(email = %user.email, "Email already registered");
            return Err(DomainError::DuplicateEmail.into());
        }
        storage.id_by_email.insert(user.email.clone(), user.id);
        storage.by_id.insert(user.id, user.clone());
        debug!(
            user_id = %user.id,
            email = %user.email,
            "User saved to memory storage"
        );
        Ok(())
    }

    #[instrument(skip(self), fields(email = email))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let storage = self.storage.read().await;
        let user = storage
            .id_by_email
            .get(email)
            .and_then(|id| storage.by_id.get(id))
            .cloned();
        match &user {
            Some(u) => debug!(user_id = %u.id, "User found in storage"),
            None => trace!(email = email, "User not found in storage"),
        }
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let storage = self.storage.read().await;
        Ok(storage.by_id.get(&id).cloned())
    }

    #[instrument(skip(self, password_hash), fields(user_id = %id))]
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let mut storage = self.storage.write().await;
        let user = storage
            .by_id
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("User not found: {}", id)))?;
        user.password_hash = password_hash.to_string();
        debug!("Password hash replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: "Tester".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_user_saves_user_correctly() {
        let repo = InMemoryUserRepository::new();
        let user = user("test@example.com");

        repo.insert_user(user.clone()).await.unwrap();

        let retrieved = repo.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(retrieved.email, user.email);
        assert_eq!(retrieved.password_hash, user.password_hash);

        let by_email = repo
            .find_user_by_email("test@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn test_insert_user_rejects_duplicate_email() {
        let repo = InMemoryUserRepository::new();
        repo.insert_user(user("dup@example.com")).await.unwrap();

        let err = repo.insert_user(user("dup@example.com")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn test_find_user_returns_none_for_unknown_keys() {
        let repo = InMemoryUserRepository::new();

        assert!(repo.find_user_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(
            repo.find_user_by_email("nobody@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_password_hash() {
        let repo = InMemoryUserRepository::new();
        let user = user("pw@example.com");
        repo.insert_user(user.clone()).await.unwrap();

        repo.update_password_hash(user.id, "new-hash").await.unwrap();

        let stored = repo.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-hash");
        let missing = repo.update_password_hash(Uuid::new_v4(), "x").await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_inserts_keep_one_user() {
        let repo = InMemoryUserRepository::new();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let repo_clone = repo.clone();
                tokio::spawn(async move { repo_clone.insert_user(user("race@example.com")).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(repo.storage.read().await.by_id.len(), 1);
    }
}
