use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{CreateUser, StorageError, StorageResult, User, UserStore, UserUpdate};

/// In-memory implementation of [`UserStore`].
///
/// Backs the integration tests and local development without a database.
/// All mutations run under one write lock, so the duplicate-email check is
/// atomic with the write, matching the contract the Postgres unique
/// constraint provides.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

impl Clone for MemoryUserStore {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, user: CreateUser) -> StorageResult<User> {
        let mut users = self.users.write();

        if users.values().any(|u| u.email == user.email) {
            return Err(StorageError::DuplicateEmail(user.email));
        }

        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn get_user(&self, id: Uuid) -> StorageResult<User> {
        self.users
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::UserNotFound(id.to_string()))
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<User> {
        self.users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| StorageError::UserNotFound(email.to_string()))
    }

    async fn email_in_use(&self, email: &str, exclude: Option<Uuid>) -> StorageResult<bool> {
        Ok(self
            .users
            .read()
            .values()
            .any(|u| u.email == email && Some(u.id) != exclude))
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> StorageResult<User> {
        let mut users = self.users.write();

        if let Some(email) = &update.email {
            if users.values().any(|u| u.email == *email && u.id != id) {
                return Err(StorageError::DuplicateEmail(email.clone()));
            }
        }

        let user = users
            .get_mut(&id)
            .ok_or_else(|| StorageError::UserNotFound(id.to_string()))?;

        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(password_hash) = update.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(is_admin) = update.is_admin {
            user.is_admin = is_admin;
        }

        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> StorageResult<()> {
        self.users
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::UserNotFound(id.to_string()))
    }
}
