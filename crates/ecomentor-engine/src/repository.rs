use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow};

use crate::catalog::Challenge;
use crate::profile::UserProfile;

/// Record store seen by the engine. One call is one whole-row read or write;
/// there is no locking across a read-modify-write cycle.
pub trait Repository: Send + Sync {
    fn get_user(&self, name: &str) -> Result<Option<UserProfile>>;

    /// Insert or fully overwrite the row keyed by `user.name`.
    fn upsert_user(&self, user: &UserProfile) -> Result<()>;

    /// Returns true if a row was removed.
    fn delete_user(&self, name: &str) -> Result<bool>;

    fn list_challenges(&self) -> Result<Vec<Challenge>>;
}

impl<T: Repository + ?Sized> Repository for std::sync::Arc<T> {
    fn get_user(&self, name: &str) -> Result<Option<UserProfile>> {
        (**self).get_user(name)
    }

    fn upsert_user(&self, user: &UserProfile) -> Result<()> {
        (**self).upsert_user(user)
    }

    fn delete_user(&self, name: &str) -> Result<bool> {
        (**self).delete_user(name)
    }

    fn list_challenges(&self) -> Result<Vec<Challenge>> {
        (**self).list_challenges()
    }
}

/// Repository held entirely in memory.
#[derive(Default)]
pub struct MemoryRepository {
    users: Mutex<HashMap<String, UserProfile>>,
    challenges: Mutex<Vec<Challenge>>,
}

impl MemoryRepository {
    pub fn new(challenges: Vec<Challenge>) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            challenges: Mutex::new(challenges),
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().map(|users| users.len()).unwrap_or(0)
    }
}

impl Repository for MemoryRepository {
    fn get_user(&self, name: &str) -> Result<Option<UserProfile>> {
        let users = self.users.lock().map_err(|e| anyhow!("User map lock poisoned: {}", e))?;
        Ok(users.get(name).cloned())
    }

    fn upsert_user(&self, user: &UserProfile) -> Result<()> {
        let mut users = self.users.lock().map_err(|e| anyhow!("User map lock poisoned: {}", e))?;
        users.insert(user.name.clone(), user.clone());
        Ok(())
    }

    fn delete_user(&self, name: &str) -> Result<bool> {
        let mut users = self.users.lock().map_err(|e| anyhow!("User map lock poisoned: {}", e))?;
        Ok(users.remove(name).is_some())
    }

    fn list_challenges(&self) -> Result<Vec<Challenge>> {
        let challenges = self
            .challenges
            .lock()
            .map_err(|e| anyhow!("Catalog lock poisoned: {}", e))?;
        Ok(challenges.clone())
    }
}
