use crate::domain::commission::CommissionRecord;
use crate::domain::insurer::Insurer;
use crate::domain::ports::{CommissionStore, InsurerStore, UserStore};
use crate::domain::user::{PasswordReset, User};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory store for insurers.
///
/// Uses `Arc<RwLock<HashMap<Uuid, Insurer>>>` to allow shared concurrent access.
/// Ideal for testing or one-shot runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryInsurerStore {
    insurers: Arc<RwLock<HashMap<Uuid, Insurer>>>,
}

impl InMemoryInsurerStore {
    /// Creates a new, empty in-memory insurer store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InsurerStore for InMemoryInsurerStore {
    async fn store(&self, insurer: Insurer) -> Result<()> {
        let mut insurers = self.insurers.write().await;
        insurers.insert(insurer.id, insurer);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Insurer>> {
        let insurers = self.insurers.read().await;
        Ok(insurers.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Insurer>> {
        let key = Insurer::name_key(name);
        let insurers = self.insurers.read().await;
        Ok(insurers
            .values()
            .find(|i| Insurer::name_key(&i.name) == key)
            .cloned())
    }

    async fn get_all(&self) -> Result<Vec<Insurer>> {
        let insurers = self.insurers.read().await;
        let mut all: Vec<Insurer> = insurers.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut insurers = self.insurers.write().await;
        Ok(insurers.remove(&id).is_some())
    }
}

/// A thread-safe in-memory store for commission records.
#[derive(Default, Clone)]
pub struct InMemoryCommissionStore {
    records: Arc<RwLock<HashMap<Uuid, CommissionRecord>>>,
}

impl InMemoryCommissionStore {
    /// Creates a new, empty in-memory commission store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommissionStore for InMemoryCommissionStore {
    async fn store(&self, record: CommissionRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<CommissionRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn for_insurer(&self, insurer_id: Uuid) -> Result<Vec<CommissionRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<CommissionRecord> = records
            .values()
            .filter(|r| r.insurer_id == insurer_id)
            .cloned()
            .collect();
        matching.sort_by(CommissionRecord::ledger_order);
        Ok(matching)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut records = self.records.write().await;
        Ok(records.remove(&id).is_some())
    }
}

/// A thread-safe in-memory store for users and their password resets.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    resets: Arc<RwLock<HashMap<Uuid, PasswordReset>>>,
}

impl InMemoryUserStore {
    /// Creates a new, empty in-memory user store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn store(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_all(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(all)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut users = self.users.write().await;
        let removed = users.remove(&id).is_some();
        if removed {
            self.resets.write().await.retain(|_, r| r.user_id != id);
        }
        Ok(removed)
    }

    async fn store_reset(&self, reset: PasswordReset) -> Result<()> {
        let mut resets = self.resets.write().await;
        resets.insert(reset.token, reset);
        Ok(())
    }

    async fn get_reset(&self, token: Uuid) -> Result<Option<PasswordReset>> {
        let resets = self.resets.read().await;
        Ok(resets.get(&token).cloned())
    }
}
