use super::commission::CommissionRecord;
use super::insurer::Insurer;
use super::user::{PasswordReset, User};
use crate::error::{CompletionError, Result};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait InsurerStore: Send + Sync {
    async fn store(&self, insurer: Insurer) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Insurer>>;
    /// Lookup by name, ignoring case and surrounding whitespace.
    async fn find_by_name(&self, name: &str) -> Result<Option<Insurer>>;
    async fn get_all(&self) -> Result<Vec<Insurer>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CommissionStore: Send + Sync {
    async fn store(&self, record: CommissionRecord) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<CommissionRecord>>;
    /// Records of one insurer, in [`CommissionRecord::ledger_order`].
    async fn for_insurer(&self, insurer_id: Uuid) -> Result<Vec<CommissionRecord>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn store(&self, user: User) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_all(&self) -> Result<Vec<User>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn store_reset(&self, reset: PasswordReset) -> Result<()>;
    async fn get_reset(&self, token: Uuid) -> Result<Option<PasswordReset>>;
}

pub type InsurerStoreBox = Box<dyn InsurerStore>;
pub type CommissionStoreBox = Box<dyn CommissionStore>;
pub type UserStoreBox = Box<dyn UserStore>;

/// A text-completion backend (an LLM behind an HTTP API).
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
    ) -> std::result::Result<String, CompletionError>;
}

pub type CompletionClientBox = Box<dyn CompletionClient>;

/// Downloads a web page and returns its readable text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub type PageFetcherBox = Box<dyn PageFetcher>;
