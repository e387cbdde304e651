use crate::domain::commission::CommissionRecord;
use crate::domain::insurer::Insurer;
use crate::domain::ports::{CommissionStore, InsurerStore, UserStore};
use crate::domain::user::{PasswordReset, User};
use crate::error::{PortalError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column Family for insurers.
pub const CF_INSURERS: &str = "insurers";
/// Column Family for commission records.
pub const CF_COMMISSIONS: &str = "commissions";
/// Column Family for portal users.
pub const CF_USERS: &str = "users";
/// Column Family for password reset tokens.
pub const CF_PASSWORD_RESETS: &str = "password_resets";

const COLUMN_FAMILIES: [&str; 4] = [CF_INSURERS, CF_COMMISSIONS, CF_USERS, CF_PASSWORD_RESETS];

/// A persistent store implementation using RocksDB.
///
/// Each table of the portal lives in its own Column Family, keyed by the
/// entity's UUID bytes, with the entity serialized as JSON.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that every required column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PortalError::InternalError(Box::new(std::io::Error::other(format!(
                "Column family '{name}' not found"
            ))))
        })
    }

    fn put<T: Serialize>(&self, cf: &str, key: Uuid, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(self.cf(cf)?, key.as_bytes(), bytes)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf: &str, key: Uuid) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    fn remove(&self, cf: &str, key: Uuid) -> Result<bool> {
        let handle = self.cf(cf)?;
        let existed = self.db.get_pinned_cf(handle, key.as_bytes())?.is_some();
        if existed {
            self.db.delete_cf(handle, key.as_bytes())?;
        }
        Ok(existed)
    }
}

#[async_trait]
impl InsurerStore for RocksDBStore {
    async fn store(&self, insurer: Insurer) -> Result<()> {
        self.put(CF_INSURERS, insurer.id, &insurer)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Insurer>> {
        self.fetch(CF_INSURERS, id)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Insurer>> {
        let key = Insurer::name_key(name);
        let insurers: Vec<Insurer> = self.scan(CF_INSURERS)?;
        Ok(insurers
            .into_iter()
            .find(|i| Insurer::name_key(&i.name) == key))
    }

    async fn get_all(&self) -> Result<Vec<Insurer>> {
        let mut insurers: Vec<Insurer> = self.scan(CF_INSURERS)?;
        insurers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(insurers)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.remove(CF_INSURERS, id)
    }
}

#[async_trait]
impl CommissionStore for RocksDBStore {
    async fn store(&self, record: CommissionRecord) -> Result<()> {
        self.put(CF_COMMISSIONS, record.id, &record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CommissionRecord>> {
        self.fetch(CF_COMMISSIONS, id)
    }

    async fn for_insurer(&self, insurer_id: Uuid) -> Result<Vec<CommissionRecord>> {
        let mut records: Vec<CommissionRecord> = self
            .scan::<CommissionRecord>(CF_COMMISSIONS)?
            .into_iter()
            .filter(|r| r.insurer_id == insurer_id)
            .collect();
        records.sort_by(CommissionRecord::ledger_order);
        Ok(records)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.remove(CF_COMMISSIONS, id)
    }
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn store(&self, user: User) -> Result<()> {
        self.put(CF_USERS, user.id, &user)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        self.fetch(CF_USERS, id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();
        let users: Vec<User> = self.scan(CF_USERS)?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    async fn get_all(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.scan(CF_USERS)?;
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let removed = self.remove(CF_USERS, id)?;
        if removed {
            let resets: Vec<PasswordReset> = self.scan(CF_PASSWORD_RESETS)?;
            for reset in resets.into_iter().filter(|r| r.user_id == id) {
                self.remove(CF_PASSWORD_RESETS, reset.token)?;
            }
        }
        Ok(removed)
    }

    async fn store_reset(&self, reset: PasswordReset) -> Result<()> {
        self.put(CF_PASSWORD_RESETS, reset.token, &reset)
    }

    async fn get_reset(&self, token: Uuid) -> Result<Option<PasswordReset>> {
        self.fetch(CF_PASSWORD_RESETS, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commission::PaymentFrequency;
    use crate::domain::commission::fixtures::draft;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        for name in COLUMN_FAMILIES {
            assert!(store.db.cf_handle(name).is_some());
        }
    }

    #[tokio::test]
    async fn test_rocksdb_insurer_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let insurer = Insurer::new("Qualitas");
        InsurerStore::store(&store, insurer.clone()).await.unwrap();

        let found = store.find_by_name("QUALITAS").await.unwrap();
        assert_eq!(found, Some(insurer.clone()));
        assert_eq!(InsurerStore::get_all(&store).await.unwrap().len(), 1);

        assert!(InsurerStore::delete(&store, insurer.id).await.unwrap());
        assert!(InsurerStore::get(&store, insurer.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_commission_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let insurer_id = Uuid::new_v4();
        let record = CommissionRecord::new(
            Uuid::new_v4(),
            insurer_id,
            draft(
                PaymentFrequency::Monthly,
                NaiveDate::from_ymd_opt(2024, 11, 15).unwrap(),
            ),
        )
        .unwrap();

        CommissionStore::store(&store, record.clone()).await.unwrap();

        let retrieved = CommissionStore::get(&store, record.id).await.unwrap();
        assert_eq!(retrieved, Some(record.clone()));
        assert_eq!(store.for_insurer(insurer_id).await.unwrap(), vec![record]);
        assert!(store.for_insurer(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
