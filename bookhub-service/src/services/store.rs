//! Persistence seams consumed by the credential verifier and the
//! authorization core.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::error::ServiceError;
use crate::models::{Account, NewAccount};

/// Owner of one ownership-gated resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipRecord {
    pub resource_id: i64,
    pub owner_id: i64,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look an account up by email or username.
    async fn find_account_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, anyhow::Error>;

    async fn insert_account(&self, account: &NewAccount) -> Result<Account, ServiceError>;
}

#[async_trait]
pub trait OwnershipStore: Send + Sync {
    async fn find_ownership_record(
        &self,
        resource_id: i64,
    ) -> Result<Option<OwnershipRecord>, anyhow::Error>;
}

/// In-memory store for tests. `set_failing(true)` makes every lookup fail as
/// if the database were unreachable.
pub struct MemoryStore {
    accounts: Mutex<Vec<Account>>,
    review_owners: Mutex<HashMap<i64, i64>>,
    failing: AtomicBool,
    ownership_lookups: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
            review_owners: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
            ownership_lookups: AtomicUsize::new(0),
        }
    }

    pub fn insert_review_owner(&self, review_id: i64, owner_id: i64) {
        self.review_owners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(review_id, owner_id);
    }

    pub fn remove_review(&self, review_id: i64) {
        self.review_owners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&review_id);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of ownership lookups served so far.
    pub fn ownership_lookups(&self) -> usize {
        self.ownership_lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), anyhow::Error> {
        if self.failing.load(Ordering::SeqCst) {
            Err(anyhow::anyhow!("Memory store is unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_account_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, anyhow::Error> {
        self.check_available()?;
        let accounts = self
            .accounts
            .lock()
            .map_err(|e| anyhow::anyhow!("Memory store mutex poisoned: {}", e))?;
        Ok(accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(identifier) || a.username == identifier)
            .cloned())
    }

    async fn insert_account(&self, account: &NewAccount) -> Result<Account, ServiceError> {
        self.check_available()?;
        let mut accounts = self
            .accounts
            .lock()
            .map_err(|e| anyhow::anyhow!("Memory store mutex poisoned: {}", e))?;

        if accounts.iter().any(|a| {
            a.username == account.username || a.email.eq_ignore_ascii_case(&account.email)
        }) {
            return Err(ServiceError::AccountAlreadyExists);
        }

        let created = Account {
            id: accounts.len() as i64 + 1,
            username: account.username.clone(),
            email: account.email.clone(),
            password_hash: account.password_hash.clone(),
            role: account.role.as_str().to_string(),
            created_utc: Utc::now(),
        };
        accounts.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl OwnershipStore for MemoryStore {
    async fn find_ownership_record(
        &self,
        resource_id: i64,
    ) -> Result<Option<OwnershipRecord>, anyhow::Error> {
        self.ownership_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let owners = self
            .review_owners
            .lock()
            .map_err(|e| anyhow::anyhow!("Memory store mutex poisoned: {}", e))?;
        Ok(owners.get(&resource_id).map(|&owner_id| OwnershipRecord {
            resource_id,
            owner_id,
        }))
    }
}
