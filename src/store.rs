//! Persistence of pricing snapshots and calculation history.
//!
//! The calculator itself never touches storage.  Callers that want to
//! remember an account's last inputs, or keep a history of results,
//! hold a [`PricingStore`] built by the composition root and pass it
//! where it is needed.  Two implementations are provided: an in-memory
//! store for tests and single-process deployments, and a store that
//! keeps one JSON document per account in a directory.

use crate::error::{PricingError, Result};
use crate::models::{PricingRecord, PricingSnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};

/// Records kept per account unless a store is built with another limit.
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// Storage for per-account pricing data.
///
/// Implementations must be thread-safe (`Send + Sync`) because request
/// handlers call them concurrently.
#[async_trait]
pub trait PricingStore: Send + Sync {
    /// Replaces the account's saved snapshot.
    async fn save_snapshot(&self, account: &str, snapshot: PricingSnapshot) -> Result<()>;
    async fn load_snapshot(&self, account: &str) -> Result<Option<PricingSnapshot>>;
    /// Appends a record to the account's history, dropping the oldest
    /// records beyond the store's history limit.
    async fn append_record(&self, account: &str, record: PricingRecord) -> Result<()>;
    /// Returns the account's history, newest first, at most `limit` entries.
    async fn history(&self, account: &str, limit: Option<usize>) -> Result<Vec<PricingRecord>>;
}

/// Everything stored for one account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountData {
    snapshot: Option<PricingSnapshot>,
    #[serde(default)]
    history: Vec<PricingRecord>,
}

impl AccountData {
    fn push_record(&mut self, record: PricingRecord, limit: usize) {
        self.history.push(record);
        if self.history.len() > limit {
            self.history.sort_by(|a, b| a.calculated_at.cmp(&b.calculated_at));
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }

    fn newest_first(&self, limit: Option<usize>) -> Vec<PricingRecord> {
        let mut records: Vec<PricingRecord> = self.history.clone();
        records.sort_by(|a, b| b.calculated_at.cmp(&a.calculated_at));
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        records
    }
}

pub struct InMemoryStore {
    accounts: RwLock<HashMap<String, AccountData>>,
    history_limit: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            history_limit,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PricingStore for InMemoryStore {
    async fn save_snapshot(&self, account: &str, snapshot: PricingSnapshot) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        accounts.entry(account.to_string()).or_default().snapshot = Some(snapshot);
        Ok(())
    }

    async fn load_snapshot(&self, account: &str) -> Result<Option<PricingSnapshot>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(account).and_then(|data| data.snapshot.clone()))
    }

    async fn append_record(&self, account: &str, record: PricingRecord) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        accounts
            .entry(account.to_string())
            .or_default()
            .push_record(record, self.history_limit);
        Ok(())
    }

    async fn history(&self, account: &str, limit: Option<usize>) -> Result<Vec<PricingRecord>> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .get(account)
            .map(|data| data.newest_first(limit))
            .unwrap_or_default())
    }
}

/// Keeps one `<account>.json` file per account under a directory.
pub struct JsonFileStore {
    dir: PathBuf,
    history_limit: usize,
    // Serialises read-modify-write cycles so concurrent appends are not lost.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::info!(dir = %dir.display(), "opened pricing store");
        Ok(Self {
            dir,
            history_limit: DEFAULT_HISTORY_LIMIT,
            write_lock: Mutex::new(()),
        })
    }

    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    fn account_path(&self, account: &str) -> Result<PathBuf> {
        let valid = !account.is_empty()
            && account
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PricingError::Storage(format!("invalid account id '{}'", account)));
        }
        Ok(self.dir.join(format!("{}.json", account)))
    }

    async fn read_account(&self, account: &str) -> Result<AccountData> {
        let path = self.account_path(account)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(AccountData::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_account(&self, account: &str, data: &AccountData) -> Result<()> {
        let path = self.account_path(account)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(data)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl PricingStore for JsonFileStore {
    async fn save_snapshot(&self, account: &str, snapshot: PricingSnapshot) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.read_account(account).await?;
        data.snapshot = Some(snapshot);
        self.write_account(account, &data).await
    }

    async fn load_snapshot(&self, account: &str) -> Result<Option<PricingSnapshot>> {
        Ok(self.read_account(account).await?.snapshot)
    }

    async fn append_record(&self, account: &str, record: PricingRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.read_account(account).await?;
        data.push_record(record, self.history_limit);
        self.write_account(account, &data).await
    }

    async fn history(&self, account: &str, limit: Option<usize>) -> Result<Vec<PricingRecord>> {
        Ok(self.read_account(account).await?.newest_first(limit))
    }
}
