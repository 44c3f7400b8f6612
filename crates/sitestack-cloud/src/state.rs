//! State management for converged resources
//!
//! Manages the `.sitestack/state.json` file which records, per logical
//! resource ID, the description that was last applied and the attributes the
//! engine reported for it.

use crate::action::Attributes;
use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitestack_core::{Resource, ResourceGraph, ResourceKind};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const STATE_VERSION: u32 = 1;
pub const STATE_DIR: &str = ".sitestack";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const STATE_STAGING: &str = "state.json.tmp";
const LOCK_FILE: &str = "lock.json";

/// Converged state of the whole stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Resources indexed by logical ID
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a resource
    pub fn set_resource(&mut self, key: String, state: ResourceState) {
        self.resources.insert(key, state);
        self.updated_at = Utc::now();
    }

    /// Remove a resource
    pub fn remove_resource(&mut self, key: &str) -> Option<ResourceState> {
        let result = self.resources.remove(key);
        if result.is_some() {
            self.updated_at = Utc::now();
        }
        result
    }

    /// Get a resource by key
    pub fn get_resource(&self, key: &str) -> Option<&ResourceState> {
        self.resources.get(key)
    }

    pub fn get_resource_mut(&mut self, key: &str) -> Option<&mut ResourceState> {
        self.resources.get_mut(key)
    }

    /// Rebuild the graph of recorded descriptions (used to order teardown)
    pub fn to_graph(&self) -> Result<ResourceGraph> {
        let mut graph = ResourceGraph::new();
        for state in self.resources.values() {
            graph.add(state.resource.clone())?;
        }
        Ok(graph)
    }
}

/// State of a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Engine-assigned physical ID
    pub id: String,

    /// Description as last applied
    pub resource: Resource,

    /// Current status
    pub status: ResourceStatus,

    /// Resource attributes (hostnames, IDs, ...)
    pub attributes: Attributes,

    /// When the resource was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>, resource: Resource) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            resource,
            status: ResourceStatus::Ready,
            attributes: Attributes::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(key.into(), value);
        self.updated_at = Utc::now();
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Status of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Resource converged and is ready
    Ready,
    /// Last apply of this resource failed
    Failed,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Ready => write!(f, "ready"),
            ResourceStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Reads and writes `.sitestack/state.json` and guards it with `lock.json`
pub struct StateManager {
    state_dir: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            state_dir: project_root.as_ref().join(STATE_DIR),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_dir.join(STATE_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir.join(LOCK_FILE)
    }

    /// Load the recorded state, or an empty one before the first apply
    pub async fn load(&self) -> Result<GlobalState> {
        let content = match fs::read_to_string(self.state_path()).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No state recorded yet");
                return Ok(GlobalState::new());
            }
            Err(e) => return Err(e.into()),
        };

        let state: GlobalState = serde_json::from_str(&content)?;
        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "{} was written by a newer sitestack (version {}, supported {})",
                self.state_path().display(),
                state.version,
                STATE_VERSION
            )));
        }

        debug!(resources = state.resources.len(), "Loaded state");
        Ok(state)
    }

    /// Replace the recorded state
    ///
    /// The new snapshot is staged next to `state.json` and renamed over it,
    /// so readers see either the previous or the new state, never a partial
    /// write. The previous snapshot is kept as `state.json.backup`.
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        fs::create_dir_all(&self.state_dir).await?;

        let path = self.state_path();
        let staging = self.state_dir.join(STATE_STAGING);
        fs::write(&staging, serde_json::to_vec_pretty(state)?).await?;

        match fs::copy(&path, self.state_dir.join(STATE_BACKUP)).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::rename(&staging, &path).await?;

        debug!(resources = state.resources.len(), "Saved state");
        Ok(())
    }

    /// Take the exclusive apply lock
    ///
    /// `lock.json` is created with `create_new`, so exactly one caller wins.
    /// A lock older than [`STALE_LOCK_AFTER_HOURS`] is broken and creation is
    /// retried once.
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        fs::create_dir_all(&self.state_dir).await?;

        let lock_path = self.lock_path();
        let info = LockInfo::current();

        match create_lock_file(&lock_path, &info).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                break_stale_lock(&lock_path).await?;
                create_lock_file(&lock_path, &info)
                    .await
                    .map_err(|e| match e.kind() {
                        ErrorKind::AlreadyExists => CloudError::LockError(
                            "another process took the state lock while a stale lock was cleared"
                                .to_string(),
                        ),
                        _ => e.into(),
                    })?;
            }
            Err(e) => return Err(e.into()),
        }

        debug!(pid = info.pid, "Acquired state lock");
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

/// Locks older than this are assumed to belong to a crashed process
pub const STALE_LOCK_AFTER_HOURS: i64 = 1;

/// Contents of `lock.json`
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    host: String,
    pid: u32,
    command: String,
    acquired_at: DateTime<Utc>,
}

impl LockInfo {
    fn current() -> Self {
        Self {
            host: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            pid: std::process::id(),
            command: std::env::args().collect::<Vec<_>>().join(" "),
            acquired_at: Utc::now(),
        }
    }
}

async fn create_lock_file(path: &Path, info: &LockInfo) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(&serde_json::to_vec_pretty(info)?).await?;
    file.flush().await
}

/// Remove `lock.json` if its holder is presumed dead, otherwise report who holds it
async fn break_stale_lock(path: &Path) -> Result<()> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        // Released between our create attempt and this read
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let holder = serde_json::from_str::<LockInfo>(&content).ok();
    let acquired_at = match &holder {
        Some(info) => info.acquired_at,
        // Holder is still writing lock.json (or died doing so); judge by mtime
        None => DateTime::<Utc>::from(fs::metadata(path).await?.modified()?),
    };

    if Utc::now().signed_duration_since(acquired_at).num_hours() < STALE_LOCK_AFTER_HOURS {
        let who = holder
            .map(|h| format!("{} (pid {} on {}: {})", h.acquired_at, h.pid, h.host, h.command))
            .unwrap_or_else(|| format!("{} (lock file still being written)", acquired_at));
        return Err(CloudError::LockError(format!("state is locked since {}", who)));
    }

    warn!(since = %acquired_at, "Breaking stale state lock");
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Held apply lock; released explicitly or on drop
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        match fs::remove_file(&self.lock_path).await {
            Ok(()) => {
                debug!("Released state lock");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
