//! Local implementation of the hosted backend.
//!
//! Tables live in memory and can be mirrored to `<tables_dir>/<table>.toml`.
//! The implementation enforces the constraints the hosted database declares
//! (primary keys, unique keys, foreign keys, row-level security) and reports
//! violations with the same codes, so callers exercise the same error paths
//! they would against the real service.
//!
//! Row-level security follows one rule set: a signed-in user may only touch
//! rows of the workspace their profile belongs to, and their own per-user
//! rows. A backend opened with [`LocalBackend::with_service_role`] bypasses
//! these checks, as scheduled jobs do against the hosted store.

mod auth;
mod objects;
mod repositories;
mod table;

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use opero_core::auth::{AuthEvent, AuthUser};
use opero_core::error::{BackendError, BackendResult, Result};
use opero_core::gamification::DailyTask;
use opero_core::profile::Profile;
use opero_core::property::Property;
use opero_core::team::Invitation;
use opero_core::workspace::Workspace;
use tokio::sync::{RwLock, broadcast};

use crate::paths::OperoPaths;
use objects::{ObjectMap, load_objects};
use table::{Row, Table};

const DEFAULT_PUBLIC_URL: &str = "http://localhost:54321";

impl Row for Profile {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Row for Workspace {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Row for Property {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Row for Invitation {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Row for DailyTask {
    fn id(&self) -> &str {
        &self.id
    }
}

/// In-memory credentials; never written to disk.
struct Account {
    user: AuthUser,
    password: String,
}

struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

struct LocalState {
    session: Option<AuthUser>,
    accounts: HashMap<String, Account>,
    profiles: Table<Profile>,
    workspaces: Table<Workspace>,
    properties: Table<Property>,
    invitations: Table<Invitation>,
    daily_tasks: Table<DailyTask>,
    objects: ObjectMap,
}

impl LocalState {
    fn in_memory() -> Self {
        Self {
            session: None,
            accounts: HashMap::new(),
            profiles: Table::in_memory("profiles"),
            workspaces: Table::in_memory("workspaces"),
            properties: Table::in_memory("properties"),
            invitations: Table::in_memory("invitations"),
            daily_tasks: Table::in_memory("daily_tasks"),
            objects: ObjectMap::new(),
        }
    }

    fn persistent(tables_dir: &Path, storage_dir: &Path) -> Result<Self> {
        Ok(Self {
            session: None,
            accounts: HashMap::new(),
            profiles: Table::persistent("profiles", tables_dir)?,
            workspaces: Table::persistent("workspaces", tables_dir)?,
            properties: Table::persistent("properties", tables_dir)?,
            invitations: Table::persistent("invitations", tables_dir)?,
            daily_tasks: Table::persistent("daily_tasks", tables_dir)?,
            objects: load_objects(storage_dir)?,
        })
    }
}

/// Who is performing a request.
enum Actor<'a> {
    Service,
    User(&'a AuthUser),
    Anonymous,
}

pub struct LocalBackend {
    state: RwLock<LocalState>,
    service_role: bool,
    events: broadcast::Sender<AuthEvent>,
    faults: Mutex<VecDeque<Option<BackendError>>>,
    reads: AtomicUsize,
    latency_ms: AtomicU64,
    storage_dir: Option<PathBuf>,
    public_url: String,
}

impl LocalBackend {
    /// A fresh backend that keeps everything in memory.
    pub fn in_memory() -> Self {
        Self::from_state(LocalState::in_memory(), None)
    }

    /// A backend whose tables and objects live under the data directory.
    pub fn persistent(paths: &OperoPaths) -> Result<Self> {
        let storage_dir = paths.storage_dir()?;
        let state = LocalState::persistent(&paths.tables_dir()?, &storage_dir)?;
        tracing::debug!(objects = state.objects.len(), "Opened local backend");
        Ok(Self::from_state(state, Some(storage_dir)))
    }

    fn from_state(state: LocalState, storage_dir: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            state: RwLock::new(state),
            service_role: false,
            events,
            faults: Mutex::new(VecDeque::new()),
            reads: AtomicUsize::new(0),
            latency_ms: AtomicU64::new(0),
            storage_dir,
            public_url: DEFAULT_PUBLIC_URL.to_string(),
        }
    }

    /// Bypasses row-level security for every request.
    pub fn with_service_role(mut self) -> Self {
        self.service_role = true;
        self
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Makes the next request fail with `err`. Queued failures are consumed
    /// in order, one per request.
    pub fn inject_failure(&self, err: BackendError) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Some(err));
    }

    /// Lets the next `count` requests through ahead of any failure queued
    /// after this call.
    pub fn pass_requests(&self, count: usize) {
        let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        faults.extend(std::iter::repeat_with(|| None).take(count));
    }

    /// Delays every subsequent request by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of read requests served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Re-issues the session token and notifies subscribers.
    pub async fn refresh_session(&self) -> BackendResult<()> {
        let state = self.state.read().await;
        match &state.session {
            Some(user) => {
                let _ = self.events.send(AuthEvent::TokenRefreshed(user.clone()));
                Ok(())
            }
            None => Err(BackendError::new(
                opero_core::error::codes::JWT_EXPIRED,
                "JWT expired",
            )),
        }
    }

    fn take_fault(&self) -> BackendResult<()> {
        let fault = self
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .flatten();
        match fault {
            Some(err) => {
                tracing::debug!(code = ?err.code, "Injected backend failure");
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Applies the simulated latency, then the next injected failure if any.
    async fn enter(&self) -> BackendResult<()> {
        let millis = self.latency_ms.load(Ordering::SeqCst);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        self.take_fault()
    }

    async fn begin_read(&self) -> BackendResult<()> {
        self.enter().await?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn actor<'a>(&self, state: &'a LocalState) -> Actor<'a> {
        if self.service_role {
            return Actor::Service;
        }
        match &state.session {
            Some(user) => Actor::User(user),
            None => Actor::Anonymous,
        }
    }

    /// Workspace the acting user belongs to, if any.
    fn actor_workspace<'a>(state: &'a LocalState, user: &AuthUser) -> Option<&'a str> {
        state
            .profiles
            .get(&user.id)
            .and_then(|profile| profile.workspace_id.as_deref())
    }

    /// Whether the actor may see rows of `workspace_id`.
    fn can_access_workspace(&self, state: &LocalState, workspace_id: &str) -> bool {
        match self.actor(state) {
            Actor::Service => true,
            Actor::User(user) => Self::actor_workspace(state, user) == Some(workspace_id),
            Actor::Anonymous => false,
        }
    }

    fn require_workspace_access(
        &self,
        state: &LocalState,
        workspace_id: &str,
        table: &str,
    ) -> BackendResult<()> {
        if self.can_access_workspace(state, workspace_id) {
            Ok(())
        } else {
            Err(BackendError::permission_denied(table))
        }
    }

    /// Whether the actor may touch rows owned by `user_id`.
    fn can_access_user(&self, state: &LocalState, user_id: &str) -> bool {
        match self.actor(state) {
            Actor::Service => true,
            Actor::User(user) => user.id == user_id,
            Actor::Anonymous => false,
        }
    }

    fn require_user_access(&self, state: &LocalState, user_id: &str, table: &str) -> BackendResult<()> {
        if self.can_access_user(state, user_id) {
            Ok(())
        } else {
            Err(BackendError::permission_denied(table))
        }
    }

    fn require_authenticated(&self, state: &LocalState, table: &str) -> BackendResult<()> {
        match self.actor(state) {
            Actor::Anonymous => Err(BackendError::permission_denied(table)),
            _ => Ok(()),
        }
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::in_memory()
    }
}
