//! Active workspace and demo mode.
//!
//! The workspace is never chosen directly: it follows the profile of the
//! signed-in user. Without a session the client may enter demo mode, which
//! swaps in a synthetic workspace backed by static sample data.

use std::sync::{Arc, Mutex, PoisonError};

use opero_core::demo::{self, DemoAction, DemoDecision};
use opero_core::error::{ServiceError, ServiceResult};
use opero_core::workspace::Workspace;
use opero_infrastructure::WorkspaceService;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::session::SessionStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceState {
    pub workspace: Option<Workspace>,
    pub demo_mode: bool,
}

pub struct WorkspaceStore {
    session: Arc<SessionStore>,
    workspaces: WorkspaceService,
    state: watch::Sender<WorkspaceState>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl WorkspaceStore {
    pub fn new(session: Arc<SessionStore>, workspaces: WorkspaceService) -> Arc<Self> {
        let (state, _) = watch::channel(WorkspaceState::default());
        Arc::new(Self {
            session,
            workspaces,
            state,
            watcher: Mutex::new(None),
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn state(&self) -> WorkspaceState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkspaceState> {
        self.state.subscribe()
    }

    pub fn is_demo(&self) -> bool {
        self.state.borrow().demo_mode
    }

    pub fn active_workspace(&self) -> Option<Workspace> {
        self.state.borrow().workspace.clone()
    }

    /// Id of the active workspace, or a validation error when there is none.
    pub fn require_workspace_id(&self) -> ServiceResult<String> {
        self.state
            .borrow()
            .workspace
            .as_ref()
            .map(|ws| ws.id.clone())
            .ok_or_else(|| ServiceError::validation("Önce bir çalışma alanı oluşturun."))
    }

    /// Re-derives the active workspace from the session.
    pub async fn sync(&self) -> ServiceResult<WorkspaceState> {
        let session = self.session.state();
        if session.is_authenticated() {
            self.state.send_if_modified(|s| {
                if !s.demo_mode {
                    return false;
                }
                s.demo_mode = false;
                s.workspace = None;
                true
            });
            let workspace = match session.workspace_id() {
                Some(id) => match self.workspaces.get_workspace(id).await {
                    Ok(workspace) => Some(workspace),
                    Err(err) => {
                        self.state.send_modify(|s| s.workspace = None);
                        return Err(err);
                    }
                },
                None => None,
            };
            self.state.send_modify(|s| s.workspace = workspace);
        } else {
            self.state.send_if_modified(|s| {
                if s.demo_mode || s.workspace.is_none() {
                    return false;
                }
                s.workspace = None;
                true
            });
        }
        Ok(self.state())
    }

    /// Switches to the synthetic demo workspace. Refused while signed in.
    pub fn enter_demo(&self) -> ServiceResult<()> {
        if self.session.state().is_authenticated() {
            return Err(ServiceError::validation(
                "Demo modu yalnızca oturum açılmamışken kullanılabilir.",
            ));
        }
        self.state.send_modify(|s| {
            s.demo_mode = true;
            s.workspace = Some(demo::demo_workspace());
        });
        tracing::info!("Entered demo mode");
        Ok(())
    }

    pub fn exit_demo(&self) {
        self.state.send_if_modified(|s| {
            if !s.demo_mode {
                return false;
            }
            s.demo_mode = false;
            s.workspace = None;
            true
        });
    }

    pub fn can(&self, action: DemoAction) -> DemoDecision {
        demo::check(action, self.is_demo())
    }

    pub fn ensure(&self, action: DemoAction) -> ServiceResult<()> {
        demo::ensure_allowed(action, self.is_demo())
    }

    /// Keeps the workspace in step with session changes until [`Self::unwatch`].
    pub fn watch(self: &Arc<Self>) {
        let mut changes = self.session.subscribe();
        let store = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let Some(store) = store.upgrade() else {
                    break;
                };
                if let Err(err) = store.sync().await {
                    tracing::warn!("Failed to sync workspace: {}", err);
                }
            }
        });

        let previous = self
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    pub fn unwatch(&self) {
        let handle = self
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for WorkspaceStore {
    fn drop(&mut self) {
        self.unwatch();
    }
}
