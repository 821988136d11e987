//! Authentication state shared by the whole client.
//!
//! [`SessionStore`] owns the signed-in user and their profile and publishes
//! every change through a `watch` channel. While mounted it follows the
//! backend's auth events, so a token refresh or a sign-out performed elsewhere
//! is reflected without polling.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use opero_core::auth::{AuthEvent, AuthUser};
use opero_core::backend::Backend;
use opero_core::email::{EmailSender, welcome_email};
use opero_core::error::{ServiceError, ServiceResult};
use opero_core::profile::{NewProfile, Profile, Role};
use opero_infrastructure::ProfileService;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Snapshot of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<AuthUser>,
    pub profile: Option<Profile>,
    pub loading: bool,
    /// Set once loading has taken longer than the configured timeout
    pub loading_timed_out: bool,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn workspace_id(&self) -> Option<&str> {
        self.profile.as_ref()?.workspace_id.as_deref()
    }

    pub fn is_broker(&self) -> bool {
        self.profile.as_ref().is_some_and(Profile::is_broker)
    }
}

/// Registration form.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

pub struct SessionStore {
    backend: Backend,
    profiles: ProfileService,
    email: Arc<dyn EmailSender>,
    state: watch::Sender<SessionState>,
    listener: Mutex<Option<JoinHandle<()>>>,
    loading_timeout: Duration,
}

impl SessionStore {
    pub fn new(backend: Backend, email: Arc<dyn EmailSender>, loading_timeout: Duration) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::default());
        Arc::new(Self {
            profiles: ProfileService::new(backend.clone()),
            backend,
            email,
            state,
            listener: Mutex::new(None),
            loading_timeout,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().user.clone()
    }

    pub fn require_user(&self) -> ServiceResult<AuthUser> {
        self.current_user()
            .ok_or_else(|| ServiceError::validation("Bu işlem için oturum açmanız gerekir."))
    }

    /// Loads the persisted session and starts following auth events.
    pub async fn mount(self: &Arc<Self>) -> ServiceResult<SessionState> {
        let events = self.backend.auth.subscribe();
        self.start_listener(events);

        self.state.send_modify(|s| {
            s.loading = true;
            s.loading_timed_out = false;
        });

        let load = self.load_current();
        tokio::pin!(load);
        let result = tokio::select! {
            result = &mut load => result,
            _ = tokio::time::sleep(self.loading_timeout) => {
                tracing::warn!(timeout = ?self.loading_timeout, "Session is taking long to load");
                self.state.send_modify(|s| s.loading_timed_out = true);
                load.await
            }
        };

        match result {
            Ok(user) => {
                let profile = match &user {
                    Some(user) => self.load_profile(&user.id).await,
                    None => None,
                };
                self.publish(user, profile);
                Ok(self.state())
            }
            Err(err) => {
                self.state.send_modify(|s| s.loading = false);
                Err(err)
            }
        }
    }

    /// Stops following auth events.
    pub fn unmount(&self) {
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!("Session listener stopped");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<SessionState> {
        let user = self.backend.auth.sign_in(email, password).await?;
        let profile = self.load_profile(&user.id).await;
        tracing::info!(user_id = %user.id, "Signed in");
        self.publish(Some(user), profile);
        Ok(self.state())
    }

    /// Registers the user, creates their profile row and sends a welcome e-mail.
    pub async fn sign_up(&self, form: SignUp) -> ServiceResult<SessionState> {
        if form.full_name.trim().is_empty() {
            return Err(ServiceError::validation("Ad soyad zorunludur."));
        }
        let user = self.backend.auth.sign_up(&form.email, &form.password).await?;
        let profile = self
            .profiles
            .create_profile(NewProfile {
                id: user.id.clone(),
                email: user.email.clone(),
                full_name: form.full_name.trim().to_string(),
                role: form.role,
                workspace_id: None,
            })
            .await?;

        if let Err(err) = self.email.send(welcome_email(&user.email, &profile.full_name)).await {
            tracing::warn!(user_id = %user.id, "Welcome e-mail failed: {}", err);
        }

        self.publish(Some(user), Some(profile));
        Ok(self.state())
    }

    pub async fn sign_out(&self) -> ServiceResult<()> {
        self.backend.auth.sign_out().await?;
        self.publish(None, None);
        tracing::info!("Signed out");
        Ok(())
    }

    /// Re-reads the profile row, e.g. after XP or membership changed.
    pub async fn refresh_profile(&self) -> ServiceResult<Option<Profile>> {
        let Some(user) = self.current_user() else {
            return Ok(None);
        };
        let profile = self.profiles.get_profile(&user.id).await?;
        self.state.send_modify(|s| s.profile = Some(profile.clone()));
        Ok(Some(profile))
    }

    async fn load_current(&self) -> ServiceResult<Option<AuthUser>> {
        Ok(self.backend.auth.current_user().await?)
    }

    /// A missing profile row is not an error: the user may be mid-registration.
    async fn load_profile(&self, user_id: &str) -> Option<Profile> {
        match self.profiles.get_profile(user_id).await {
            Ok(profile) => Some(profile),
            Err(err) => {
                if !err.is_not_found() {
                    tracing::warn!(user_id, "Failed to load profile: {}", err);
                }
                None
            }
        }
    }

    fn publish(&self, user: Option<AuthUser>, profile: Option<Profile>) {
        self.state.send_modify(|s| {
            s.user = user;
            s.profile = profile;
            s.loading = false;
            s.loading_timed_out = false;
        });
    }

    fn start_listener(self: &Arc<Self>, mut events: broadcast::Receiver<AuthEvent>) {
        let store = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth events lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.apply_event(event).await;
            }
        });

        let previous = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    async fn apply_event(&self, event: AuthEvent) {
        tracing::debug!(?event, "Auth event");
        match event.user() {
            Some(user) => {
                let same_user = self.current_user().is_some_and(|current| current.id == user.id);
                let profile = self.load_profile(&user.id).await;
                if same_user && profile.is_none() {
                    // Keep the known profile when a refresh races a transient failure.
                    self.state.send_modify(|s| {
                        s.user = Some(user.clone());
                        s.loading = false;
                    });
                } else {
                    self.publish(Some(user.clone()), profile);
                }
            }
            None => self.publish(None, None),
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opero_core::auth::AuthBackend;
    use opero_core::config::EmailSettings;
    use opero_core::error::ErrorKind;
    use opero_infrastructure::{LocalBackend, SimulatedEmailSender};

    fn store(local: &Arc<LocalBackend>) -> (Arc<SessionStore>, Arc<SimulatedEmailSender>) {
        let email = Arc::new(SimulatedEmailSender::new(&EmailSettings {
            simulated_delay_ms: 0,
            ..Default::default()
        }));
        let store = SessionStore::new(
            Backend::from_shared(local.clone()),
            email.clone(),
            Duration::from_secs(10),
        );
        (store, email)
    }

    fn form(email: &str) -> SignUp {
        SignUp {
            email: email.to_string(),
            password: "secret1".to_string(),
            full_name: "Ayşe Güneş".to_string(),
            role: Role::Broker,
        }
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile_and_sends_welcome() {
        let local = Arc::new(LocalBackend::in_memory());
        let (store, email) = store(&local);

        let state = store.sign_up(form("ayse@ofis.com")).await.unwrap();
        assert!(state.is_authenticated());
        assert!(state.is_broker());
        assert_eq!(email.sent().len(), 1);

        store.sign_out().await.unwrap();
        assert!(!store.state().is_authenticated());
        assert!(store.state().profile.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_failure_is_normalized() {
        let local = Arc::new(LocalBackend::in_memory());
        let (store, _) = store(&local);

        let err = store.sign_in("yok@ofis.com", "secret1").await.unwrap_err();
        assert_eq!(err.message, "E-posta veya şifre hatalı.");
        assert!(!store.state().loading);
    }

    #[tokio::test]
    async fn test_mount_restores_persisted_session() {
        let local = Arc::new(LocalBackend::in_memory());
        let (first, _) = store(&local);
        first.sign_up(form("ayse@ofis.com")).await.unwrap();

        let (second, _) = store(&local);
        let state = second.mount().await.unwrap();
        assert!(state.is_authenticated());
        assert_eq!(state.profile.unwrap().full_name, "Ayşe Güneş");
        assert!(second.is_mounted());
        second.unmount();
        assert!(!second.is_mounted());
    }

    #[tokio::test]
    async fn test_listener_follows_backend_sign_out() {
        let local = Arc::new(LocalBackend::in_memory());
        let (store, _) = store(&local);
        store.sign_up(form("ayse@ofis.com")).await.unwrap();
        store.mount().await.unwrap();

        let mut changes = store.subscribe();
        changes.borrow_and_update();
        local.sign_out().await.unwrap();

        changes.changed().await.unwrap();
        assert!(!changes.borrow().is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_load_flags_timeout_without_aborting() {
        let local = Arc::new(LocalBackend::in_memory());
        let (store, _) = store(&local);
        let mut changes = store.subscribe();

        local.set_latency(Duration::from_secs(15));
        let mounted = {
            let store = store.clone();
            tokio::spawn(async move { store.mount().await })
        };

        loop {
            changes.changed().await.unwrap();
            if changes.borrow().loading_timed_out {
                break;
            }
        }
        assert!(changes.borrow().loading);

        let state = mounted.await.unwrap().unwrap();
        assert!(!state.loading);
        assert!(!state.loading_timed_out);
        assert!(!state.is_authenticated());
    }

    #[tokio::test]
    async fn test_profile_lookup_failure_does_not_block_sign_in() {
        let local = Arc::new(LocalBackend::in_memory());
        local.sign_up("ayse@ofis.com", "secret1").await.unwrap();
        local.sign_out().await.unwrap();
        let (store, _) = store(&local);

        let state = store.sign_in("ayse@ofis.com", "secret1").await.unwrap();
        assert!(state.is_authenticated());
        assert!(state.profile.is_none());

        let err = store
            .sign_up(SignUp {
                full_name: " ".to_string(),
                ..form("yeni@ofis.com")
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
