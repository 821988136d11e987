use async_trait::async_trait;
use opero_core::auth::{AuthBackend, AuthEvent, AuthUser};
use opero_core::error::{BackendError, BackendResult, codes};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{Account, LocalBackend};

const MIN_PASSWORD_LENGTH: usize = 6;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AuthBackend for LocalBackend {
    async fn current_user(&self) -> BackendResult<Option<AuthUser>> {
        self.enter().await?;
        Ok(self.state.read().await.session.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthUser> {
        self.enter().await?;
        let email = normalize_email(email);
        let mut state = self.state.write().await;

        let user = match state.accounts.get(&email) {
            Some(account) if account.password == password => account.user.clone(),
            _ => {
                tracing::debug!(%email, "Rejected sign-in");
                return Err(BackendError::new(
                    codes::INVALID_CREDENTIALS,
                    "Invalid login credentials",
                ));
            }
        };

        state.session = Some(user.clone());
        let _ = self.events.send(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<AuthUser> {
        self.enter().await?;
        let email = normalize_email(email);
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(BackendError::new(
                codes::WEAK_PASSWORD,
                "Password should be at least 6 characters",
            ));
        }

        let mut state = self.state.write().await;
        if state.accounts.contains_key(&email) {
            return Err(BackendError::new(
                codes::USER_ALREADY_EXISTS,
                "User already registered",
            ));
        }

        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
        };
        state.accounts.insert(
            email,
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        state.session = Some(user.clone());
        let _ = self.events.send(AuthEvent::SignedIn(user.clone()));

        tracing::info!(user_id = %user.id, "Registered new user");
        Ok(user)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        self.enter().await?;
        let mut state = self.state.write().await;
        if state.session.take().is_some() {
            let _ = self.events.send(AuthEvent::SignedOut);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
