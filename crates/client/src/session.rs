use std::sync::Arc;

use esm_core::{view_for, Credentials, RoleView, SessionUser};
use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{ApiError, StoreError};
use crate::store::SessionStore;

/// Receives the signal that the user has to sign in again.
pub trait SessionObserver: Send + Sync {
    fn session_expired(&self, reason: &str);
}

/// Default observer: tells the operator to run `esm login`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoginRedirect;

impl SessionObserver for LoginRedirect {
    fn session_expired(&self, reason: &str) {
        warn!(
            event_name = "session.expired",
            reason,
            "session is no longer valid; run `esm login` to sign in again"
        );
    }
}

/// Explicit session state shared by the HTTP client and the CLI.
///
/// Tokens are always read back from the store so a rotation made by one
/// request is visible to every other request.
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    observer: Arc<dyn SessionObserver>,
    user: RwLock<Option<SessionUser>>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>, observer: Arc<dyn SessionObserver>) -> Self {
        Self { store, observer, user: RwLock::new(None) }
    }

    /// Builds a context from whatever the store currently holds.
    pub async fn hydrate(
        store: Arc<dyn SessionStore>,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Self, StoreError> {
        let persisted = store.load().await?;
        let context = Self::new(store, observer);
        *context.user.write().await = persisted.user;
        Ok(context)
    }

    pub async fn establish(
        &self,
        credentials: Credentials,
        user: SessionUser,
    ) -> Result<(), StoreError> {
        self.store.save_credentials(&credentials).await?;
        self.store.save_user(&user).await?;
        info!(
            event_name = "session.established",
            user_id = user.id.0,
            role = user.role.as_str(),
            "session established"
        );
        *self.user.write().await = Some(user);
        Ok(())
    }

    pub async fn rotate(&self, credentials: Credentials) -> Result<(), StoreError> {
        self.store.save_credentials(&credentials).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear().await?;
        *self.user.write().await = None;
        Ok(())
    }

    /// Purges persisted state and notifies the observer.
    pub(crate) async fn expire(&self, reason: &str) {
        if let Err(error) = self.clear().await {
            warn!(
                event_name = "session.purge_failed",
                error = %error,
                "could not purge persisted session state"
            );
        }
        self.observer.session_expired(reason);
    }

    pub async fn access_token(&self) -> Result<Option<SecretString>, StoreError> {
        Ok(self.store.load().await?.access_token)
    }

    pub async fn refresh_token(&self) -> Result<Option<SecretString>, StoreError> {
        Ok(self.store.load().await?.refresh_token)
    }

    pub async fn user(&self) -> Option<SessionUser> {
        self.user.read().await.clone()
    }

    pub async fn require_user(&self) -> Result<SessionUser, ApiError> {
        self.user().await.ok_or_else(ApiError::not_signed_in)
    }

    pub async fn is_authenticated(&self) -> Result<bool, StoreError> {
        Ok(self.user().await.is_some() && self.access_token().await?.is_some())
    }

    pub async fn view(&self) -> Option<Box<dyn RoleView>> {
        self.user().await.map(|user| view_for(user.role))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use esm_core::{Capability, Credentials, Role, SessionUser, UserId};
    use secrecy::ExposeSecret;

    use super::{SessionContext, SessionObserver};
    use crate::store::{InMemorySessionStore, SessionStore};

    #[derive(Default)]
    struct Recorder {
        reasons: Mutex<Vec<String>>,
    }

    impl SessionObserver for Recorder {
        fn session_expired(&self, reason: &str) {
            if let Ok(mut reasons) = self.reasons.lock() {
                reasons.push(reason.to_string());
            }
        }
    }

    fn manager() -> SessionUser {
        SessionUser { id: UserId(3), username: "mgr".to_string(), role: Role::Manager }
    }

    #[tokio::test]
    async fn hydrate_restores_user_and_role_view() {
        let store = Arc::new(InMemorySessionStore::with_session(
            Some(Credentials::new("a1", "r1")),
            Some(manager()),
        ));
        let context = SessionContext::hydrate(store, Arc::new(Recorder::default()))
            .await
            .expect("hydrate");

        assert!(context.is_authenticated().await.expect("store"));
        let view = context.view().await.expect("view");
        assert!(view.can(Capability::ReviewApprovals));
        assert!(!view.can(Capability::ManageUsers));
    }

    #[tokio::test]
    async fn establish_then_rotate_then_clear() {
        let store = Arc::new(InMemorySessionStore::default());
        let context = SessionContext::new(store.clone(), Arc::new(Recorder::default()));

        context.establish(Credentials::new("a1", "r1"), manager()).await.expect("establish");
        context.rotate(Credentials::new("a2", "r2")).await.expect("rotate");

        let access = context.access_token().await.expect("store").expect("token");
        assert_eq!(access.expose_secret(), "a2");

        context.clear().await.expect("clear");
        assert!(context.user().await.is_none());
        assert!(store.load().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn expire_purges_and_signals_observer() {
        let store = Arc::new(InMemorySessionStore::with_session(
            Some(Credentials::new("a1", "r1")),
            Some(manager()),
        ));
        let recorder = Arc::new(Recorder::default());
        let context = SessionContext::hydrate(store.clone(), recorder.clone())
            .await
            .expect("hydrate");

        context.expire("refresh rejected").await;

        assert!(store.load().await.expect("load").is_empty());
        let reasons = recorder.reasons.lock().expect("reasons");
        assert_eq!(reasons.as_slice(), ["refresh rejected".to_string()]);
    }
}
