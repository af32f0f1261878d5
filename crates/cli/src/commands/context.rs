use std::sync::Arc;

use esm_client::{
    ApiError, FileSessionStore, LoginRedirect, SessionClient, SessionContext, SessionStore,
};
use esm_core::config::AppConfig;
use esm_core::{view_for, Capability, SessionUser};

use super::{load_config, Failure, GlobalArgs};

/// Composition root for one command invocation.
pub struct CommandContext {
    pub config: AppConfig,
    pub client: SessionClient,
}

impl CommandContext {
    pub async fn open(command: &str, global: &GlobalArgs) -> Result<Self, Failure> {
        let config = load_config(global)?;
        let store: Arc<dyn SessionStore> =
            Arc::new(FileSessionStore::new(config.session.store_path.clone()));
        let session = SessionContext::hydrate(store, Arc::new(LoginRedirect)).await?;
        let client = SessionClient::new(&config.api, Arc::new(session))?;

        tracing::debug!(
            event_name = "cli.context_opened",
            command,
            base_url = %config.api.base_url,
            "command context ready"
        );
        Ok(Self { config, client })
    }

    pub async fn signed_in_user(&self) -> Result<SessionUser, Failure> {
        Ok(self.client.session().require_user().await?)
    }

    /// Checks the stored role before any network call.
    pub async fn require_any(&self, capabilities: &[Capability]) -> Result<SessionUser, Failure> {
        let user = self.signed_in_user().await?;
        let view = view_for(user.role);
        if capabilities.iter().any(|capability| view.can(*capability)) {
            return Ok(user);
        }

        let wanted: Vec<&str> = capabilities.iter().map(Capability::as_str).collect();
        Err(Failure::Api(ApiError::Forbidden {
            message: format!("role {} lacks capability {}", user.role, wanted.join(" or ")),
        }))
    }

    pub async fn require(&self, capability: Capability) -> Result<SessionUser, Failure> {
        self.require_any(&[capability]).await
    }
}
