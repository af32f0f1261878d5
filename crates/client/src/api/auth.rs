use esm_core::{Credentials, Role, SessionUser, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::http::{ApiRequest, SessionClient};

pub const LOGIN_PATH: &str = "/auth/login";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    id: UserId,
    #[serde(alias = "token")]
    access_token: String,
    refresh_token: String,
    username: String,
    role: String,
}

pub struct AuthApi<'a> {
    client: &'a SessionClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a SessionClient) -> Self {
        Self { client }
    }

    /// Exchanges a username and password for a session and persists it.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<SessionUser, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .anonymous()
            .json(&LoginRequest { username, password: password.expose_secret() })?;
        let response: LoginResponse = self.client.send_json(request).await?;

        let credentials = Credentials::new(response.access_token, response.refresh_token);
        if !credentials.is_complete() {
            return Err(ApiError::Decode("login response did not carry a token pair".to_string()));
        }

        let role: Role = response.role.parse()?;
        let user = SessionUser { id: response.id, username: response.username, role };
        self.client.session().establish(credentials, user.clone()).await?;
        Ok(user)
    }

    /// Drops the local session. The backend keeps no logout endpoint.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let user = self.client.session().user().await;
        self.client.session().clear().await?;
        info!(
            event_name = "session.logout",
            user_id = user.map(|user| user.id.0),
            "signed out"
        );
        Ok(())
    }
}
