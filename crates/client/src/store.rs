use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use esm_core::{Credentials, SessionUser};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::error::StoreError;

/// Everything the client keeps between runs.
#[derive(Clone, Debug, Default)]
pub struct PersistedSession {
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub user: Option<SessionUser>,
}

impl PersistedSession {
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => Some(Credentials {
                access_token: access.clone(),
                refresh_token: refresh.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<PersistedSession, StoreError>;
    /// Replaces both tokens in one write.
    async fn save_credentials(&self, credentials: &Credentials) -> Result<(), StoreError>;
    async fn save_user(&self, user: &SessionUser) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    session: RwLock<PersistedSession>,
}

impl InMemorySessionStore {
    pub fn with_session(credentials: Option<Credentials>, user: Option<SessionUser>) -> Self {
        let (access_token, refresh_token) = match credentials {
            Some(credentials) => (Some(credentials.access_token), Some(credentials.refresh_token)),
            None => (None, None),
        };
        Self { session: RwLock::new(PersistedSession { access_token, refresh_token, user }) }
    }

    /// Stores an access token with no refresh token next to it.
    pub fn with_access_token_only(access_token: &str, user: Option<SessionUser>) -> Self {
        Self {
            session: RwLock::new(PersistedSession {
                access_token: Some(SecretString::from(access_token.to_string())),
                refresh_token: None,
                user,
            }),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> Result<PersistedSession, StoreError> {
        let session = self.session.read().await;
        Ok(session.clone())
    }

    async fn save_credentials(&self, credentials: &Credentials) -> Result<(), StoreError> {
        let mut session = self.session.write().await;
        session.access_token = Some(credentials.access_token.clone());
        session.refresh_token = Some(credentials.refresh_token.clone());
        Ok(())
    }

    async fn save_user(&self, user: &SessionUser) -> Result<(), StoreError> {
        let mut session = self.session.write().await;
        session.user = Some(user.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut session = self.session.write().await;
        *session = PersistedSession::default();
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<SessionUser>,
}

impl SessionFile {
    fn into_session(self) -> PersistedSession {
        PersistedSession {
            access_token: non_blank(self.access_token),
            refresh_token: non_blank(self.refresh_token),
            user: self.user,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<SecretString> {
    value.filter(|token| !token.trim().is_empty()).map(SecretString::from)
}

/// JSON file store; writes go to a sibling temp file and are renamed into place.
pub struct FileSessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<SessionFile, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(SessionFile::default()),
            Err(source) => return Err(StoreError::Io { path: self.path.clone(), source }),
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(SessionFile::default());
        }
        serde_json::from_slice(&raw)
            .map_err(|source| StoreError::Decode { path: self.path.clone(), source })
    }

    async fn write_file(&self, file: &SessionFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
        }

        let encoded = serde_json::to_vec_pretty(file)
            .map_err(|source| StoreError::Decode { path: self.path.clone(), source })?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, encoded)
            .await
            .map_err(|source| StoreError::Io { path: staging.clone(), source })?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<PersistedSession, StoreError> {
        Ok(self.read_file().await?.into_session())
    }

    async fn save_credentials(&self, credentials: &Credentials) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read_file().await?;
        file.access_token = Some(credentials.access_token.expose_secret().to_string());
        file.refresh_token = Some(credentials.refresh_token.expose_secret().to_string());
        self.write_file(&file).await
    }

    async fn save_user(&self, user: &SessionUser) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read_file().await?;
        file.user = Some(user.clone());
        self.write_file(&file).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path: self.path.clone(), source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use esm_core::{Credentials, Role, SessionUser, UserId};
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{FileSessionStore, InMemorySessionStore, SessionStore};
    use crate::error::StoreError;

    fn employee() -> SessionUser {
        SessionUser { id: UserId(42), username: "jdoe".to_string(), role: Role::Employee }
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_session() {
        let dir = TempDir::new().expect("tempdir");
        let store = FileSessionStore::new(dir.path().join("nested/session.json"));

        let session = store.load().await.expect("load");
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn file_store_persists_pair_and_user_under_wire_keys() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("state/session.json");
        let store = FileSessionStore::new(&path);

        store.save_credentials(&Credentials::new("a1", "r1")).await.expect("save credentials");
        store.save_user(&employee()).await.expect("save user");

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(raw["accessToken"], "a1");
        assert_eq!(raw["refreshToken"], "r1");
        assert_eq!(raw["user"]["role"], "EMPLOYEE");
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = FileSessionStore::new(&path).load().await.expect("load");
        let credentials = reopened.credentials().expect("pair");
        assert_eq!(credentials.access_token.expose_secret(), "a1");
        assert_eq!(reopened.user, Some(employee()));
    }

    #[tokio::test]
    async fn clear_removes_everything_and_is_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("session.json");
        let store = FileSessionStore::new(&path);
        store.save_credentials(&Credentials::new("a1", "r1")).await.expect("save");

        store.clear().await.expect("clear");
        store.clear().await.expect("second clear");

        assert!(!path.exists());
        assert!(store.load().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_decode_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").expect("write");

        let error = FileSessionStore::new(&path).load().await.expect_err("corrupt");
        assert!(matches!(error, StoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn in_memory_store_rotates_and_clears() {
        let store = InMemorySessionStore::with_session(
            Some(Credentials::new("a1", "r1")),
            Some(employee()),
        );

        store.save_credentials(&Credentials::new("a2", "r2")).await.expect("rotate");
        let session = store.load().await.expect("load");
        let refresh = session.refresh_token.expect("refresh token");
        assert_eq!(refresh.expose_secret(), "r2");

        store.clear().await.expect("clear");
        assert!(store.load().await.expect("load").is_empty());
    }
}
