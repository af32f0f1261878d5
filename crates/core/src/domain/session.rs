use secrecy::{ExposeSecret, SecretString};

/// Bearer credential pair issued by `/auth/login` and rotated by `/auth/refresh`.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            refresh_token: SecretString::from(refresh_token.into()),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.access_token.expose_secret().trim().is_empty()
            && !self.refresh_token.expose_secret().trim().is_empty()
    }
}
