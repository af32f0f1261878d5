//! Typed handles over the REST endpoints, borrowed from a [`SessionClient`].

pub mod approvals;
pub mod auth;
pub mod submissions;
pub mod templates;
pub mod users;

use crate::http::SessionClient;

pub use approvals::ApprovalsApi;
pub use auth::AuthApi;
pub use submissions::SubmissionsApi;
pub use templates::TemplatesApi;
pub use users::UsersApi;

pub const EMPLOYEE_HEADER: &str = "X-Employee-Id";
pub const MANAGER_HEADER: &str = "X-Manager-Id";

impl SessionClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn templates(&self) -> TemplatesApi<'_> {
        TemplatesApi::new(self)
    }

    pub fn submissions(&self) -> SubmissionsApi<'_> {
        SubmissionsApi::new(self)
    }

    pub fn approvals(&self) -> ApprovalsApi<'_> {
        ApprovalsApi::new(self)
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }
}
