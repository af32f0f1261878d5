pub mod api;
pub mod error;
pub mod http;
pub mod session;
pub mod store;

pub use error::{ApiError, StoreError};
pub use http::{ApiRequest, ApiResponse, SessionClient};
pub use session::{LoginRedirect, SessionContext, SessionObserver};
pub use store::{FileSessionStore, InMemorySessionStore, PersistedSession, SessionStore};
