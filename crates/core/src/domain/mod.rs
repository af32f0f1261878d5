pub mod approval;
pub mod page;
pub mod session;
pub mod submission;
pub mod template;
pub mod user;
