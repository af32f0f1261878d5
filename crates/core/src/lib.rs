pub mod config;
pub mod domain;
pub mod errors;
pub mod roles;
pub mod timestamp;
pub mod validation;
pub mod workflow;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::approval::{ApprovalAction, ApprovalDecision, ApprovalHistoryItem, PendingApproval};
pub use domain::page::{Page, PageQuery};
pub use domain::session::Credentials;
pub use domain::submission::{
    EmployeeAction, HistoryEntryId, HistoryLogEntry, Submission, SubmissionAck, SubmissionId,
    SubmissionPayload, SubmissionStatus, SubmissionSummary, SubmissionValue, WorkflowStep,
};
pub use domain::template::{
    ComponentType, FieldDraft, FieldId, FormField, FormTemplate, TemplateDraft, TemplateId,
    TemplateStep,
};
pub use domain::user::{AccountStatus, Role, RoleStatusUpdate, SessionUser, User, UserId};
pub use errors::{DomainError, ErrorClass};
pub use roles::{view_for, Capability, DashboardSection, RoleView};
pub use validation::{ValidationError, Violation};
pub use workflow::{
    ProjectedStep, ProjectionError, ProjectionView, StepStatus, WorkflowProjection,
    WorkflowProjector,
};
