use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::approval::ApprovalAction;
use crate::domain::template::{ComponentType, FieldId, TemplateId};
use crate::domain::user::UserId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntryId(pub i64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for HistoryEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Draft,
    #[serde(alias = "SUBMITTED")]
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Draft)
                | (Self::Draft, Self::Pending)
                | (Self::Pending, Self::Pending)
                | (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Rejected, Self::Pending)
                | (Self::Rejected, Self::Draft)
        )
    }

    /// Employee actions offered for a submission in this status.
    pub fn employee_actions(&self) -> &'static [EmployeeAction] {
        match self {
            Self::Draft => &[EmployeeAction::EditDraft, EmployeeAction::Submit, EmployeeAction::Delete],
            Self::Rejected => &[EmployeeAction::Resubmit],
            Self::Pending | Self::Approved => &[],
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeAction {
    EditDraft,
    Submit,
    Delete,
    Resubmit,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionValue {
    pub field_id: FieldId,
    #[serde(default)]
    pub label: String,
    #[serde(default = "unknown_component")]
    pub component_type: ComponentType,
    #[serde(default)]
    pub value: Value,
}

fn unknown_component() -> ComponentType {
    ComponentType::Unknown
}

/// Static step definition copied from the template when the submission was made.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub step_order: u32,
    pub manager_id: UserId,
    #[serde(default)]
    pub manager_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLogEntry {
    pub id: HistoryEntryId,
    pub at_step: u32,
    pub action: ApprovalAction,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, with = "crate::timestamp::option")]
    pub acted_at: Option<DateTime<Utc>>,
    /// Field values as they stood when the decision was recorded.
    #[serde(default)]
    pub historical_values: Option<Vec<SubmissionValue>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub template_id: TemplateId,
    #[serde(default)]
    pub template_title: Option<String>,
    pub employee_id: UserId,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub submission_values: Vec<SubmissionValue>,
    #[serde(default)]
    pub workflow_steps: Vec<WorkflowStep>,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub current_step: u32,
    #[serde(default, with = "crate::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "fullHistory", alias = "historyLog")]
    pub history_log: Vec<HistoryLogEntry>,
}

impl Submission {
    pub fn values(&self) -> BTreeMap<FieldId, Value> {
        self.submission_values.iter().map(|value| (value.field_id, value.value.clone())).collect()
    }

    pub fn can_resubmit(&self) -> bool {
        self.status == SubmissionStatus::Rejected
    }

    pub fn can_edit_draft(&self) -> bool {
        self.status == SubmissionStatus::Draft
    }

    pub fn ensure_offered(&self, action: EmployeeAction) -> Result<(), DomainError> {
        if self.status.employee_actions().contains(&action) {
            return Ok(());
        }
        Err(DomainError::ActionNotOffered { action, status: self.status })
    }

    pub fn ensure_resubmittable(&self) -> Result<(), DomainError> {
        self.ensure_offered(EmployeeAction::Resubmit)
    }

    pub fn ensure_draft_editable(&self) -> Result<(), DomainError> {
        self.ensure_offered(EmployeeAction::EditDraft)
    }

    pub fn history_entry(&self, id: HistoryEntryId) -> Option<&HistoryLogEntry> {
        self.history_log.iter().find(|entry| entry.id == id)
    }
}

/// Row returned by `/submissions/me/drafts` and `/submissions/me/submitted`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub id: SubmissionId,
    #[serde(default)]
    pub template_id: Option<TemplateId>,
    #[serde(default)]
    pub template_title: Option<String>,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub current_step: u32,
    #[serde(default, with = "crate::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of the draft and submit endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SubmissionId>,
    pub template_id: TemplateId,
    pub values: BTreeMap<FieldId, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAck {
    pub id: SubmissionId,
    #[serde(default)]
    pub status: Option<SubmissionStatus>,
    #[serde(default)]
    pub message: Option<String>,
}
