use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::submission::{SubmissionId, SubmissionStatus};
use crate::domain::user::UserId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalAction {
    Approve,
    Reject,
}

impl ApprovalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
        }
    }

    /// Status a step (or an archived view) shows once this decision is recorded.
    pub fn outcome(&self) -> SubmissionStatus {
        match self {
            Self::Approve => SubmissionStatus::Approved,
            Self::Reject => SubmissionStatus::Rejected,
        }
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalAction {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "APPROVE" | "APPROVED" => Ok(Self::Approve),
            "REJECT" | "REJECTED" => Ok(Self::Reject),
            other => Err(DomainError::UnknownAction(other.to_string())),
        }
    }
}

/// Body of `POST /approvals/submissions/:id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub action: ApprovalAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingApproval {
    pub id: i64,
    pub submission_id: SubmissionId,
    #[serde(default)]
    pub template_title: String,
    pub employee_id: UserId,
    #[serde(default)]
    pub employee_name: String,
    #[serde(default, with = "crate::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub current_step: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalHistoryItem {
    pub id: i64,
    pub submission_id: SubmissionId,
    #[serde(default)]
    pub template_title: String,
    #[serde(default)]
    pub employee_name: String,
    pub action: ApprovalAction,
    #[serde(default)]
    pub comment: Option<String>,
    pub at_step: u32,
    #[serde(default, with = "crate::timestamp::option")]
    pub acted_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::{ApprovalAction, ApprovalDecision};
    use crate::domain::submission::SubmissionStatus;

    #[test]
    fn action_maps_to_step_outcome() {
        assert_eq!(ApprovalAction::Approve.outcome(), SubmissionStatus::Approved);
        assert_eq!(ApprovalAction::Reject.outcome(), SubmissionStatus::Rejected);
    }

    #[test]
    fn decision_without_comment_omits_the_key() {
        let body = serde_json::to_value(ApprovalDecision {
            action: ApprovalAction::Approve,
            comment: None,
        })
        .expect("decision json");

        assert_eq!(body, serde_json::json!({ "action": "APPROVE" }));
    }

    #[test]
    fn action_parses_cli_spellings() {
        assert_eq!("reject".parse::<ApprovalAction>().expect("action"), ApprovalAction::Reject);
        assert!("escalate".parse::<ApprovalAction>().is_err());
    }
}
