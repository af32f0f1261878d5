//! Display projection of a submission's approval workflow.
//!
//! Step decisions are never stored on the steps themselves. They are derived
//! by matching each step against the append-only history log, either for the
//! live state or "as of" a chosen history entry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::submission::{
    HistoryEntryId, HistoryLogEntry, Submission, SubmissionStatus, SubmissionValue, WorkflowStep,
};
use crate::domain::user::UserId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("history entry {0} does not belong to this submission")]
    UnknownHistoryEntry(HistoryEntryId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedStep {
    pub step_order: u32,
    pub manager_id: UserId,
    pub manager_name: Option<String>,
    pub status: StepStatus,
    pub comment: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub decided_by_entry: Option<HistoryEntryId>,
    pub historical_values: Option<Vec<SubmissionValue>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionView {
    Live,
    Archived { entry_id: HistoryEntryId, acted_at: Option<DateTime<Utc>> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowProjection {
    pub view: ProjectionView,
    pub steps: Vec<ProjectedStep>,
    /// Zero-based index for a progress indicator; equals `steps.len()` once finished.
    pub current_step_index: usize,
    pub display_status: SubmissionStatus,
    /// Values the approver saw when the archived decision was recorded.
    pub snapshot_values: Option<Vec<SubmissionValue>>,
    /// History entries whose step is missing from the workflow definition.
    pub orphaned_entries: Vec<HistoryEntryId>,
}

impl WorkflowProjection {
    pub fn is_terminal(&self) -> bool {
        self.display_status.is_terminal()
    }

    pub fn step(&self, step_order: u32) -> Option<&ProjectedStep> {
        self.steps.iter().find(|step| step.step_order == step_order)
    }
}

pub struct WorkflowProjector<'a> {
    steps: Vec<&'a WorkflowStep>,
    history: &'a [HistoryLogEntry],
}

impl<'a> WorkflowProjector<'a> {
    pub fn new(steps: &'a [WorkflowStep], history: &'a [HistoryLogEntry]) -> Self {
        let mut steps: Vec<&WorkflowStep> = steps.iter().collect();
        steps.sort_by_key(|step| step.step_order);
        Self { steps, history }
    }

    pub fn for_submission(submission: &'a Submission) -> Self {
        Self::new(&submission.workflow_steps, &submission.history_log)
    }

    pub fn live(&self, status: SubmissionStatus, current_step: u32) -> WorkflowProjection {
        let steps = self
            .steps
            .iter()
            .map(|step| match self.latest_at_step(step.step_order, None) {
                Some(entry) => decided(step, entry),
                None => pending(step),
            })
            .collect::<Vec<_>>();

        let current_step_index = if status.is_terminal() {
            steps.len()
        } else {
            current_step.saturating_sub(1) as usize
        };

        WorkflowProjection {
            view: ProjectionView::Live,
            steps,
            current_step_index,
            display_status: status,
            snapshot_values: None,
            orphaned_entries: self.orphaned_entries(),
        }
    }

    pub fn as_of(&self, entry_id: HistoryEntryId) -> Result<WorkflowProjection, ProjectionError> {
        let active = self
            .history
            .iter()
            .find(|entry| entry.id == entry_id)
            .ok_or(ProjectionError::UnknownHistoryEntry(entry_id))?;

        let steps = self
            .steps
            .iter()
            .map(|step| {
                if step.step_order == active.at_step {
                    return decided(step, active);
                }
                if step.step_order < active.at_step {
                    if let Some(entry) = self.latest_at_step(step.step_order, Some(active.id)) {
                        return decided(step, entry);
                    }
                }
                pending(step)
            })
            .collect();

        Ok(WorkflowProjection {
            view: ProjectionView::Archived { entry_id: active.id, acted_at: active.acted_at },
            steps,
            current_step_index: active.at_step.saturating_sub(1) as usize,
            display_status: active.action.outcome(),
            snapshot_values: active.historical_values.clone(),
            orphaned_entries: self.orphaned_entries(),
        })
    }

    /// Greatest-id entry recorded at `step_order`, optionally only entries older than `before`.
    fn latest_at_step(
        &self,
        step_order: u32,
        before: Option<HistoryEntryId>,
    ) -> Option<&'a HistoryLogEntry> {
        self.history
            .iter()
            .filter(|entry| entry.at_step == step_order)
            .filter(|entry| before.map(|limit| entry.id < limit).unwrap_or(true))
            .max_by_key(|entry| entry.id)
    }

    fn orphaned_entries(&self) -> Vec<HistoryEntryId> {
        self.history
            .iter()
            .filter(|entry| !self.steps.iter().any(|step| step.step_order == entry.at_step))
            .map(|entry| entry.id)
            .collect()
    }
}

impl Submission {
    /// Live projection, or the archived view when `as_of` names a history entry.
    pub fn project(
        &self,
        as_of: Option<HistoryEntryId>,
    ) -> Result<WorkflowProjection, ProjectionError> {
        let projector = WorkflowProjector::for_submission(self);
        match as_of {
            Some(entry_id) => projector.as_of(entry_id),
            None => Ok(projector.live(self.status, self.current_step)),
        }
    }

    /// Values to display for a projection: the archived snapshot when one was captured.
    pub fn displayed_values<'a>(
        &'a self,
        projection: &'a WorkflowProjection,
    ) -> &'a [SubmissionValue] {
        projection.snapshot_values.as_deref().unwrap_or(&self.submission_values)
    }
}

fn decided(step: &WorkflowStep, entry: &HistoryLogEntry) -> ProjectedStep {
    let status = match entry.action.outcome() {
        SubmissionStatus::Approved => StepStatus::Approved,
        _ => StepStatus::Rejected,
    };
    ProjectedStep {
        step_order: step.step_order,
        manager_id: step.manager_id,
        manager_name: step.manager_name.clone(),
        status,
        comment: entry.comment.clone(),
        updated_at: entry.acted_at,
        decided_by_entry: Some(entry.id),
        historical_values: entry.historical_values.clone(),
    }
}

fn pending(step: &WorkflowStep) -> ProjectedStep {
    ProjectedStep {
        step_order: step.step_order,
        manager_id: step.manager_id,
        manager_name: step.manager_name.clone(),
        status: StepStatus::Pending,
        comment: None,
        updated_at: None,
        decided_by_entry: None,
        historical_values: None,
    }
}
