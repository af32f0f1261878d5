use esm_core::{
    Capability, HistoryEntryId, Submission, SubmissionId, SubmissionValue, TemplateId,
    WorkflowProjection,
};
use serde::Serialize;
use tracing::warn;

use super::values::parse_assignments;
use super::{with_context, CommandResult, Failure, GlobalArgs};
use crate::SubmissionsCommand;

/// A submission together with its projected workflow.
#[derive(Debug, Serialize)]
pub(crate) struct SubmissionView<'a> {
    id: SubmissionId,
    template_id: TemplateId,
    template_title: Option<&'a str>,
    employee_name: Option<&'a str>,
    status: esm_core::SubmissionStatus,
    offered_actions: &'static [esm_core::EmployeeAction],
    values: &'a [SubmissionValue],
    workflow: &'a WorkflowProjection,
}

pub(crate) fn render_submission(
    command: &str,
    submission: &Submission,
    log_id: Option<i64>,
) -> Result<CommandResult, Failure> {
    let projection = submission.project(log_id.map(HistoryEntryId)).map_err(esm_core::DomainError::from)?;
    if !projection.orphaned_entries.is_empty() {
        warn!(
            event_name = "workflow.orphaned_history",
            submission_id = submission.id.0,
            orphaned = ?projection.orphaned_entries,
            "history entries reference steps missing from the workflow"
        );
    }

    let view = SubmissionView {
        id: submission.id,
        template_id: submission.template_id,
        template_title: submission.template_title.as_deref(),
        employee_name: submission.employee_name.as_deref(),
        status: submission.status,
        offered_actions: submission.status.employee_actions(),
        values: submission.displayed_values(&projection),
        workflow: &projection,
    };
    let entry = log_id.and_then(|log_id| submission.history_entry(HistoryEntryId(log_id)));
    let message = match entry {
        Some(entry) => format!(
            "submission {} as of history entry {} ({} at step {}): {}",
            submission.id,
            entry.id.0,
            entry.action.as_str(),
            entry.at_step,
            projection.display_status
        ),
        None => format!("submission {}: {}", submission.id, projection.display_status),
    };
    Ok(CommandResult::success_with_data(command, message, view))
}

pub fn run(global: &GlobalArgs, command: SubmissionsCommand) -> CommandResult {
    match command {
        SubmissionsCommand::Drafts { paging } => {
            const COMMAND: &str = "submissions drafts";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::TrackOwnSubmissions).await?;
                let page = context.client.submissions().drafts(&paging.query()).await?;
                let message = format!("{} draft(s)", page.total_elements);
                Ok(CommandResult::success_with_data(COMMAND, message, page))
            })
        }
        SubmissionsCommand::Submitted { paging } => {
            const COMMAND: &str = "submissions submitted";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::TrackOwnSubmissions).await?;
                let page = context.client.submissions().submitted(&paging.query()).await?;
                let message = format!("{} submitted form(s)", page.total_elements);
                Ok(CommandResult::success_with_data(COMMAND, message, page))
            })
        }
        SubmissionsCommand::Show { id, log_id } => {
            const COMMAND: &str = "submissions show";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::TrackOwnSubmissions).await?;
                let submission = context.client.submissions().get(SubmissionId(id)).await?;
                render_submission(COMMAND, &submission, log_id)
            })
        }
        SubmissionsCommand::SaveDraft { template, id, values } => {
            const COMMAND: &str = "submissions save-draft";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::FillForms).await?;
                let submissions = context.client.submissions();
                let template_id = TemplateId(template);
                let template = context.client.templates().get(template_id).await?;
                let values = parse_assignments(&values, &template)?;

                let draft = match id {
                    Some(id) => {
                        let existing = submissions.get(SubmissionId(id)).await?;
                        submissions.update_draft(&existing, values).await?
                    }
                    None => submissions.save_draft(template_id, values).await?,
                };
                let message = format!("draft {} saved", draft.id);
                Ok(CommandResult::success_with_data(COMMAND, message, draft))
            })
        }
        SubmissionsCommand::Submit { template, draft, values } => {
            const COMMAND: &str = "submissions submit";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::FillForms).await?;
                let submissions = context.client.submissions();
                let template = context.client.templates().get(TemplateId(template)).await?;
                let values = parse_assignments(&values, &template)?;

                let ack = match draft {
                    Some(draft_id) => {
                        let existing = submissions.get(SubmissionId(draft_id)).await?;
                        submissions.submit_draft(&existing, &template, values).await?
                    }
                    None => submissions.submit(&template, values).await?,
                };
                let message = format!("submission {} sent for approval", ack.id);
                Ok(CommandResult::success_with_data(COMMAND, message, ack))
            })
        }
        SubmissionsCommand::Resubmit { id, values } => {
            const COMMAND: &str = "submissions resubmit";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::FillForms).await?;
                let submissions = context.client.submissions();
                let rejected = submissions.get(SubmissionId(id)).await?;
                rejected.ensure_resubmittable()?;

                let template = context.client.templates().get(rejected.template_id).await?;
                let mut merged = rejected.values();
                merged.extend(parse_assignments(&values, &template)?);

                let ack = submissions.resubmit(&rejected, &template, merged).await?;
                let message = format!("submission {} resubmitted", ack.id);
                Ok(CommandResult::success_with_data(COMMAND, message, ack))
            })
        }
        SubmissionsCommand::Delete { id } => {
            const COMMAND: &str = "submissions delete";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::FillForms).await?;
                let submissions = context.client.submissions();
                let draft = submissions.get(SubmissionId(id)).await?;
                submissions.delete(&draft).await?;
                Ok(CommandResult::success(COMMAND, format!("draft {id} deleted")))
            })
        }
    }
}
