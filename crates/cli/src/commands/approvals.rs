use esm_core::{ApprovalAction, ApprovalDecision, Capability, SubmissionId};

use super::submissions::render_submission;
use super::{with_context, CommandResult, GlobalArgs};
use crate::ApprovalsCommand;

pub fn run(global: &GlobalArgs, command: ApprovalsCommand) -> CommandResult {
    match command {
        ApprovalsCommand::Pending { paging } => {
            const COMMAND: &str = "approvals pending";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::ReviewApprovals).await?;
                let page = context.client.approvals().pending(&paging.query()).await?;
                let message = format!("{} submission(s) awaiting your decision", page.total_elements);
                Ok(CommandResult::success_with_data(COMMAND, message, page))
            })
        }
        ApprovalsCommand::History { paging } => {
            const COMMAND: &str = "approvals history";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::ViewApprovalHistory).await?;
                let page = context.client.approvals().history(&paging.query()).await?;
                let message = format!("{} past decision(s)", page.total_elements);
                Ok(CommandResult::success_with_data(COMMAND, message, page))
            })
        }
        ApprovalsCommand::Show { id, log_id } => {
            const COMMAND: &str = "approvals show";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::ReviewApprovals).await?;
                let submission = context.client.approvals().detail(SubmissionId(id)).await?;
                render_submission(COMMAND, &submission, log_id)
            })
        }
        ApprovalsCommand::Decide { id, action, comment } => {
            const COMMAND: &str = "approvals decide";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::ReviewApprovals).await?;
                let action: ApprovalAction = action.parse()?;
                let decision = ApprovalDecision { action, comment };
                let response = context.client.approvals().decide(SubmissionId(id), &decision).await?;
                let message = format!("submission {id}: {} recorded", action.as_str());
                Ok(CommandResult::success_with_data(COMMAND, message, response))
            })
        }
    }
}
