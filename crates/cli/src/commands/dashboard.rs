use esm_core::{view_for, DashboardSection, PageQuery};
use serde_json::{json, Map, Value};

use super::context::CommandContext;
use super::{with_context, CommandResult, Failure, GlobalArgs};

const COMMAND: &str = "dashboard";

/// First page of every section the signed-in role's dashboard shows.
pub fn run(global: &GlobalArgs) -> CommandResult {
    with_context(COMMAND, global, |context| async move {
        let user = context.signed_in_user().await?;
        let view = view_for(user.role);
        let query = PageQuery::default();

        let mut sections = Map::new();
        for section in view.sections() {
            let summary = section_summary(&context, *section, &query).await?;
            sections.insert(section.as_str().to_string(), summary);
        }

        let data = json!({ "role": user.role, "sections": sections });
        let message = format!("{} dashboard for {}", user.role, user.username);
        Ok(CommandResult::success_with_data(COMMAND, message, data))
    })
}

async fn section_summary(
    context: &CommandContext,
    section: DashboardSection,
    query: &PageQuery,
) -> Result<Value, Failure> {
    let client = &context.client;
    let summary = match section {
        DashboardSection::Templates => page_summary(client.templates().list_admin(query).await?),
        DashboardSection::Users => page_summary(client.users().list(query).await?),
        DashboardSection::PendingApprovals => {
            page_summary(client.approvals().pending(query).await?)
        }
        DashboardSection::ApprovalHistory => page_summary(client.approvals().history(query).await?),
        DashboardSection::AvailableTemplates => {
            page_summary(client.templates().list_available(query).await?)
        }
        DashboardSection::Drafts => page_summary(client.submissions().drafts(query).await?),
        DashboardSection::Submitted => page_summary(client.submissions().submitted(query).await?),
    };
    Ok(summary)
}

fn page_summary<T: serde::Serialize>(page: esm_core::Page<T>) -> Value {
    json!({ "total": page.total_elements, "items": page.content })
}
