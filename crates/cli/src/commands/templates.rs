use esm_core::{Capability, TemplateId};

use super::values::read_template_draft;
use super::{with_context, CommandResult, GlobalArgs};
use crate::TemplatesCommand;

pub fn run(global: &GlobalArgs, command: TemplatesCommand) -> CommandResult {
    match command {
        TemplatesCommand::List { admin, paging } => {
            const COMMAND: &str = "templates list";
            with_context(COMMAND, global, |context| async move {
                let templates = context.client.templates();
                let page = if admin {
                    context.require(Capability::ManageTemplates).await?;
                    templates.list_admin(&paging.query()).await?
                } else {
                    context.require_any(&[Capability::FillForms, Capability::ManageTemplates]).await?;
                    templates.list_available(&paging.query()).await?
                };
                let message = format!("{} template(s)", page.total_elements);
                Ok(CommandResult::success_with_data(COMMAND, message, page))
            })
        }
        TemplatesCommand::Show { id } => {
            const COMMAND: &str = "templates show";
            with_context(COMMAND, global, |context| async move {
                context.require_any(&[Capability::FillForms, Capability::ManageTemplates]).await?;
                let template = context.client.templates().get(TemplateId(id)).await?;
                let message = format!("template {id}: {}", template.title);
                Ok(CommandResult::success_with_data(COMMAND, message, template))
            })
        }
        TemplatesCommand::Create { file } => {
            const COMMAND: &str = "templates create";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::ManageTemplates).await?;
                let draft = read_template_draft(&file)?;
                let created = context.client.templates().create(&draft).await?;
                let message = format!("template `{}` created", created.title);
                Ok(CommandResult::success_with_data(COMMAND, message, created))
            })
        }
        TemplatesCommand::Update { id, file } => {
            const COMMAND: &str = "templates update";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::ManageTemplates).await?;
                let draft = read_template_draft(&file)?;
                let updated = context.client.templates().update(TemplateId(id), &draft).await?;
                let message = format!("template {id} updated");
                Ok(CommandResult::success_with_data(COMMAND, message, updated))
            })
        }
        TemplatesCommand::Delete { id } => {
            const COMMAND: &str = "templates delete";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::ManageTemplates).await?;
                context.client.templates().delete(TemplateId(id)).await?;
                Ok(CommandResult::success(COMMAND, format!("template {id} deleted")))
            })
        }
    }
}
