use esm_core::{AccountStatus, Capability, Role, RoleStatusUpdate, UserId};

use super::{with_context, CommandResult, GlobalArgs};
use crate::UsersCommand;

pub fn run(global: &GlobalArgs, command: UsersCommand) -> CommandResult {
    match command {
        UsersCommand::List { paging } => {
            const COMMAND: &str = "users list";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::ManageUsers).await?;
                let page = context.client.users().list(&paging.query()).await?;
                let message = format!("{} user(s)", page.total_elements);
                Ok(CommandResult::success_with_data(COMMAND, message, page))
            })
        }
        UsersCommand::Show { id } => {
            const COMMAND: &str = "users show";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::ManageUsers).await?;
                let user = context.client.users().get(UserId(id)).await?;
                let message = format!("user {id}: {} ({})", user.username, user.role);
                Ok(CommandResult::success_with_data(COMMAND, message, user))
            })
        }
        UsersCommand::Managers => {
            const COMMAND: &str = "users managers";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::ManageTemplates).await?;
                let managers = context.client.users().managers().await?;
                let message = format!("{} manager(s) available as approvers", managers.len());
                Ok(CommandResult::success_with_data(COMMAND, message, managers))
            })
        }
        UsersCommand::Profile => {
            const COMMAND: &str = "users profile";
            with_context(COMMAND, global, |context| async move {
                context.signed_in_user().await?;
                let profile = context.client.users().profile().await?;
                let message = format!("profile of {}", profile.username);
                Ok(CommandResult::success_with_data(COMMAND, message, profile))
            })
        }
        UsersCommand::SetRole { id, role, status } => {
            const COMMAND: &str = "users set-role";
            with_context(COMMAND, global, |context| async move {
                context.require(Capability::ManageUsers).await?;
                let update = RoleStatusUpdate {
                    role: role.parse::<Role>()?,
                    status: status.parse::<AccountStatus>()?,
                };
                let user = context.client.users().set_role_status(UserId(id), &update).await?;
                let message = format!("user {id} is now {} / {}", user.role, user.status.as_str());
                Ok(CommandResult::success_with_data(COMMAND, message, user))
            })
        }
    }
}
