use std::env;

use esm_core::{view_for, SessionUser};
use secrecy::SecretString;
use serde::Serialize;

use super::{with_context, CommandResult, GlobalArgs};

pub const PASSWORD_ENV: &str = "ESM_PASSWORD";

#[derive(Debug, Serialize)]
struct Identity {
    user: SessionUser,
    capabilities: Vec<&'static str>,
    sections: Vec<&'static str>,
}

impl Identity {
    fn of(user: SessionUser) -> Self {
        let view = view_for(user.role);
        Self {
            capabilities: view.capabilities().iter().map(|capability| capability.as_str()).collect(),
            sections: view.sections().iter().map(|section| section.as_str()).collect(),
            user,
        }
    }
}

pub fn login(global: &GlobalArgs, username: &str, password: Option<String>) -> CommandResult {
    const COMMAND: &str = "login";

    let password = password
        .or_else(|| env::var(PASSWORD_ENV).ok())
        .filter(|password| !password.is_empty());
    let Some(password) = password else {
        return CommandResult::failure(
            COMMAND,
            "validation",
            format!("a password is required (pass --password or set {PASSWORD_ENV})"),
            3,
        );
    };
    let password = SecretString::from(password);

    with_context(COMMAND, global, |context| async move {
        let user = context.client.auth().login(username, &password).await?;
        let message = format!("signed in as {} ({})", user.username, user.role);
        Ok(CommandResult::success_with_data(COMMAND, message, Identity::of(user)))
    })
}

pub fn logout(global: &GlobalArgs) -> CommandResult {
    const COMMAND: &str = "logout";

    with_context(COMMAND, global, |context| async move {
        context.client.auth().logout().await?;
        Ok(CommandResult::success(COMMAND, "signed out"))
    })
}

pub fn whoami(global: &GlobalArgs) -> CommandResult {
    const COMMAND: &str = "whoami";

    with_context(COMMAND, global, |context| async move {
        let user = context.signed_in_user().await?;
        let message = format!("signed in as {} ({})", user.username, user.role);
        Ok(CommandResult::success_with_data(COMMAND, message, Identity::of(user)))
    })
}
