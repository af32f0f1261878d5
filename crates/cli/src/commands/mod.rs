pub mod approvals;
pub mod auth;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod doctor;
pub mod submissions;
pub mod templates;
pub mod users;
pub mod values;

use std::future::Future;
use std::path::PathBuf;

use esm_client::{ApiError, StoreError};
use esm_core::config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
use esm_core::{DomainError, ErrorClass};
use serde::Serialize;
use serde_json::Value;

use context::CommandContext;

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
}

pub fn load_config(global: &GlobalArgs) -> Result<AppConfig, ConfigError> {
    AppConfig::load(LoadOptions {
        config_path: global.config_path.clone(),
        require_file: global.config_path.is_some(),
        overrides: ConfigOverrides {
            api_base_url: global.base_url.clone(),
            ..ConfigOverrides::default()
        },
    })
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Why a command stopped early.
#[derive(Debug)]
pub enum Failure {
    Config(ConfigError),
    Api(ApiError),
    Input(anyhow::Error),
}

impl From<ConfigError> for Failure {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<ApiError> for Failure {
    fn from(error: ApiError) -> Self {
        Self::Api(error)
    }
}

impl From<StoreError> for Failure {
    fn from(error: StoreError) -> Self {
        Self::Api(ApiError::Storage(error))
    }
}

impl From<DomainError> for Failure {
    fn from(error: DomainError) -> Self {
        Self::Api(ApiError::Domain(error))
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        Self::Input(error)
    }
}

pub fn exit_code_for(class: ErrorClass) -> u8 {
    match class {
        ErrorClass::Configuration => 2,
        ErrorClass::Validation => 3,
        ErrorClass::Unauthorized | ErrorClass::SessionExpired | ErrorClass::Forbidden => 4,
        _ => 5,
    }
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::emit(command, "ok", None, message.into(), None, 0)
    }

    pub fn success_with_data(command: &str, message: impl Into<String>, data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self::emit(command, "ok", None, message.into(), Some(data), 0),
            Err(error) => Self::failure(
                command,
                ErrorClass::Decode.as_str(),
                format!("could not render command output: {error}"),
                5,
            ),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::emit(command, "error", Some(error_class.to_string()), message.into(), None, exit_code)
    }

    pub fn from_class(command: &str, class: ErrorClass, message: impl Into<String>) -> Self {
        Self::failure(command, class.as_str(), message, exit_code_for(class))
    }

    pub fn from_failure(command: &str, failure: Failure) -> Self {
        match failure {
            Failure::Config(error) => {
                Self::from_class(command, ErrorClass::Configuration, error.to_string())
            }
            Failure::Api(error) if error.is_auth_error() => Self::from_class(
                command,
                error.class(),
                format!("{error}; run `esm login` to sign in"),
            ),
            Failure::Api(error) => Self::from_class(command, error.class(), error.to_string()),
            Failure::Input(error) => {
                Self::from_class(command, ErrorClass::Validation, format!("{error:#}"))
            }
        }
    }

    fn emit(
        command: &str,
        status: &str,
        error_class: Option<String>,
        message: String,
        data: Option<Value>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: status.to_string(),
            error_class,
            message,
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Drives `future` on a fresh single-threaded runtime.
pub(crate) fn execute<F>(command: &str, future: F) -> CommandResult
where
    F: Future<Output = CommandResult>,
{
    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(future),
        Err(error) => CommandResult::failure(
            command,
            "runtime",
            format!("failed to initialize async runtime: {error}"),
            5,
        ),
    }
}

/// Opens the session context, then runs `body` against it.
pub(crate) fn with_context<F, Fut>(command: &str, global: &GlobalArgs, body: F) -> CommandResult
where
    F: FnOnce(CommandContext) -> Fut,
    Fut: Future<Output = Result<CommandResult, Failure>>,
{
    execute(command, async {
        let context = match CommandContext::open(command, global).await {
            Ok(context) => context,
            Err(failure) => return CommandResult::from_failure(command, failure),
        };
        body(context).await.unwrap_or_else(|failure| CommandResult::from_failure(command, failure))
    })
}
