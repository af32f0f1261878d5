use esm_client::{ApiError, ApiRequest, FileSessionStore, SessionStore};
use esm_core::config::AppConfig;
use esm_core::ErrorClass;
use serde::Serialize;

use super::context::CommandContext;
use super::{exit_code_for, load_config, CommandResult, GlobalArgs};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(global: &GlobalArgs, json_output: bool) -> CommandResult {
    let (report, config_loaded) = build_report(global);
    let exit_code = match report.overall_status {
        CheckStatus::Pass => 0,
        _ if !config_loaded => exit_code_for(ErrorClass::Configuration),
        _ => 5,
    };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(global: &GlobalArgs) -> (DoctorReport, bool) {
    let mut checks = Vec::new();

    let config = match load_config(global) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("session_store"));
            checks.push(skipped("api_reachability"));
            return (summarize(checks), false);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let details = format!("failed to initialize async runtime: {error}");
            checks.push(DoctorCheck {
                name: "session_store",
                status: CheckStatus::Fail,
                details: details.clone(),
            });
            checks.push(DoctorCheck { name: "api_reachability", status: CheckStatus::Fail, details });
            return (summarize(checks), true);
        }
    };

    runtime.block_on(async {
        checks.push(check_session_store(&config).await);
        checks.push(check_api_reachability(global).await);
    });

    (summarize(checks), true)
}

async fn check_session_store(config: &AppConfig) -> DoctorCheck {
    let store = FileSessionStore::new(config.session.store_path.clone());
    let location = store.path().display().to_string();

    match store.load().await {
        Ok(session) => {
            let has_pair = session.credentials().is_some();
            let details = match &session.user {
                Some(user) if has_pair => {
                    format!("`{location}` holds a session for {} ({})", user.username, user.role)
                }
                _ if session.access_token.is_some() && session.refresh_token.is_none() => {
                    format!("`{location}` holds an access token without a refresh token")
                }
                _ => format!("`{location}` is readable; no one is signed in"),
            };
            DoctorCheck { name: "session_store", status: CheckStatus::Pass, details }
        }
        Err(error) => DoctorCheck {
            name: "session_store",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

/// Any HTTP answer, including 401 or 404, proves the backend is reachable.
async fn check_api_reachability(global: &GlobalArgs) -> DoctorCheck {
    let context = match CommandContext::open("doctor", global).await {
        Ok(context) => context,
        Err(_) => {
            return DoctorCheck {
                name: "api_reachability",
                status: CheckStatus::Fail,
                details: "could not prepare an API client".to_string(),
            };
        }
    };
    let base_url = context.client.base_url().to_string();

    match context.client.send(ApiRequest::get("/form-templates").anonymous()).await {
        Ok(response) => DoctorCheck {
            name: "api_reachability",
            status: CheckStatus::Pass,
            details: format!("`{base_url}` answered with status {}", response.status),
        },
        Err(ApiError::Network(message)) => {
            DoctorCheck { name: "api_reachability", status: CheckStatus::Fail, details: message }
        }
        Err(error) => DoctorCheck {
            name: "api_reachability",
            status: CheckStatus::Pass,
            details: format!("`{base_url}` is reachable ({})", error.class().as_str()),
        },
    }
}

fn summarize(checks: Vec<DoctorCheck>) -> DoctorReport {
    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
