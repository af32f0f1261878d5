use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use esm_core::config::resolve_config_path;
use toml::Value;

use super::{load_config, GlobalArgs};

pub fn run(global: &GlobalArgs) -> String {
    let config = match load_config(global) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(global);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str], overridden: bool| {
        if overridden {
            return "flag (--base-url)".to_string();
        }
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: flag > env > file > default):".to_string()];

    lines.push(render_line(
        "api.base_url",
        &config.api.base_url,
        source("api.base_url", &["ESM_API_BASE_URL"], global.base_url.is_some()),
    ));
    lines.push(render_line(
        "api.timeout_secs",
        &config.api.timeout_secs.to_string(),
        source("api.timeout_secs", &["ESM_API_TIMEOUT_SECS"], false),
    ));
    lines.push(render_line(
        "session.store_path",
        &config.session.store_path.display().to_string(),
        source("session.store_path", &["ESM_SESSION_STORE_PATH"], false),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["ESM_LOGGING_LEVEL", "ESM_LOG_LEVEL"], false),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_ascii_lowercase(),
        source("logging.format", &["ESM_LOGGING_FORMAT", "ESM_LOG_FORMAT"], false),
    ));

    lines.join("\n")
}

fn detect_config_path(global: &GlobalArgs) -> Option<PathBuf> {
    resolve_config_path(global.config_path.as_deref())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    for env_key in env_keys {
        if env::var(env_key).is_ok_and(|value| !value.trim().is_empty()) {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
