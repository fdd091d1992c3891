use std::fs;
use std::path::Path;

use clientele_core::config::{AppConfig, LoadOptions, Setting};
use toml::Value;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    run_with(LoadOptions::default())
}

pub fn run_with(options: LoadOptions) -> CommandResult {
    let config_file_path = options.resolved_path();
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult {
                exit_code: 2,
                output: format!("config validation failed: {error}"),
            };
        }
    };

    let config_file_doc = config_file_path.as_deref().and_then(load_config_file_doc);

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for setting in Setting::ALL {
        let source = setting_source(setting, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!(
            "- {} = {} (source: {source})",
            setting.key_path(),
            setting.render(&config)
        ));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn load_config_file_doc(path: &Path) -> Option<Value> {
    fs::read_to_string(path).ok()?.parse::<Value>().ok()
}

fn setting_source(
    setting: Setting,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = setting.env_source() {
        return format!("env ({env_key})");
    }

    match (config_file_doc, config_file_path) {
        (Some(doc), Some(path)) if contains_path(doc, setting.key_path()) => {
            format!("file ({})", path.display())
        }
        _ => "default".to_string(),
    }
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    key_path.split('.').try_fold(root, |current, key| current.get(key)).is_some()
}
