use std::fs;
use std::path::Path;

use robo_advisor_core::config::{env_override, resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let lines = [
        "effective config (source precedence: env > file > default):".to_string(),
        render_line(
            "server.bind_address",
            &config.server.bind_address,
            source("server.bind_address", &["ROBO_ADVISOR_SERVER_BIND_ADDRESS"]),
        ),
        render_line(
            "server.port",
            &config.server.port.to_string(),
            source("server.port", &["ROBO_ADVISOR_SERVER_PORT"]),
        ),
        render_line(
            "server.graceful_shutdown_secs",
            &config.server.graceful_shutdown_secs.to_string(),
            source(
                "server.graceful_shutdown_secs",
                &["ROBO_ADVISOR_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            ),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["ROBO_ADVISOR_LOGGING_LEVEL", "ROBO_ADVISOR_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            source("logging.format", &["ROBO_ADVISOR_LOGGING_FORMAT", "ROBO_ADVISOR_LOG_FORMAT"]),
        ),
    ];

    lines.join("\n")
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
    if let Some(env_key) = env_keys.iter().find(|key| env_override(key).is_some()) {
        return format!("env ({env_key})");
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

#[cfg(test)]
mod tests {
    use super::{contains_path, field_source, render_line};
    use std::path::PathBuf;

    #[test]
    fn nested_keys_are_found_in_config_document() {
        let doc: toml::Value = "[server]\nport = 9000\n".parse().expect("toml");

        assert!(contains_path(&doc, "server.port"));
        assert!(!contains_path(&doc, "server.bind_address"));
        assert!(!contains_path(&doc, "logging.level"));
    }

    #[test]
    fn file_source_names_the_config_path() {
        let doc: toml::Value = "[logging]\nlevel = \"debug\"\n".parse().expect("toml");
        let path = PathBuf::from("config/robo-advisor.toml");

        let source = field_source(
            "logging.level",
            &["ROBO_ADVISOR_CONFIG_TEST_UNSET"],
            Some(&doc),
            Some(path.as_path()),
        );

        assert_eq!(source, "file (config/robo-advisor.toml)");
        assert_eq!(
            render_line("logging.level", "debug", source),
            "- logging.level = debug (source: file (config/robo-advisor.toml))"
        );
    }

    #[test]
    fn unset_keys_fall_back_to_default_source() {
        assert_eq!(field_source("server.port", &["ROBO_ADVISOR_CONFIG_TEST_UNSET"], None, None), "default");
    }
}
