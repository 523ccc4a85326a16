use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["robo-advisor.toml", "config/robo-advisor.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options
                .config_path
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = env_override("ROBO_ADVISOR_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = env_override("ROBO_ADVISOR_SERVER_PORT") {
            self.server.port = parse_env("ROBO_ADVISOR_SERVER_PORT", &value)?;
        }
        if let Some(value) = env_override("ROBO_ADVISOR_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_env("ROBO_ADVISOR_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            env_override("ROBO_ADVISOR_LOGGING_LEVEL").or_else(|| env_override("ROBO_ADVISOR_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = env_override("ROBO_ADVISOR_LOGGING_FORMAT")
            .or_else(|| env_override("ROBO_ADVISOR_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// First existing config file: the explicit path if given, otherwise the
/// default candidates relative to the working directory.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    let expanded = expand_env_references(&raw)?;

    toml::from_str(&expanded)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replaces every `${NAME}` in a config file with the value of `NAME`.
fn expand_env_references(raw: &str) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find("${") {
        expanded.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let close = after_open.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let name = &after_open[..close];
        let value = env::var(name)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: name.to_string() })?;
        expanded.push_str(&value);
        rest = &after_open[close + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

/// Value of an override variable. Unset and blank variables both count as absent.
pub fn env_override(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use super::{
        env_override, expand_env_references, AppConfig, ConfigError, ConfigOverrides,
        LoadOptions, LogFormat,
    };

    const OVERRIDE_KEYS: [&str; 7] = [
        "ROBO_ADVISOR_SERVER_BIND_ADDRESS",
        "ROBO_ADVISOR_SERVER_PORT",
        "ROBO_ADVISOR_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "ROBO_ADVISOR_LOGGING_LEVEL",
        "ROBO_ADVISOR_LOGGING_FORMAT",
        "ROBO_ADVISOR_LOG_LEVEL",
        "ROBO_ADVISOR_LOG_FORMAT",
    ];

    /// Runs `body` with only `vars` set among the override keys, restoring
    /// the process environment afterwards.
    fn with_vars<T>(vars: &[(&str, &str)], body: impl FnOnce() -> T) -> T {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        let _guard = LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let touched: Vec<&str> =
            OVERRIDE_KEYS.iter().copied().chain(vars.iter().map(|(key, _)| *key)).collect();
        let saved: Vec<(&str, Option<String>)> =
            touched.iter().map(|key| (*key, env::var(key).ok())).collect();

        for key in &touched {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }

        let outcome = body();

        for (key, value) in saved {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
        outcome
    }

    fn config_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("robo-advisor.toml");
        fs::write(&path, contents).expect("write config file");
        (dir, path)
    }

    fn load_from(path: PathBuf) -> Result<AppConfig, ConfigError> {
        AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
    }

    #[test]
    fn built_in_defaults_apply_when_nothing_is_configured() {
        let config = with_vars(&[], || AppConfig::load(LoadOptions::default())).expect("defaults");

        assert_eq!(config.listen_address(), "127.0.0.1:8080");
        assert_eq!(config.server.graceful_shutdown_secs, 15);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn config_file_values_replace_defaults_and_expand_references() {
        let (_dir, path) = config_file(
            "[server]\nbind_address = \"${ROBO_ADVISOR_TEST_HOST}\"\nport = 9443\n\n[logging]\nformat = \"json\"\n",
        );

        let config = with_vars(&[("ROBO_ADVISOR_TEST_HOST", "0.0.0.0")], || load_from(path))
            .expect("file config");

        assert_eq!(config.listen_address(), "0.0.0.0:9443");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn unresolvable_reference_names_the_variable() {
        let (_dir, path) = config_file("[server]\nbind_address = \"${ROBO_ADVISOR_TEST_NOWHERE}\"\n");

        let error = with_vars(&[], || load_from(path)).expect_err("missing variable");

        assert!(matches!(
            error,
            ConfigError::MissingEnvInterpolation { ref var } if var == "ROBO_ADVISOR_TEST_NOWHERE"
        ));
    }

    #[test]
    fn reference_expansion_handles_plain_text_and_unclosed_braces() {
        assert_eq!(expand_env_references("port = 80").expect("plain"), "port = 80");
        assert!(matches!(
            expand_env_references("host = \"${OPEN"),
            Err(ConfigError::UnterminatedInterpolation)
        ));
    }

    #[test]
    fn short_logging_aliases_are_honored() {
        let config = with_vars(
            &[("ROBO_ADVISOR_LOG_LEVEL", "warn"), ("ROBO_ADVISOR_LOG_FORMAT", "pretty")],
            || AppConfig::load(LoadOptions::default()),
        )
        .expect("alias config");

        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn environment_beats_file_and_overrides_beat_environment() {
        let (_dir, path) = config_file(
            "[server]\nbind_address = \"10.1.2.3\"\nport = 9000\n\n[logging]\nlevel = \"error\"\n",
        );

        let config = with_vars(
            &[("ROBO_ADVISOR_SERVER_PORT", "7000"), ("ROBO_ADVISOR_LOGGING_LEVEL", "warn")],
            || {
                AppConfig::load(LoadOptions {
                    config_path: Some(path),
                    overrides: ConfigOverrides {
                        log_level: Some("trace".to_string()),
                        ..ConfigOverrides::default()
                    },
                    ..LoadOptions::default()
                })
            },
        )
        .expect("layered config");

        assert_eq!(config.server.bind_address, "10.1.2.3");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn blank_override_variables_are_ignored() {
        let (config, seen) = with_vars(&[("ROBO_ADVISOR_SERVER_PORT", "  ")], || {
            (AppConfig::load(LoadOptions::default()), env_override("ROBO_ADVISOR_SERVER_PORT"))
        });

        assert_eq!(config.expect("blank ignored").server.port, 8080);
        assert_eq!(seen, None);
    }

    #[test]
    fn unparseable_override_names_its_key() {
        let error = with_vars(&[("ROBO_ADVISOR_SERVER_GRACEFUL_SHUTDOWN_SECS", "soon")], || {
            AppConfig::load(LoadOptions::default())
        })
        .expect_err("invalid override");

        assert!(matches!(
            error,
            ConfigError::InvalidEnvOverride { ref key, ref value }
                if key == "ROBO_ADVISOR_SERVER_GRACEFUL_SHUTDOWN_SECS" && value == "soon"
        ));
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let zero_port = with_vars(&[], || {
            AppConfig::load(LoadOptions {
                overrides: ConfigOverrides { port: Some(0), ..ConfigOverrides::default() },
                ..LoadOptions::default()
            })
        });
        assert!(matches!(zero_port, Err(ConfigError::Validation(ref message)) if message.contains("server.port")));

        let noisy = with_vars(&[("ROBO_ADVISOR_LOGGING_LEVEL", "verbose")], || {
            AppConfig::load(LoadOptions::default())
        });
        assert!(matches!(noisy, Err(ConfigError::Validation(ref message)) if message.contains("logging.level")));
    }

    #[test]
    fn explicitly_required_file_must_exist() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nowhere.toml");

        let result = with_vars(&[], || {
            AppConfig::load(LoadOptions {
                config_path: Some(path.clone()),
                require_file: true,
                ..LoadOptions::default()
            })
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(ref missing)) if *missing == path));
    }
}
