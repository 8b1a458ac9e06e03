//! Run configuration.
//!
//! Layers, later wins: built-in defaults, `.autocommit.toml` in the
//! repository work directory, `AUTOCOMMIT_*` environment variables, and
//! finally command-line flags.

use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use toml_edit::{DocumentMut, Item, Value};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::message::DEFAULT_COMMIT_TYPE;

/// Config file looked up in the repository work directory.
pub const CONFIG_FILE_NAME: &str = ".autocommit.toml";

const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_POLL_ATTEMPTS: u32 = 120;

/// Config keys with their environment variable names.
const KEYS: [(&str, &str); 9] = [
    ("auto_push", "AUTOCOMMIT_AUTO_PUSH"),
    ("batch_commit", "AUTOCOMMIT_BATCH_COMMIT"),
    ("conventional_commits", "AUTOCOMMIT_CONVENTIONAL"),
    ("default_type", "AUTOCOMMIT_DEFAULT_TYPE"),
    ("generator", "AUTOCOMMIT_GENERATOR"),
    ("generator_command", "AUTOCOMMIT_GENERATOR_COMMAND"),
    ("poll_interval_ms", "AUTOCOMMIT_POLL_INTERVAL_MS"),
    ("poll_attempts", "AUTOCOMMIT_POLL_ATTEMPTS"),
    ("remote", "AUTOCOMMIT_REMOTE"),
];

/// Which message generator to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorKind {
    #[default]
    Claude,
    Codex,
    Command,
}

impl GeneratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::Claude => "claude",
            GeneratorKind::Codex => "codex",
            GeneratorKind::Command => "command",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(GeneratorKind::Claude),
            "codex" => Ok(GeneratorKind::Codex),
            "command" => Ok(GeneratorKind::Command),
            other => Err(format!("Unknown generator: {other}")),
        }
    }
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub auto_push: bool,
    pub batch_commit: bool,
    pub conventional_commits: bool,
    pub default_type: String,
    pub generator: GeneratorKind,
    pub generator_command: Option<String>,
    pub poll_interval: Duration,
    pub poll_attempts: u32,
    /// Remote to push to; `None` pushes to the branch's upstream.
    pub remote: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_push: false,
            batch_commit: false,
            conventional_commits: false,
            default_type: DEFAULT_COMMIT_TYPE.to_string(),
            generator: GeneratorKind::default(),
            generator_command: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            remote: None,
        }
    }
}

/// Values set explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub auto_push: Option<bool>,
    pub batch_commit: Option<bool>,
    pub conventional_commits: Option<bool>,
    pub default_type: Option<String>,
    pub generator: Option<GeneratorKind>,
    pub generator_command: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub poll_attempts: Option<u32>,
    pub remote: Option<String>,
}

/// A raw setting before it is checked against its key.
enum Setting<'a> {
    Bool(bool),
    Int(i64),
    Str(&'a str),
}

impl Config {
    /// Defaults, then the repository config file, then the environment.
    pub fn load(workdir: &Path) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        let path = workdir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            config.apply_file(&path)?;
        }
        config.apply_env()?;
        Ok(config)
    }

    /// Apply settings from a TOML file.
    pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let shown = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: shown.clone(),
            source,
        })?;
        self.apply_toml(&content)
            .map_err(|e| match e {
                ConfigError::ParseFailed { message, .. } => ConfigError::ParseFailed {
                    path: shown.clone(),
                    message,
                },
                other => other,
            })?;
        debug!("Loaded config from {}", shown);
        Ok(())
    }

    /// Apply settings from TOML text.
    pub fn apply_toml(&mut self, content: &str) -> Result<(), ConfigError> {
        let doc = content
            .parse::<DocumentMut>()
            .map_err(|e| ConfigError::ParseFailed {
                path: CONFIG_FILE_NAME.to_string(),
                message: e.to_string(),
            })?;

        for (key, item) in doc.iter() {
            if !KEYS.iter().any(|(k, _)| *k == key) {
                warn!("Ignoring unknown config key '{}'", key);
                continue;
            }
            let setting = match item {
                Item::Value(Value::Boolean(b)) => Setting::Bool(*b.value()),
                Item::Value(Value::Integer(i)) => Setting::Int(*i.value()),
                Item::Value(Value::String(s)) => Setting::Str(s.value()),
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: other.to_string().trim().to_string(),
                        expected: "a boolean, integer or string",
                    });
                }
            };
            self.set(key, setting)?;
        }
        Ok(())
    }

    /// Apply `AUTOCOMMIT_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        for (key, var) in KEYS {
            if let Ok(value) = env::var(var)
                && !value.is_empty()
            {
                self.set(key, Setting::Str(&value)).map_err(|e| match e {
                    ConfigError::InvalidValue {
                        value, expected, ..
                    } => ConfigError::InvalidValue {
                        key: var.to_string(),
                        value,
                        expected,
                    },
                    other => other,
                })?;
            }
        }
        Ok(())
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(v) = overrides.auto_push {
            self.auto_push = v;
        }
        if let Some(v) = overrides.batch_commit {
            self.batch_commit = v;
        }
        if let Some(v) = overrides.conventional_commits {
            self.conventional_commits = v;
        }
        if let Some(v) = overrides.default_type {
            self.set("default_type", Setting::Str(&v))?;
        }
        if let Some(v) = overrides.generator {
            self.generator = v;
        }
        if let Some(v) = overrides.generator_command {
            self.generator_command = Some(v);
        }
        if let Some(v) = overrides.poll_interval_ms {
            self.poll_interval = Duration::from_millis(v);
        }
        if let Some(v) = overrides.poll_attempts {
            self.poll_attempts = v;
        }
        if let Some(v) = overrides.remote {
            self.remote = Some(v);
        }
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator == GeneratorKind::Command
            && self
                .generator_command
                .as_deref()
                .is_none_or(|c| c.trim().is_empty())
        {
            return Err(ConfigError::MissingGeneratorCommand);
        }
        Ok(())
    }

    /// Default type to apply when Conventional Commits formatting is on.
    pub fn conventional_type(&self) -> Option<&str> {
        self.conventional_commits
            .then_some(self.default_type.as_str())
    }

    fn set(&mut self, key: &str, setting: Setting<'_>) -> Result<(), ConfigError> {
        match key {
            "auto_push" => self.auto_push = as_bool(key, setting)?,
            "batch_commit" => self.batch_commit = as_bool(key, setting)?,
            "conventional_commits" => self.conventional_commits = as_bool(key, setting)?,
            "default_type" => {
                let value = as_str(key, setting)?.trim();
                if value.is_empty() || !value.chars().all(|c| c.is_ascii_lowercase()) {
                    return Err(invalid(key, value, "a lowercase word such as feat or chore"));
                }
                self.default_type = value.to_string();
            }
            "generator" => {
                let value = as_str(key, setting)?;
                self.generator = value
                    .parse()
                    .map_err(|_| invalid(key, value, "claude, codex or command"))?;
            }
            "generator_command" => {
                self.generator_command = Some(as_str(key, setting)?.to_string());
            }
            "poll_interval_ms" => {
                let ms = as_int(key, setting, 1)?;
                self.poll_interval = Duration::from_millis(ms);
            }
            "poll_attempts" => {
                let attempts = as_int(key, setting, 1)?;
                self.poll_attempts = u32::try_from(attempts)
                    .map_err(|_| invalid(key, &attempts.to_string(), "a positive integer"))?;
            }
            "remote" => {
                let value = as_str(key, setting)?.trim();
                self.remote = (!value.is_empty()).then(|| value.to_string());
            }
            _ => warn!("Ignoring unknown config key '{}'", key),
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

/// Parse a boolean the way the environment spells it.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn as_bool(key: &str, setting: Setting<'_>) -> Result<bool, ConfigError> {
    match setting {
        Setting::Bool(b) => Ok(b),
        Setting::Str(s) => parse_bool(s).ok_or_else(|| invalid(key, s, "a boolean")),
        Setting::Int(i) => Err(invalid(key, &i.to_string(), "a boolean")),
    }
}

fn as_str<'a>(key: &str, setting: Setting<'a>) -> Result<&'a str, ConfigError> {
    match setting {
        Setting::Str(s) => Ok(s),
        Setting::Bool(b) => Err(invalid(key, &b.to_string(), "a string")),
        Setting::Int(i) => Err(invalid(key, &i.to_string(), "a string")),
    }
}

fn as_int(key: &str, setting: Setting<'_>, min: u64) -> Result<u64, ConfigError> {
    let (raw, parsed) = match setting {
        Setting::Int(i) => (i.to_string(), u64::try_from(i).ok()),
        Setting::Str(s) => (s.to_string(), s.trim().parse::<u64>().ok()),
        Setting::Bool(b) => (b.to_string(), None),
    };
    parsed
        .filter(|v| *v >= min)
        .ok_or_else(|| invalid(key, &raw, "a positive integer"))
}
