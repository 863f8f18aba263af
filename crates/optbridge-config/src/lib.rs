//! `optbridge.toml`: where the compiled library lives, how to call the
//! assembler, and how loud to be.
//!
//! Every field has a default, so a project that follows the Maven layout
//! and has Krakatau checked out next to it needs no file at all.

use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use optbridge_patch::LibraryLayout;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::prelude::*;

/// File name looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "optbridge.toml";

/// Overrides the discovered config path.
pub const CONFIG_ENV_VAR: &str = "OPTBRIDGE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptbridgeConfig {
    pub paths: PathsConfig,
    pub library: LibraryLayout,
    pub krakatau: KrakatauConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Compiled classes; patched classes are written back here.
    pub classes: PathBuf,
    /// Java sources, read to find the empty class's declaration line.
    pub sources: PathBuf,
    /// Directory for intermediate `.j` files. A fresh temporary directory
    /// is used when unset.
    pub scratch: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            classes: PathBuf::from("target/classes"),
            sources: PathBuf::from("src/main/java"),
            scratch: None,
        }
    }
}

/// Assembler and disassembler command lines.
///
/// Arguments may use `{classes}`, `{scratch}`, `{class}`, `{class_file}` and
/// `{asm_file}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KrakatauConfig {
    pub disassemble: Vec<String>,
    pub assemble: Vec<String>,
    /// Per invocation. `0` disables the timeout.
    pub timeout_ms: u64,
}

impl Default for KrakatauConfig {
    fn default() -> Self {
        let argv = |args: &[&str]| -> Vec<String> { args.iter().map(|s| s.to_string()).collect() };
        Self {
            disassemble: argv(&[
                "python2",
                "krakatau/disassemble.py",
                "-out",
                "{scratch}",
                "{class_file}",
            ]),
            assemble: argv(&[
                "python2",
                "krakatau/assemble.py",
                "-out",
                "{classes}",
                "{asm_file}",
            ]),
            timeout_ms: 60_000,
        }
    }
}

impl KrakatauConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive.
    pub level: String,
    /// One JSON object per event.
    pub json: bool,
    /// Log to stderr. Off means no subscriber is installed.
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            stderr: true,
        }
    }
}

impl LoggingConfig {
    fn normalized_level(&self) -> String {
        let trimmed = self.level.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" => "info".to_string(),
            "warning" => "warn".to_string(),
            level @ ("trace" | "debug" | "info" | "warn" | "error") => level.to_string(),
            _ => trimmed.to_string(),
        }
    }

    /// Filter from `level`, with `RUST_LOG` directives layered on top.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let config = self.normalized_level();
        let fallback = || {
            tracing_subscriber::EnvFilter::try_new(&config).unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::default()
                    .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
            })
        };

        match std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            Some(env) => tracing_subscriber::EnvFilter::try_new(format!("{config},{env}"))
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&env))
                .unwrap_or_else(|_| fallback()),
            None => fallback(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.message().to_string())
    }
}

impl OptbridgeConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Makes relative paths relative to `root` instead of the process's
    /// working directory.
    pub fn resolve_paths(mut self, root: &Path) -> Self {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        };
        resolve(&mut self.paths.classes);
        resolve(&mut self.paths.sources);
        if let Some(scratch) = self.paths.scratch.as_mut() {
            resolve(scratch);
        }
        self
    }
}

/// `$OPTBRIDGE_CONFIG` if set, else `optbridge.toml` in `root` if present.
pub fn discover_config_path(root: &Path) -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        let path = PathBuf::from(path);
        return Some(if path.is_relative() { root.join(path) } else { path });
    }
    let candidate = root.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

/// Loads the project's config, or defaults when there is none. Paths come
/// back resolved against `root`.
pub fn load_for_project(root: &Path) -> Result<(OptbridgeConfig, Option<PathBuf>), ConfigError> {
    let path = discover_config_path(root);
    let config = match &path {
        Some(path) => OptbridgeConfig::load_from_path(path)?,
        None => OptbridgeConfig::default(),
    };
    Ok((config.resolve_paths(root), path))
}

static TRACING_INIT: Once = Once::new();

/// Installs the global subscriber. Only the first call has any effect.
pub fn init_tracing(logging: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        if !logging.stderr {
            return;
        }
        let filter = logging.env_filter();
        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if logging.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false)
                .boxed()
        };
        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("a global tracing subscriber was already installed");
        }
    });
}
