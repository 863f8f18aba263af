use std::path::PathBuf;

use optbridge_config::ConfigError;
use optbridge_patch::PatchError;
use optbridge_process::RunCommandError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to {step} {class}")]
    Command {
        step: &'static str,
        class: String,
        #[source]
        source: RunCommandError,
    },

    #[error("class file for {class} not found at {}", .path.display())]
    MissingClass { class: String, path: PathBuf },

    #[error("disassembler produced no output for {class} under {}", .path.display())]
    MissingOutput { class: String, path: PathBuf },

    #[error("failed to patch {class}")]
    Patch {
        class: String,
        #[source]
        source: PatchError,
    },

    #[error("no declaration of class {name} in {}", .path.display())]
    SourceLine { name: String, path: PathBuf },
}

impl DriverError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DriverError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn patch(class: &str, source: impl Into<PatchError>) -> Self {
        DriverError::Patch {
            class: class.to_string(),
            source: source.into(),
        }
    }
}
