use thiserror::Error;

pub type Result<T, E = PatchError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PatchError {
    /// An expected method, table entry or declaration is missing from a class.
    #[error("{class}: {message}")]
    Location { class: String, message: String },

    /// A declaration matches no synthesis pattern.
    #[error("{reason}: {name}{descriptor} (signature: {signature})")]
    Classification {
        reason: String,
        name: String,
        descriptor: String,
        signature: String,
    },

    #[error("{class}: method {name}{descriptor} is already declared")]
    DuplicateMethod {
        class: String,
        name: String,
        descriptor: String,
    },

    #[error(transparent)]
    Jasm(#[from] optbridge_jasm::Error),
}

impl PatchError {
    pub(crate) fn location(class: impl Into<String>, message: impl Into<String>) -> Self {
        PatchError::Location {
            class: class.into(),
            message: message.into(),
        }
    }
}
