use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input ended while a block was still open.
    UnexpectedEof { expected: &'static str },
    /// A line did not match the structural grammar.
    Malformed { line: usize, message: String },
    InvalidDescriptor(String),
    InvalidSignature(String),
}

impl Error {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        Error::Malformed {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input: expected {expected}")
            }
            Error::Malformed { line, message } => write!(f, "line {line}: {message}"),
            Error::InvalidDescriptor(desc) => write!(f, "invalid descriptor: {desc}"),
            Error::InvalidSignature(sig) => write!(f, "invalid signature: {sig}"),
        }
    }
}

impl std::error::Error for Error {}
