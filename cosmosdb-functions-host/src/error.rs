//! Common host interfaces types

/// An alias for Result<T, Error> for convenience.
pub type FunctionResult<T> = std::result::Result<T, Error>;

/// An error during the execution of a Function.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The trigger argument could not be decoded into the handler's input type.
    #[error("Failed to extract trigger argument: {0}")]
    ExtractError(String),

    /// A catch-all error with a message.
    #[error("{0}")]
    MessageError(String),
}

impl Error {
    /// Creates a catch-all error from a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::MessageError(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::ExtractError(e.to_string())
    }
}
