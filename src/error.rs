use thiserror::Error;

/// Failures the engine can report.
///
/// Everything except [`StripError::InternalScan`] is caused by the caller and
/// can be fixed by changing the request. Malformed source code is never an
/// error: unterminated strings and comments are handled by the scanner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StripError {
    /// No profile is registered under this identifier.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// No language was given and none could be guessed from the code.
    #[error("Could not detect the language of the provided code")]
    UndetectedLanguage,

    /// The code is empty or whitespace only.
    #[error("No code provided")]
    EmptyInput,

    /// The scanner produced tokens that do not partition the input.
    #[error("Internal scan error at byte {offset}: {reason}")]
    InternalScan {
        /// Byte offset where the partition broke
        offset: usize,
        /// What was wrong with the token stream
        reason: String,
    },
}

impl StripError {
    /// True for errors the caller can correct (HTTP 400 class).
    pub fn is_user_error(&self) -> bool {
        !matches!(self, StripError::InternalScan { .. })
    }
}

pub type Result<T> = std::result::Result<T, StripError>;
