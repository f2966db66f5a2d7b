//! Purpose: Define the binding's error model for facade and boundary failures.
//! Exports: `Error`, `ErrorKind`, fallback code/message constants.
//! Role: Single error type surfaced by every public operation.
//! Invariants: `InvalidArgument` is raised before any foreign call and never carries a foreign code.
//! Invariants: `Codec` codes and messages are foreign-defined and surfaced verbatim.
use std::error::Error as StdError;
use std::fmt;

/// Code reported when the foreign side produced no usable result.
pub const FALLBACK_CODE: i32 = -1;
/// Substituted when a foreign error message is missing or not valid UTF-8.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";
pub const NO_DATA_MESSAGE: &str = "No data returned";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidArgument,
    OperationFailed,
    Codec,
    DecodeFailed,
    LibraryUnavailable,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    code: Option<i32>,
    argument: Option<&'static str>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            code: None,
            argument: None,
            source: None,
        }
    }

    pub fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Self {
        let mut err = Self::new(ErrorKind::InvalidArgument).with_message(message);
        err.argument = Some(argument);
        err
    }

    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OperationFailed)
            .with_message(message)
            .with_code(FALLBACK_CODE)
    }

    /// Failure reported by the foreign engine itself.
    pub fn codec(code: i32, message: Option<String>) -> Self {
        Self::new(ErrorKind::Codec)
            .with_message(message.unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()))
            .with_code(code)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Foreign code for `Codec`, `-1` for other post-call failures, `0` for argument errors.
    pub fn code(&self) -> i32 {
        match (self.kind, self.code) {
            (ErrorKind::InvalidArgument, _) => 0,
            (_, Some(code)) => code,
            (_, None) => FALLBACK_CODE,
        }
    }

    pub fn argument(&self) -> Option<&'static str> {
        self.argument
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(argument) = self.argument {
            write!(f, " (argument: {argument})")?;
        }
        if self.kind == ErrorKind::Codec {
            write!(f, " (code: {})", self.code())?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}
