//! Error handling types and utilities for the S-Emulator toolchain.
//!
//! Every crate in the workspace reports failures through the single [`Error`]
//! type defined here. An error carries a human-readable message, an
//! [`ErrorKind`] that places it in the engine's error taxonomy, and optional
//! source location information for failures that can be pinned to a line of
//! the program description.
//!
//! # Error taxonomy
//!
//! - [`ErrorKind::Load`]: the program description is missing, malformed, or
//!   names an instruction the emulator does not know.
//! - [`ErrorKind::InvalidProgram`]: the description parsed, but the program
//!   cannot run (unresolved labels, unknown or recursive QUOTE callees).
//! - [`ErrorKind::HostMisuse`]: the host called the engine in a state where
//!   the request makes no sense (nothing loaded, degree out of range, ...).
//!
//! A program that runs off its last instruction, or jumps to a label no
//! instruction carries, is *not* an error: it halts cleanly.
//!
//! # Examples
//!
//! ```rust
//! use semu_syntax::error::{Error, ErrorKind, Result, error, misuse};
//!
//! fn parse_degree(s: &str) -> Result<usize> {
//!     s.parse().map_err(|_| Error::new(format!("Invalid degree: {}", s)))
//! }
//!
//! fn checked_degree(s: &str, max: usize) -> Result<usize> {
//!     let d = parse_degree(s)?;
//!     if d > max {
//!         misuse(format!("degree {} exceeds maximum degree {}", d, max))
//!     } else {
//!         Ok(d)
//!     }
//! }
//!
//! assert_eq!(checked_degree("1", 2).unwrap(), 1);
//! assert_eq!(checked_degree("3", 2).unwrap_err().kind, ErrorKind::HostMisuse);
//! let _: Result<()> = error("Operation failed");
//! ```

use std::fmt;

/// Where an [`Error`] sits in the engine's error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The program description could not be read, lexed, parsed or mapped.
    Load,
    /// The program is well-formed but cannot be expanded or executed.
    InvalidProgram,
    /// The host asked for something the engine's current state rejects.
    HostMisuse,
}

impl ErrorKind {
    /// Short title used when rendering errors (`"Load error"`, ...).
    pub fn title(self) -> &'static str {
        match self {
            ErrorKind::Load => "Load error",
            ErrorKind::InvalidProgram => "Invalid program",
            ErrorKind::HostMisuse => "Usage error",
        }
    }
}

/// An error that occurred while loading, expanding or running an S-program.
///
/// `line` and `col` are 1-based and point into the program description; they
/// are only set for failures that can be pinned to an element of it.
///
/// ```rust
/// use semu_syntax::{Error, ErrorKind};
///
/// let unknown = Error::new("Unknown instruction 'FLY'").at(Some(4), Some(5));
/// assert_eq!(unknown.kind, ErrorKind::Load);
/// assert_eq!(unknown.to_string(), "Unknown instruction 'FLY' at 4:5");
///
/// let dangling = Error::invalid_program("Instruction #2 of 'P' jumps to undefined label L9");
/// assert_eq!(dangling.line, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub msg: String,
    pub line: Option<usize>,
    pub col: Option<usize>,
}

impl Error {
    /// A [`ErrorKind::Load`] error without a location.
    pub fn new(msg: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Load, msg)
    }

    /// Creates an error of an explicit kind.
    pub fn of_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
            line: None,
            col: None,
        }
    }

    /// A [`ErrorKind::Load`] error at a known position, as raised by the
    /// lexer and parser.
    pub fn with_span(msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind: ErrorKind::Load,
            msg: msg.into(),
            line: Some(line),
            col: Some(col),
        }
    }

    /// Creates an [`ErrorKind::InvalidProgram`] error.
    pub fn invalid_program(msg: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::InvalidProgram, msg)
    }

    /// Creates an [`ErrorKind::HostMisuse`] error.
    pub fn host_misuse(msg: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::HostMisuse, msg)
    }

    /// Attaches a source location unless one is already present.
    pub fn at(mut self, line: Option<usize>, col: Option<usize>) -> Self {
        if self.line.is_none() {
            self.line = line;
            self.col = col;
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(l), Some(c)) = (self.line, self.col) {
            write!(f, "{} at {}:{}", self.msg, l, c)
        } else {
            write!(f, "{}", self.msg)
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::new(s)
    }
}
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::new(s)
    }
}

/// A specialized `Result` type for S-Emulator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for `Err(Error::new(msg))`.
pub fn error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::new(msg))
}

/// Shorthand for `Err(Error::with_span(msg, line, col))`.
pub fn error_at<T>(line: usize, col: usize, msg: impl Into<String>) -> Result<T> {
    Err(Error::with_span(msg, line, col))
}

/// Shorthand for `Err(Error::invalid_program(msg))`.
pub fn invalid<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::invalid_program(msg))
}

/// Shorthand for `Err(Error::host_misuse(msg))`.
pub fn misuse<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::host_misuse(msg))
}
