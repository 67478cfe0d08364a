/*! Defines the errors arising from constructing, transforming and serializing
formulae. */
use std::path::PathBuf;
use thiserror::Error;

/// Is the type of errors returned by the operations of this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Is returned when a codec encounters malformed input.
    #[error("{}:{}: {}", .path.display(), .line, .message)]
    Parse {
        /// Is the path of the input, used for diagnostics only.
        path: PathBuf,

        /// Is the 1-based line number at which the input is malformed.
        line: usize,

        /// Describes the malformation.
        message: String,
    },

    /// Is returned when an attempt is made to construct a formula node that
    /// violates a structural invariant.
    #[error("invalid formula structure: {}", .message)]
    InvalidStructure {
        /// Describes the violated invariant.
        message: String,
    },

    /// Is returned by the QDIMACS writer when the body of the given formula is
    /// not in conjunctive normal form.
    #[error("the formula body is not in conjunctive normal form")]
    NotCnf,

    /// Is returned when a cancellation signal fires during a transformation.
    #[error("the operation was cancelled")]
    Cancelled,

    /// Is returned when the underlying byte source or sink fails.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    pub(crate) fn parse(
        path: impl Into<PathBuf>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
