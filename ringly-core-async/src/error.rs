//! Error types for this crate.

use std::fmt::Display;

use futures_channel::oneshot;

/// A convenience type alias for a `Result` with an `Error` type.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in this crate.
#[derive(Debug, Clone)]
pub struct Error {
    data: ErrorData,
}

/// The kind of error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A protocol-core error (wire decode failure, validation error, adapter error, ...).
    Core,
    /// The operation was canceled, usually because the peripheral disconnected mid-request.
    Canceled,
    /// A broadcast channel lagged and dropped events before this receiver read them.
    Lagged,
}

#[derive(Debug, Clone)]
enum ErrorData {
    Core(ringly_core::Error),
    Simple(ErrorKind),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.data {
            ErrorData::Core(error) => error.fmt(f),
            ErrorData::Simple(kind) => kind.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<ringly_core::Error> for Error {
    fn from(error: ringly_core::Error) -> Self {
        Error {
            data: ErrorData::Core(error),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            data: ErrorData::Simple(kind),
        }
    }
}

impl From<oneshot::Canceled> for Error {
    fn from(_value: oneshot::Canceled) -> Self {
        ErrorKind::Canceled.into()
    }
}

impl From<async_broadcast::RecvError> for Error {
    fn from(_value: async_broadcast::RecvError) -> Self {
        ErrorKind::Lagged.into()
    }
}

impl Error {
    /// If this wraps a [`ringly_core::Error`], returns a reference to it.
    pub fn get_ref(&self) -> Option<&ringly_core::Error> {
        match &self.data {
            ErrorData::Core(error) => Some(error),
            ErrorData::Simple(_) => None,
        }
    }

    /// If this wraps a [`ringly_core::Error`], returns it.
    pub fn into_inner(self) -> Option<ringly_core::Error> {
        match self.data {
            ErrorData::Core(error) => Some(error),
            ErrorData::Simple(_) => None,
        }
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> ErrorKind {
        match &self.data {
            ErrorData::Core(_) => ErrorKind::Core,
            ErrorData::Simple(kind) => *kind,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Core => f.write_str("protocol core error"),
            ErrorKind::Canceled => f.write_str("canceled"),
            ErrorKind::Lagged => f.write_str("lagged"),
        }
    }
}
