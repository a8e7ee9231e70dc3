use std::fmt::{self, Display, Formatter};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The provider backend is not present (e.g. the native library is
    /// not linked or failed to load).
    Unavailable,
    /// The provider refused to answer the request.
    Rejected,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Unavailable => write!(f, "Provider unavailable"),
            ErrorKind::Rejected => write!(f, "Request rejected"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}
