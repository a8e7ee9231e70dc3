//! Built-in reply providers.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::future::ready;

use chatllm_model::{
    ErrorKind, ReplyProvider, ReplyProviderError, ReplyRequest,
};

/// Canned reply of [`MockProvider::default`].
pub const MOCK_REPLY: &str = "Hello! I'm a mock assistant. Your message \
     has been received, and this reply is revealed one character at a time.";

/// Error type for the built-in providers.
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ReplyProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A provider that replies with the user's own text.
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoProvider;

impl ReplyProvider for EchoProvider {
    type Error = Error;

    fn generate(
        &self,
        req: &ReplyRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        let result = match req.latest_user_text() {
            Some(text) => Ok(text.to_owned()),
            None => Err(Error::new("nothing to echo", ErrorKind::Other)),
        };
        ready(result)
    }
}

/// A provider that always replies with the same text.
#[derive(Clone, Debug)]
pub struct MockProvider {
    reply: String,
}

impl MockProvider {
    /// Creates a provider replying with `reply`.
    #[inline]
    pub fn new<S: Into<String>>(reply: S) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for MockProvider {
    #[inline]
    fn default() -> Self {
        Self::new(MOCK_REPLY)
    }
}

impl ReplyProvider for MockProvider {
    type Error = Error;

    fn generate(
        &self,
        _req: &ReplyRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        ready(Ok(self.reply.clone()))
    }
}

/// A provider standing in for a native text generator that is not linked
/// into this build. Every request fails with [`ErrorKind::Unavailable`].
#[derive(Clone, Copy, Debug, Default)]
pub struct UnlinkedProvider;

impl ReplyProvider for UnlinkedProvider {
    type Error = Error;

    fn generate(
        &self,
        _req: &ReplyRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        ready(Err(Error::new(
            "native text generator is not linked",
            ErrorKind::Unavailable,
        )))
    }
}
