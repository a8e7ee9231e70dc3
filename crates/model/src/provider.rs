use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ReplyRequest;

/// The error type for a reply provider.
pub trait ReplyProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that maps a conversation to the assistant's reply text.
///
/// Once the provider is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the provider should be prepared for being dropped anytime.
pub trait ReplyProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ReplyProviderError;

    /// Generates the complete reply for the request.
    ///
    /// The returned future must not borrow `self`, callers may drop it at
    /// any point to cancel the generation.
    fn generate(
        &self,
        req: &ReplyRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static;
}
