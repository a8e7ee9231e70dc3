use std::pin::Pin;
use std::sync::Arc;

use chatllm_model::{ReplyProvider, ReplyProviderError, ReplyRequest};
use tracing::Instrument;

use crate::config::DEFAULT_FALLBACK_REPLY;

type GenerateResult = Result<String, Box<dyn ReplyProviderError>>;
type BoxedGenerateFuture = Pin<Box<dyn Future<Output = GenerateResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ReplyRequest) -> BoxedGenerateFuture + Send + Sync>;

/// The future returned by [`ReplyClient::resolve`].
pub(crate) type BoxedResolveFuture =
    Pin<Box<dyn Future<Output = String> + Send>>;

/// A wrapper around a reply provider that erases its type and turns every
/// failure into the fallback reply.
#[derive(Clone)]
pub struct ReplyClient {
    handler_fn: HandlerFn,
    fallback: Arc<str>,
}

impl ReplyClient {
    /// Creates a client with the default fallback reply.
    #[inline]
    pub fn new<P: ReplyProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ReplyClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.generate(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    fut.await.map_err(|err| {
                        Box::new(err) as Box<dyn ReplyProviderError>
                    })
                }
                .instrument(trace_span!("reply client req")),
            )
        });
        Self {
            handler_fn,
            fallback: DEFAULT_FALLBACK_REPLY.into(),
        }
    }

    /// Sets the reply used when the provider fails.
    #[inline]
    pub fn with_fallback<S: Into<String>>(mut self, fallback: S) -> Self {
        let fallback: String = fallback.into();
        self.fallback = fallback.into();
        self
    }

    /// Returns the reply used when the provider fails.
    #[inline]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Asks the provider for a reply without applying the fallback.
    #[inline]
    pub async fn generate(&self, req: ReplyRequest) -> GenerateResult {
        (self.handler_fn)(req).await
    }

    /// Picks the reveal source for a request: the provider's reply, or the
    /// fallback if the provider fails.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. Dropping the future drops the provider
    /// call as well.
    pub(crate) fn resolve(&self, req: ReplyRequest) -> BoxedResolveFuture {
        let fut = (self.handler_fn)(req);
        let fallback = Arc::clone(&self.fallback);
        Box::pin(async move {
            match fut.await {
                Ok(reply) => reply,
                Err(err) => {
                    let kind = err.kind();
                    warn!(%kind, "provider failed, using fallback: {err}");
                    fallback.to_string()
                }
            }
        })
    }
}
