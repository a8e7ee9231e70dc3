//! A local fake reply provider for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chatllm_model::{
    ErrorKind, PromptMessage, ReplyProvider, ReplyProviderError, ReplyRequest,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    #[allow(dead_code)]
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl ReplyProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Clone)]
struct ScriptStep {
    preset: PresetReply,
    attempts: Arc<AtomicU64>,
}

/// A local fake provider for testing purpose.
///
/// Before sending requests, you need to setup the reply script, which is
/// how the provider should answer each user turn. The step is selected by
/// the number of user messages in the request, so the first user turn gets
/// the first step. If there are no enough steps in the script, an error
/// will be returned.
///
/// Clones share the attempt counters, so injected failures are consumed
/// across clones.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Vec<ScriptStep>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    /// Creates a provider that answers turns with `replies` in order.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut provider = Self::default();
        for reply in replies {
            provider.add_reply(PresetReply::with_text(reply));
        }
        provider
    }

    #[inline]
    pub fn add_reply(&mut self, preset: PresetReply) {
        self.script.push(ScriptStep {
            preset,
            attempts: Default::default(),
        });
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns how many times the step for `turn` has been requested.
    pub fn attempts(&self, turn: usize) -> u64 {
        self.script
            .get(turn)
            .map(|step| step.attempts.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn answer(&self, req: &ReplyRequest) -> Result<String, Error> {
        let user_turns = req
            .messages
            .iter()
            .filter(|msg| matches!(msg, PromptMessage::User(_)))
            .count();
        let Some(turn) = user_turns.checked_sub(1) else {
            return Err(Error {
                message: "no user message in request",
                kind: ErrorKind::Rejected,
            });
        };
        let Some(step) = self.script.get(turn) else {
            return Err(Error {
                message: "no enough steps",
                kind: ErrorKind::Unavailable,
            });
        };

        let attempt = step.attempts.fetch_add(1, Ordering::Relaxed);
        if step.preset.should_fail(attempt) {
            return Err(Error {
                message: "injected failure",
                kind: ErrorKind::Other,
            });
        }
        Ok(step.preset.text.clone())
    }
}

impl ReplyProvider for ScriptedProvider {
    type Error = crate::Error;

    fn generate(
        &self,
        req: &ReplyRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        let result = self.answer(req);
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            result
        }
    }
}
