use std::sync::Arc;

use chatllm_model::ReplyProvider;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

use super::Chat;
use super::driver::{ChatState, Observers, run_chat};
use crate::config::ChatConfig;
use crate::reply_client::ReplyClient;
use crate::transcript::Entry;

/// [`Chat`] builder.
pub struct ChatBuilder {
    reply_client: ReplyClient,
    config: ChatConfig,
    observers: Observers,
}

impl ChatBuilder {
    /// Creates a new builder with the specified reply provider.
    #[inline]
    pub fn with_reply_provider<P: ReplyProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            reply_client: ReplyClient::new(provider),
            config: ChatConfig::default(),
            observers: Observers::default(),
        }
    }

    /// Sets the configuration.
    #[inline]
    pub fn with_config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches a callback to be invoked when an entry is appended or
    /// rewritten, with the index of that entry.
    #[inline]
    pub fn on_entry_changed(
        mut self,
        on_entry_changed: impl Fn(usize, &Entry) + Send + Sync + 'static,
    ) -> Self {
        self.observers.on_entry_changed = Some(Box::new(on_entry_changed));
        self
    }

    /// Attaches a callback to be invoked when the typing indicator is
    /// shown or hidden.
    #[inline]
    pub fn on_typing_changed(
        mut self,
        on_typing_changed: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.observers.on_typing_changed = Some(Box::new(on_typing_changed));
        self
    }

    /// Attaches a callback to be invoked when a sent turn is complete and
    /// nothing else is queued.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.observers.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Builds the chat and starts its background task.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn build(self) -> Chat {
        let ChatBuilder {
            reply_client,
            config,
            observers,
        } = self;

        let reply_client =
            reply_client.with_fallback(config.fallback_reply.clone());
        let state = ChatState::new(reply_client, config, observers);

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = watch::channel(false);
        tokio::spawn(
            run_chat(state, cmd_rx, kill_rx).instrument(trace_span!("chat")),
        );

        Chat {
            cmd_tx,
            kill_tx: Arc::new(kill_tx),
        }
    }
}
