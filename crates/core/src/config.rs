//! Chat configuration.

use std::time::Duration;

/// Delay between two revealed chars.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(100);

/// Delay between two revealed chars when replies come from a native
/// text-generation library.
pub const NATIVE_REVEAL_DELAY: Duration = Duration::from_millis(50);

/// System instructions sent ahead of the conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Reply revealed when the provider fails.
pub const DEFAULT_FALLBACK_REPLY: &str =
    "This is a mock reply. The text generator is not available right now.";

/// Builder for [`ChatConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChatConfigBuilder {
    reveal_delay: Option<Duration>,
    system_prompt: Option<String>,
    fallback_reply: Option<String>,
}

impl ChatConfigBuilder {
    /// Sets the delay between two revealed chars.
    #[inline]
    pub fn with_reveal_delay(mut self, delay: Duration) -> Self {
        self.reveal_delay = Some(delay);
        self
    }

    /// Sets the system instructions for the provider.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the reply used when the provider fails.
    #[inline]
    pub fn with_fallback_reply<S: Into<String>>(mut self, reply: S) -> Self {
        self.fallback_reply = Some(reply.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> ChatConfig {
        ChatConfig {
            reveal_delay: self.reveal_delay.unwrap_or(DEFAULT_REVEAL_DELAY),
            system_prompt: self
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            fallback_reply: self
                .fallback_reply
                .unwrap_or_else(|| DEFAULT_FALLBACK_REPLY.to_string()),
        }
    }
}

/// Configuration of a [`crate::Chat`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatConfig {
    pub(crate) reveal_delay: Duration,
    pub(crate) system_prompt: String,
    pub(crate) fallback_reply: String,
}

impl ChatConfig {
    /// Returns the delay between two revealed chars.
    #[inline]
    pub fn reveal_delay(&self) -> Duration {
        self.reveal_delay
    }

    /// Returns the system instructions.
    #[inline]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Returns the reply used when the provider fails.
    #[inline]
    pub fn fallback_reply(&self) -> &str {
        &self.fallback_reply
    }
}

impl Default for ChatConfig {
    #[inline]
    fn default() -> Self {
        ChatConfigBuilder::default().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_overrides() {
        let config = ChatConfig::default();
        assert_eq!(config.reveal_delay(), DEFAULT_REVEAL_DELAY);
        assert_eq!(config.system_prompt(), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.fallback_reply(), DEFAULT_FALLBACK_REPLY);

        let config = ChatConfigBuilder::default()
            .with_reveal_delay(NATIVE_REVEAL_DELAY)
            .with_fallback_reply("offline")
            .build();
        assert_eq!(config.reveal_delay(), Duration::from_millis(50));
        assert_eq!(config.system_prompt(), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.fallback_reply(), "offline");
    }
}
