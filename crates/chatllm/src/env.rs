use std::env;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

use chatllm_core::{ChatBuilder, ChatConfig, ChatConfigBuilder};

use crate::providers::{EchoProvider, MockProvider, UnlinkedProvider};

const REPLY_VAR: &str = "CHATLLM_REPLY";
const REVEAL_DELAY_VAR: &str = "CHATLLM_REVEAL_DELAY_MS";
const SYSTEM_PROMPT_VAR: &str = "CHATLLM_SYSTEM_PROMPT";
const FALLBACK_REPLY_VAR: &str = "CHATLLM_FALLBACK_REPLY";

/// Where assistant replies come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReplyMode {
    /// Reply with the user's own text.
    #[default]
    Echo,
    /// Reply with a canned text.
    Mock,
    /// Ask a native generator that is not linked, so the fallback reply
    /// is always used.
    Unlinked,
}

impl FromStr for ReplyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "echo" => Ok(ReplyMode::Echo),
            "mock" => Ok(ReplyMode::Mock),
            "unlinked" => Ok(ReplyMode::Unlinked),
            _ => Err(ConfigError::InvalidValue {
                var: REPLY_VAR,
                value: s.to_owned(),
            }),
        }
    }
}

impl ReplyMode {
    /// Creates a chat builder with the provider for this mode.
    pub fn chat_builder(self) -> ChatBuilder {
        match self {
            ReplyMode::Echo => ChatBuilder::with_reply_provider(EchoProvider),
            ReplyMode::Mock => {
                ChatBuilder::with_reply_provider(MockProvider::default())
            }
            ReplyMode::Unlinked => {
                ChatBuilder::with_reply_provider(UnlinkedProvider)
            }
        }
    }
}

/// Error returned when the environment holds an unusable value.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The variable is set to a value that can't be parsed.
    InvalidValue {
        /// Name of the variable.
        var: &'static str,
        /// The offending value.
        value: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { var, value } => {
                write!(f, "invalid value for {var}: {value:?}")
            }
        }
    }
}

impl StdError for ConfigError {}

/// Chat settings read from `CHATLLM_*` environment variables.
///
/// - `CHATLLM_REPLY`: `echo` (default), `mock` or `unlinked`.
/// - `CHATLLM_REVEAL_DELAY_MS`: milliseconds between two revealed chars.
/// - `CHATLLM_SYSTEM_PROMPT`: system instructions for the provider.
/// - `CHATLLM_FALLBACK_REPLY`: reply used when the provider fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvConfig {
    /// Where replies come from.
    pub reply_mode: ReplyMode,
    /// Configuration of the chat itself.
    pub chat: ChatConfig,
}

impl EnvConfig {
    /// Reads the configuration from the process environment.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Reads the configuration with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reply_mode = match lookup(REPLY_VAR) {
            Some(value) => value.parse()?,
            None => ReplyMode::default(),
        };

        let mut chat = ChatConfigBuilder::default();
        if let Some(value) = lookup(REVEAL_DELAY_VAR) {
            let millis = value.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue {
                    var: REVEAL_DELAY_VAR,
                    value: value.clone(),
                }
            })?;
            chat = chat.with_reveal_delay(Duration::from_millis(millis));
        }
        if let Some(prompt) = lookup(SYSTEM_PROMPT_VAR) {
            chat = chat.with_system_prompt(prompt);
        }
        if let Some(reply) = lookup(FALLBACK_REPLY_VAR) {
            chat = chat.with_fallback_reply(reply);
        }

        Ok(Self {
            reply_mode,
            chat: chat.build(),
        })
    }

    /// Creates a chat builder from this configuration.
    #[inline]
    pub fn chat_builder(&self) -> ChatBuilder {
        self.reply_mode.chat_builder().with_config(self.chat.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chatllm_core::config::{DEFAULT_REVEAL_DELAY, DEFAULT_SYSTEM_PROMPT};

    use super::*;

    fn lookup(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EnvConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.reply_mode, ReplyMode::Echo);
        assert_eq!(config.chat.reveal_delay(), DEFAULT_REVEAL_DELAY);
        assert_eq!(config.chat.system_prompt(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_overrides() {
        let config = EnvConfig::from_lookup(lookup(&[
            ("CHATLLM_REPLY", " Mock "),
            ("CHATLLM_REVEAL_DELAY_MS", "50"),
            ("CHATLLM_FALLBACK_REPLY", "offline"),
        ]))
        .unwrap();
        assert_eq!(config.reply_mode, ReplyMode::Mock);
        assert_eq!(config.chat.reveal_delay(), Duration::from_millis(50));
        assert_eq!(config.chat.fallback_reply(), "offline");
    }

    #[test]
    fn test_invalid_values() {
        let err = EnvConfig::from_lookup(lookup(&[("CHATLLM_REPLY", "gpt")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "CHATLLM_REPLY",
                value: "gpt".to_owned(),
            }
        );

        let err = EnvConfig::from_lookup(lookup(&[(
            "CHATLLM_REVEAL_DELAY_MS",
            "fast",
        )]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for CHATLLM_REVEAL_DELAY_MS: \"fast\""
        );
    }
}
