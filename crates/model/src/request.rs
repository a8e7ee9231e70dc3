use serde::{Deserialize, Serialize};

/// A request to be sent to the reply provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplyRequest {
    /// The conversation so far, oldest first. The last user message is
    /// the one to reply to.
    pub messages: Vec<PromptMessage>,
}

impl ReplyRequest {
    /// Returns the text of the most recent user message, if any.
    pub fn latest_user_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|msg| match msg {
            PromptMessage::User(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Returns the system instructions, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages.iter().find_map(|msg| match msg {
            PromptMessage::System(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

/// A complete text message of the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "snake_case")]
pub enum PromptMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
}
