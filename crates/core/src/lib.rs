//! Core logic of a chat screen: transcript, draft, reply reveal, and the
//! controller that drives them.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod chat;
pub mod config;
mod draft;
mod reply_client;
pub mod reveal;
mod session;
pub mod transcript;

pub use chat::{Chat, ChatBuilder, ChatSnapshot};
pub use config::{ChatConfig, ChatConfigBuilder};
pub use draft::Draft;
pub use reply_client::ReplyClient;
pub use session::{ChatSession, RevealProgress, SendOutcome, TurnPhase};
pub use transcript::{Content, Entry, ImageRef, Origin, Transcript};
