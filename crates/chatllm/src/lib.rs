//! An out-of-the-box chat that assembles the reply providers and the chat
//! core.
//!
//! The crate includes a CLI tool for chatting in the terminal. And you can
//! also use it as a library, or through its C API, to bring the chat screen
//! logic into your own host apps.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

mod env;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod providers;

pub use env::{ConfigError, EnvConfig, ReplyMode};

/// Re-exports of [`chatllm_core`] crate.
pub mod core {
    pub use chatllm_core::*;
}
