//! An abstraction layer for reply providers.
//!
//! This crate establishes a unified protocol for the chat core to ask for
//! an assistant reply, so that the reply can come from an echo, a canned
//! mock, or a native text-generation library without modifying the core
//! codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;

pub use error::*;
pub use provider::*;
pub use request::*;
