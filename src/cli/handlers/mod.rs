//! CLI command handlers
//!
//! - chat: process a profile, then answer questions
//! - selftest: end-to-end check against the mock profile
//! - serve: web form server
//! - info: configuration display and diagnostics

pub mod chat;
pub mod info;
pub mod selftest;
pub mod serve;

pub use chat::*;
pub use info::*;
pub use selftest::*;
pub use serve::*;
