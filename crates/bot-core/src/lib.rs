//! Core bot logic: scripted zone navigation, the whisper reply bridge, and
//! the session/reconnect supervisor.
//!
//! Everything network-facing sits behind traits (`GameClient`, `Connector`,
//! `ReplyEngine`) so the navigation and chat logic can run against injected
//! fakes in tests. The runner crate provides the real implementations.

pub mod chat;
pub mod client;
pub mod config;
pub mod nav;
pub mod reply;
pub mod session;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testutil;
