//! Parley is a full-screen terminal chat client gated behind a single
//! local account.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`config`] loads the immutable `key=value` startup configuration.
//! - [`auth`] owns the credential record and every comparison against it.
//! - [`api`] speaks the chat-completion wire format and carries one
//!   request per submitted message.
//! - [`app`] is the state machine behind the register/login/chat views;
//!   [`commands`] interprets chat-view input before it becomes a message.
//! - [`ui`] renders the visible view; [`scroll`] lays the transcript out
//!   into wrapped display lines; [`message`] models transcript entries.
//! - [`logging`] installs the tracing subscriber.
//!
//! The binary crate (`src/main.rs`) wires these together in a crossterm
//! event loop and dispatches chat sends onto background tasks.

pub mod api;
pub mod app;
pub mod auth;
pub mod commands;
pub mod config;
pub mod logging;
pub mod message;
pub mod scroll;
pub mod ui;
