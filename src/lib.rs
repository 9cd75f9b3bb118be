//! Chatelet is a terminal chat client for a remote chat worker fronted by an
//! AI gateway, displaying which model and provider served each reply.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns session state: the transcript, the gateway metadata
//!   tracker, the input gate, and the single-request orchestration that ties
//!   them together.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop that drives user input and display updates.
//! - [`api`] defines the wire payloads exchanged with the chat worker and the
//!   gateway response headers.
//! - [`auth`] consumes the ambient access credential, when one is present.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
