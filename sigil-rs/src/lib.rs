//! Sigil: a line-oriented script shell.
//!
//! The binary in `main.rs` is a thin wrapper; everything it drives lives here
//! so integration tests and benches can use the same interpreter.

pub mod cli;
pub mod command;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod journal;
pub mod macros;
pub mod process;
pub mod profile;
pub mod repl;
pub mod script;
pub mod session;
pub mod var;
