//! Sigil script engine.
//!
//! - [`lexer`]: tokenizer, comment stripper, quote helpers
//! - [`expand`]: alias and `$var` expansion
//! - [`stmt`]: line classification, labels, block ranges
//! - [`cond`]: `if` conditions
//! - [`interp`]: the frame-stack interpreter
//!
//! # Quick start
//!
//! ```no_run
//! use sigil::config::Settings;
//! use sigil::console::Console;
//! use sigil::script::Interpreter;
//! use sigil::session::Session;
//!
//! let session = Session::new(Settings::default()).unwrap();
//! let mut interp = Interpreter::new(session, Console::captured());
//! interp.run_script("let x = 6\nrpt 2 say $x");
//! assert_eq!(interp.console().lines(), ["6", "6"]);
//! ```

pub mod cond;
pub mod expand;
pub mod interp;
pub mod lexer;
pub mod stmt;
pub mod value;

pub use interp::{Interpreter, Outcome};
pub use stmt::ScriptBuffer;
pub use value::Value;
