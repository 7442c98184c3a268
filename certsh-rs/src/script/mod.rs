//! Command scripting.
//!
//! A script is a list of command lines.  Each line is tokenized, its
//! `${source:argument}` placeholders are expanded, and the first token picks
//! a verb handler.  Handlers steer execution through labels (`:name` lines),
//! `goto`, `call`/`return` and `run`.
//!
//! # Quick start
//!
//! ```rust
//! use certsh::script::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! interp.run_source("demo", "setlocal x 6\ncall twice ${get:x}\necho ${ret:}\nexit\n:twice\nreturn ${arg:1}${arg:1}", vec![]);
//! assert_eq!(interp.rt.output, vec!["66"]);
//! ```

pub mod builtins;
pub mod cond;
pub mod dispatch;
pub mod expand;
pub mod frame;
pub mod interp;
pub mod resolve;
pub mod runtime;
pub mod tokenize;
pub mod vars;

// Re-exports for convenience.
pub use dispatch::{CommandContext, Dispatcher, Flow, Handler};
pub use frame::{CallStack, Frame, Script};
pub use interp::Interpreter;
pub use runtime::{Console, Runtime, ScriptLoader, Tally};
pub use tokenize::{join_tokens, quote_token, tokenize};
pub use vars::{Scope, VarEntry, VarTable};
