//! certsh: a scripted certification harness for hardware-driver protocols.
//!
//! The library holds the command interpreter ([`script`]), the JSON
//! parser and query engine ([`json`]), and the state shared with background
//! event sources ([`events`]).  The `certsh` binary wires these to a console,
//! a configuration file and the loopback [`driver`].

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod json;
pub mod pattern;
pub mod script;
