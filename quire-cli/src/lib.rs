//! Library side of the quire command-line tool.
//!
//! The binary in `main.rs` only parses arguments, loads configuration and prints;
//! the document work it drives lives here so it can be tested without spawning
//! processes.

pub mod script;
pub mod transforms;
