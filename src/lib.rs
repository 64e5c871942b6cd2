//! ANSI response parsing for terminal input
//!
//! Terminals answer queries (cursor position, device attributes, window
//! size) and report mouse events on the same stream that carries the user's
//! keystrokes, with nothing framing one from the other. This crate pulls
//! those replies out of the input stream and hands everything else back
//! untouched, in order, whatever size the reads happen to be.
//!
//! - `parser`: the response state machine, expectation registry, batch adapter
//! - `response`: typed decoding of reply strings
//! - `input`: UTF-8 decoding of raw reads, SGR mouse reports
//! - `driver`: the glue a console driver uses (reads in, user input out)
//! - `app`: configuration and logging setup

pub mod app;
pub mod driver;
pub mod input;
pub mod parser;
pub mod response;

pub use driver::{InputDriver, Query, ReadTag, TerminalModel};
pub use parser::{AnsiResponseParser, InputUnit, ParserState};
