//! Raw input decoding
//!
//! Byte-level helpers used by the driver before and after the response
//! parser: UTF-8 decoding of tty reads, and decoding of SGR mouse reports
//! once the parser has pulled them out of the stream.

mod mouse;
mod utf8;

pub use mouse::{Modifiers, MouseButton, MouseEventType, MouseReport};
pub use utf8::{Utf8Decoder, Utf8Result, REPLACEMENT_CHAR};
