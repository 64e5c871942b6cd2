//! Terminal response parser
//!
//! A stateful filter that pulls terminal replies out of the keyboard input
//! stream and passes everything else through untouched.

mod batch;
mod grammar;
mod held;
mod registry;
mod state;

pub use grammar::{
    is_intermediate_byte, is_known_terminator, is_parameter_byte, is_sequence_body,
    ResponseKind, CSI_BRACKET, ESC,
};
pub use held::{HeldBuffer, InputUnit};
pub use registry::{Dispatch, ExpectationRegistry};
pub use state::{AnsiResponseParser, ParserState};
