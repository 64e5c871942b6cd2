//! Response Parser State Machine
//!
//! Separates terminal replies (cursor position reports, device attributes,
//! mouse reports) from user keystrokes arriving on the same input stream.
//! Input is consumed one [`InputUnit`] at a time, so every way of chunking
//! the stream produces the same output.
//!
//! # State Machine
//!
//! ```text
//!            ESC                    [
//! Normal ─────────► ExpectingBracket ─────► InResponse ──┐ params / intermediates
//!   ▲                    │                     │  ▲──────┘
//!   │   anything else:   │                     │
//!   └── release + replay ┘                     │ terminator:
//!   └──────────────────────────────────────────┘  dispatch or release
//! ```
//!
//! States:
//! - Normal: every unit passes straight through
//! - ExpectingBracket: an ESC is held, waiting for `[`
//! - InResponse: a CSI sequence is held, waiting for its terminator
//!
//! The parser never measures time. It records when it left `Normal` so the
//! owner of the input loop can call [`AnsiResponseParser::release`] once a
//! held sequence has been ambiguous for too long.

use std::fmt;
use std::time::Instant;

use super::grammar::{is_known_terminator, is_sequence_body, CSI_BRACKET, ESC};
use super::held::{HeldBuffer, InputUnit};
use super::registry::{Dispatch, ExpectationRegistry, UnexpectedHandler};

/// Longest sequence held before it is given up as a reply
const MAX_HELD: usize = 64;

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserState {
    /// No escape sequence in progress
    Normal,
    /// After ESC, waiting for `[`
    ExpectingBracket,
    /// After ESC [, collecting a response
    InResponse,
}

/// Streaming response parser, generic over the caller's tag type
///
/// Use `AnsiResponseParser<()>` when no correlation tag is needed; it gains
/// string-in, string-out helpers (see the batch adapter).
pub struct AnsiResponseParser<T> {
    state: ParserState,
    /// When the current non-`Normal` state was entered
    state_changed_at: Option<Instant>,
    held: HeldBuffer<T>,
    registry: ExpectationRegistry,
}

impl<T> Default for AnsiResponseParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AnsiResponseParser<T> {
    /// Create a new parser in the normal state
    pub fn new() -> Self {
        Self {
            state: ParserState::Normal,
            state_changed_at: None,
            held: HeldBuffer::new(),
            registry: ExpectationRegistry::new(),
        }
    }

    /// Get current parser state
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// When the parser last moved into a non-`Normal` state.
    /// `None` while in `Normal`.
    pub fn state_changed_at(&self) -> Option<Instant> {
        self.state_changed_at
    }

    /// Units currently held, in arrival order
    pub fn held(&self) -> &[InputUnit<T>] {
        self.held.units()
    }

    /// Held characters as a string
    pub fn held_string(&self) -> String {
        self.held.to_text()
    }

    /// Expect a single reply ending in `terminator`.
    ///
    /// The callback runs synchronously inside the `process_*` call that sees
    /// the terminator, then the registration is removed. A later call for
    /// the same terminator replaces an earlier one that has not fired yet.
    pub fn expect_response<F>(&mut self, terminator: char, callback: F)
    where
        F: FnOnce(&str) + 'static,
    {
        self.registry.expect_once(terminator, Box::new(callback));
    }

    /// Expect any number of replies ending in `terminator`
    pub fn expect_response_persistent<F>(&mut self, terminator: char, callback: F)
    where
        F: FnMut(&str) + 'static,
    {
        self.registry.expect_persistent(terminator, Box::new(callback));
    }

    /// Stop expecting replies ending in `terminator`.
    ///
    /// Stopping a one-shot expectation that has not fired yet means its
    /// reply is treated as late: it is dropped when it arrives.
    pub fn stop_expecting(&mut self, terminator: char, persistent: bool) {
        self.registry.stop(terminator, persistent);
    }

    /// Is a callback registered for `terminator`?
    pub fn is_expecting(&self, terminator: char) -> bool {
        self.registry.is_expecting(terminator)
    }

    /// Drop one more reply ending in `terminator` when it arrives
    pub fn mark_late(&mut self, terminator: char) {
        self.registry.mark_late(terminator);
    }

    /// Is a late reply ending in `terminator` still due?
    pub fn is_late(&self, terminator: char) -> bool {
        self.registry.is_late(terminator)
    }

    /// Install (or clear) the handler offered terminated sequences that no
    /// callback was registered for. It returns `true` to swallow the
    /// sequence; otherwise the sequence passes through.
    pub fn set_unexpected_response_handler<F>(&mut self, handler: Option<F>)
    where
        F: FnMut(&str) -> bool + 'static,
    {
        self.registry
            .set_unexpected_handler(handler.map(|h| Box::new(h) as UnexpectedHandler));
    }

    /// Process one unit, returning whatever becomes passthrough
    pub fn process_unit(&mut self, unit: InputUnit<T>) -> Vec<InputUnit<T>> {
        let mut output = Vec::new();
        self.advance(unit, &mut |unit| output.push(unit));
        output
    }

    /// Release everything currently held as passthrough
    pub fn release(&mut self) -> Vec<InputUnit<T>> {
        let mut output = Vec::new();
        self.release_into(&mut |unit| output.push(unit));
        output
    }

    /// Advance the parser by one unit, emitting passthrough to `emit`
    pub(crate) fn advance<F>(&mut self, unit: InputUnit<T>, emit: &mut F)
    where
        F: FnMut(InputUnit<T>),
    {
        match self.state {
            ParserState::Normal => self.process_normal(unit, emit),
            ParserState::ExpectingBracket => self.process_expecting_bracket(unit, emit),
            ParserState::InResponse => self.process_in_response(unit, emit),
        }
    }

    /// Flush the held buffer to `emit` and return to `Normal`
    pub(crate) fn release_into<F>(&mut self, emit: &mut F)
    where
        F: FnMut(InputUnit<T>),
    {
        if self.state == ParserState::Normal {
            return;
        }
        tracing::debug!(held = ?self.held.to_text(), "releasing held sequence");
        for unit in self.held.drain() {
            emit(unit);
        }
        self.reset();
    }

    fn process_normal<F>(&mut self, unit: InputUnit<T>, emit: &mut F)
    where
        F: FnMut(InputUnit<T>),
    {
        if unit.ch == ESC {
            self.held.push(unit);
            self.enter(ParserState::ExpectingBracket);
        } else {
            emit(unit);
        }
    }

    fn process_expecting_bracket<F>(&mut self, unit: InputUnit<T>, emit: &mut F)
    where
        F: FnMut(InputUnit<T>),
    {
        if unit.ch == CSI_BRACKET {
            self.held.push(unit);
            self.enter(ParserState::InResponse);
        } else {
            self.release_and_replay(unit, emit);
        }
    }

    fn process_in_response<F>(&mut self, unit: InputUnit<T>, emit: &mut F)
    where
        F: FnMut(InputUnit<T>),
    {
        let ch = unit.ch;
        if is_sequence_body(ch) {
            if self.held.len() >= MAX_HELD {
                tracing::debug!(len = self.held.len(), "held sequence too long");
                self.release_and_replay(unit, emit);
            } else {
                self.held.push(unit);
            }
        } else if is_known_terminator(ch) {
            self.held.push(unit);
            self.terminate(ch, emit);
        } else {
            // Control character or non-ASCII text: cannot be a reply
            self.release_and_replay(unit, emit);
        }
    }

    /// A terminator arrived: hand the sequence to whoever expects it, or
    /// let it pass through untouched.
    fn terminate<F>(&mut self, terminator: char, emit: &mut F)
    where
        F: FnMut(InputUnit<T>),
    {
        let response = self.held.to_text();
        match self.registry.dispatch(terminator, &response) {
            Dispatch::Delivered => {
                tracing::debug!(?response, "dispatched response");
                self.held.clear();
                self.reset();
            },
            Dispatch::Swallowed => {
                self.held.clear();
                self.reset();
            },
            Dispatch::Unclaimed => {
                tracing::trace!(?response, "no expectation, passing through");
                self.release_into(emit);
            },
        }
    }

    /// Release what was held before `unit`, then run `unit` from `Normal`
    fn release_and_replay<F>(&mut self, unit: InputUnit<T>, emit: &mut F)
    where
        F: FnMut(InputUnit<T>),
    {
        self.release_into(emit);
        self.process_normal(unit, emit);
    }

    fn enter(&mut self, state: ParserState) {
        tracing::trace!(from = ?self.state, to = ?state, "state change");
        self.state = state;
        self.state_changed_at = Some(Instant::now());
    }

    fn reset(&mut self) {
        debug_assert!(self.held.is_empty());
        self.state = ParserState::Normal;
        self.state_changed_at = None;
    }
}

impl<T> fmt::Debug for AnsiResponseParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnsiResponseParser")
            .field("state", &self.state)
            .field("state_changed_at", &self.state_changed_at)
            .field("held", &self.held)
            .field("registry", &self.registry)
            .finish()
    }
}
