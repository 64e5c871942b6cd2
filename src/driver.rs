//! Input Driver
//!
//! Ties together UTF-8 decoding, the response parser and a small model of
//! what the terminal has told us about itself. This is the integration
//! point between raw tty reads and the rest of an application:
//!
//! - [`InputDriver::feed`] takes the bytes of one read and returns the
//!   characters that are genuine user input, tagged with where they came from
//! - [`InputDriver::request`] registers interest in a reply and returns the
//!   query to write to the terminal
//! - [`InputDriver::poll_timeout`] is called from the main loop's idle timer
//!   to release an ESC (or partial sequence) nobody completed
//!
//! Replies are decoded inside the parser's callbacks and folded into a
//! [`TerminalModel`]. Everything runs on the input thread; the model is
//! shared with the callbacks through `Rc<RefCell<_>>`.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::app::Config;
use crate::input::{MouseReport, Utf8Decoder};
use crate::parser::{AnsiResponseParser, InputUnit, ParserState};
use crate::response::{
    CursorPosition, DeviceAttributes, Response, SecondaryDeviceAttributes, TextAreaSize,
};

/// Turns on any-event mouse tracking with SGR encoding
pub const ENABLE_MOUSE: &str = "\x1b[?1003h\x1b[?1006h";

/// Turns mouse tracking back off
pub const DISABLE_MOUSE: &str = "\x1b[?1006l\x1b[?1003l";

/// Origin of a character: which read it arrived in and at what byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ReadTag {
    /// Index of the `feed` call, starting at 0
    pub batch: u64,
    /// Offset of the byte that completed the character within that read
    pub offset: usize,
}

/// Queries the driver knows how to send and decode replies for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    /// Primary device attributes (DA1)
    DeviceAttributes,
    /// Secondary device attributes (DA2)
    SecondaryDeviceAttributes,
    /// Cursor position report (DSR 6)
    CursorPosition,
    /// Text area size in characters (XTWINOPS 18)
    TextAreaSize,
}

impl Query {
    /// Bytes to write to the terminal
    pub fn sequence(self) -> &'static str {
        match self {
            Query::DeviceAttributes => "\x1b[c",
            Query::SecondaryDeviceAttributes => "\x1b[>c",
            Query::CursorPosition => "\x1b[6n",
            Query::TextAreaSize => "\x1b[18t",
        }
    }

    /// Final character of the reply
    pub fn terminator(self) -> char {
        match self {
            Query::DeviceAttributes | Query::SecondaryDeviceAttributes => 'c',
            Query::CursorPosition => 'R',
            Query::TextAreaSize => 't',
        }
    }
}

/// What the terminal has reported about itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TerminalModel {
    pub size: Option<TextAreaSize>,
    pub cursor: Option<CursorPosition>,
    pub device_attributes: Option<DeviceAttributes>,
    pub terminal: Option<SecondaryDeviceAttributes>,
    /// Replies that arrived but could not be decoded
    pub rejected_replies: usize,
}

impl TerminalModel {
    fn apply(&mut self, response: &Response) {
        match response {
            Response::CursorPosition(pos) => self.cursor = Some(*pos),
            Response::DeviceAttributes(da) => self.device_attributes = Some(da.clone()),
            Response::SecondaryDeviceAttributes(da2) => self.terminal = Some(*da2),
            Response::TextAreaSize(size) => self.size = Some(*size),
            Response::Mouse(_) => {},
        }
    }
}

/// State shared between the driver and its reply callbacks
#[derive(Debug, Default)]
struct Shared {
    model: TerminalModel,
    /// Queries written but not yet answered, by reply terminator
    outstanding: HashMap<char, usize>,
    mouse_events: VecDeque<MouseReport>,
}

impl Shared {
    fn on_reply(&mut self, terminator: char, response: &str) {
        if let Some(count) = self.outstanding.get_mut(&terminator) {
            *count = count.saturating_sub(1);
        }
        match Response::decode(response) {
            Ok(Response::Mouse(report)) => self.mouse_events.push_back(report),
            Ok(reply) => {
                tracing::debug!(?reply, "terminal reply");
                self.model.apply(&reply);
            },
            Err(e) => {
                tracing::warn!(error = %e, "undecodable terminal reply");
                self.model.rejected_replies += 1;
            },
        }
    }

    fn on_mouse(&mut self, response: &str) {
        match MouseReport::decode_sgr(response) {
            Ok(report) => self.mouse_events.push_back(report),
            Err(e) => tracing::warn!(error = %e, "undecodable mouse report"),
        }
    }
}

/// Console input driver
#[derive(Debug)]
pub struct InputDriver {
    parser: AnsiResponseParser<ReadTag>,
    utf8: Utf8Decoder,
    shared: Rc<RefCell<Shared>>,
    escape_timeout: Duration,
    mouse: bool,
    next_batch: u64,
}

impl InputDriver {
    /// Create a driver from configuration
    pub fn new(config: &Config) -> Self {
        let mut driver = Self {
            parser: AnsiResponseParser::new(),
            utf8: Utf8Decoder::new(),
            shared: Rc::new(RefCell::new(Shared::default())),
            escape_timeout: config.escape_timeout(),
            mouse: config.mouse.enabled,
            next_batch: 0,
        };
        if driver.mouse {
            driver.watch_mouse();
        }
        driver
    }

    /// Feed the bytes of one read, returning user input in order
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<InputUnit<ReadTag>> {
        let batch = self.next_batch;
        self.next_batch += 1;

        let mut units = Vec::with_capacity(bytes.len());
        self.utf8.decode(bytes, |offset, ch| {
            units.push(InputUnit::new(ch, ReadTag { batch, offset }))
        });

        let mut output = Vec::with_capacity(units.len());
        for unit in units {
            let in_response = self.parser.state() == ParserState::InResponse;
            self.parser.advance(unit, &mut |u| output.push(u));
            // a sequence just ended: a one-shot may have fired or a late
            // reply been swallowed
            if in_response && self.parser.state() == ParserState::Normal {
                self.rearm();
            }
        }
        output
    }

    /// Register interest in the reply to `query` and return the bytes to
    /// write. Several queries sharing a terminator are answered in order.
    pub fn request(&mut self, query: Query) -> &'static str {
        let terminator = query.terminator();
        *self
            .shared
            .borrow_mut()
            .outstanding
            .entry(terminator)
            .or_insert(0) += 1;
        if self.can_arm(terminator) {
            self.arm(terminator);
        }
        query.sequence()
    }

    /// Give up waiting for the oldest reply to `query`. The reply is still
    /// expected to arrive eventually, ahead of any later query sharing its
    /// terminator, and is dropped when it does.
    pub fn timeout(&mut self, query: Query) {
        let terminator = query.terminator();
        {
            let mut shared = self.shared.borrow_mut();
            match shared.outstanding.get_mut(&terminator) {
                Some(count) if *count > 0 => *count -= 1,
                _ => return,
            }
        }
        tracing::debug!(?query, "query timed out");

        // The armed one-shot belongs to the oldest outstanding query
        if self.parser.is_expecting(terminator) {
            self.parser.stop_expecting(terminator, false);
        } else {
            self.parser.mark_late(terminator);
        }
    }

    /// Release a held sequence that has been ambiguous for at least the
    /// configured escape timeout
    pub fn poll_timeout(&mut self, now: Instant) -> Vec<InputUnit<ReadTag>> {
        match self.parser.state_changed_at() {
            Some(since) if now.saturating_duration_since(since) >= self.escape_timeout => {
                self.parser.release()
            },
            _ => Vec::new(),
        }
    }

    /// Release whatever is held, regardless of age (end of input)
    pub fn flush(&mut self) -> Vec<InputUnit<ReadTag>> {
        self.parser.release()
    }

    /// When the currently held sequence started, if any
    pub fn pending_since(&self) -> Option<Instant> {
        self.parser.state_changed_at()
    }

    pub fn parser_state(&self) -> ParserState {
        self.parser.state()
    }

    pub fn escape_timeout(&self) -> Duration {
        self.escape_timeout
    }

    /// Snapshot of what the terminal has reported
    pub fn model(&self) -> TerminalModel {
        self.shared.borrow().model.clone()
    }

    /// Number of queries still waiting for a reply
    pub fn outstanding(&self, query: Query) -> usize {
        self.shared
            .borrow()
            .outstanding
            .get(&query.terminator())
            .copied()
            .unwrap_or(0)
    }

    /// Drain decoded mouse reports
    pub fn take_mouse_events(&mut self) -> Vec<MouseReport> {
        self.shared.borrow_mut().mouse_events.drain(..).collect()
    }

    /// Bytes that turn mouse reporting on, if enabled in the config
    pub fn enable_mouse_sequence(&self) -> Option<&'static str> {
        self.mouse.then_some(ENABLE_MOUSE)
    }

    /// Bytes that turn mouse reporting off, if enabled in the config
    pub fn disable_mouse_sequence(&self) -> Option<&'static str> {
        self.mouse.then_some(DISABLE_MOUSE)
    }

    fn arm(&mut self, terminator: char) {
        let shared = Rc::clone(&self.shared);
        self.parser.expect_response(terminator, move |response| {
            shared.borrow_mut().on_reply(terminator, response);
        });
    }

    /// Late replies arrive first, so a terminator is only armed once they
    /// have all been swallowed
    fn can_arm(&self, terminator: char) -> bool {
        !self.parser.is_expecting(terminator) && !self.parser.is_late(terminator)
    }

    /// Re-register one-shot expectations that fired while more replies
    /// with the same terminator are still due
    fn rearm(&mut self) {
        let due: Vec<char> = self
            .shared
            .borrow()
            .outstanding
            .iter()
            .filter(|&(_, &count)| count > 0)
            .map(|(&terminator, _)| terminator)
            .collect();
        for terminator in due {
            if self.can_arm(terminator) {
                self.arm(terminator);
            }
        }
    }

    fn watch_mouse(&mut self) {
        for terminator in ['M', 'm'] {
            let shared = Rc::clone(&self.shared);
            self.parser
                .expect_response_persistent(terminator, move |response| {
                    shared.borrow_mut().on_mouse(response);
                });
        }
    }
}
