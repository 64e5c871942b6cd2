//! Expected-response registry
//!
//! Callers that are about to write a query to the terminal register the
//! terminator of the reply they expect. One-shot registrations fire once
//! and are removed; persistent ones (mouse reports) stay until stopped.
//! Every abandoned query leaves a "late" entry behind so its belated reply
//! is swallowed instead of leaking into user input. Late entries are
//! counted, since several queries may share a terminator.

use std::collections::HashMap;
use std::fmt;

/// Callback for a one-shot expectation
pub type OnceCallback = Box<dyn FnOnce(&str)>;

/// Callback for a persistent expectation
pub type PersistentCallback = Box<dyn FnMut(&str)>;

/// Handler offered terminated sequences nobody registered for.
/// Returns `true` to swallow the sequence.
pub type UnexpectedHandler = Box<dyn FnMut(&str) -> bool>;

/// What the registry decided to do with a terminated sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A registered callback received the response
    Delivered,
    /// Swallowed as a late reply or claimed by the unexpected handler
    Swallowed,
    /// Nobody wanted it
    Unclaimed,
}

/// Terminator-keyed callbacks
#[derive(Default)]
pub struct ExpectationRegistry {
    once: HashMap<char, OnceCallback>,
    persistent: HashMap<char, PersistentCallback>,
    /// Belated replies still to swallow, by terminator
    late: HashMap<char, usize>,
    unexpected: Option<UnexpectedHandler>,
}

impl ExpectationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a one-shot callback. Replaces any earlier one-shot
    /// registration for the same terminator and forgets its late entries.
    pub fn expect_once(&mut self, terminator: char, callback: OnceCallback) {
        self.late.remove(&terminator);
        if self.once.insert(terminator, callback).is_some() {
            tracing::debug!(?terminator, "replaced pending one-shot expectation");
        }
    }

    /// Register a persistent callback. Replaces any earlier persistent
    /// registration for the same terminator.
    pub fn expect_persistent(&mut self, terminator: char, callback: PersistentCallback) {
        if self.persistent.insert(terminator, callback).is_some() {
            tracing::debug!(?terminator, "replaced persistent expectation");
        }
    }

    /// Stop waiting for `terminator`.
    ///
    /// Removing a pending one-shot registration adds a late entry: one more
    /// reply with that terminator is dropped.
    pub fn stop(&mut self, terminator: char, persistent: bool) {
        if persistent {
            self.persistent.remove(&terminator);
        } else if self.once.remove(&terminator).is_some() {
            self.mark_late(terminator);
        }
    }

    /// Add a late entry for `terminator` without touching registrations
    pub fn mark_late(&mut self, terminator: char) {
        *self.late.entry(terminator).or_insert(0) += 1;
    }

    /// Is any callback registered for `terminator`?
    pub fn is_expecting(&self, terminator: char) -> bool {
        self.once.contains_key(&terminator) || self.persistent.contains_key(&terminator)
    }

    /// Is a late reply with `terminator` still outstanding?
    pub fn is_late(&self, terminator: char) -> bool {
        self.late.contains_key(&terminator)
    }

    /// Number of late replies with `terminator` still to swallow
    pub fn late_count(&self, terminator: char) -> usize {
        self.late.get(&terminator).copied().unwrap_or(0)
    }

    pub fn set_unexpected_handler(&mut self, handler: Option<UnexpectedHandler>) {
        self.unexpected = handler;
    }

    /// Route a complete response ending in `terminator`.
    ///
    /// Precedence: one-shot, persistent, late marker, unexpected handler.
    pub fn dispatch(&mut self, terminator: char, response: &str) -> Dispatch {
        if let Some(callback) = self.once.remove(&terminator) {
            callback(response);
            return Dispatch::Delivered;
        }
        if let Some(callback) = self.persistent.get_mut(&terminator) {
            callback(response);
            return Dispatch::Delivered;
        }
        if let Some(count) = self.late.get_mut(&terminator) {
            *count -= 1;
            if *count == 0 {
                self.late.remove(&terminator);
            }
            tracing::debug!(?response, "dropping late response");
            return Dispatch::Swallowed;
        }
        if let Some(handler) = self.unexpected.as_mut() {
            if handler(response) {
                return Dispatch::Swallowed;
            }
        }
        Dispatch::Unclaimed
    }

    fn sorted(keys: impl Iterator<Item = char>) -> Vec<char> {
        let mut keys: Vec<char> = keys.collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for ExpectationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpectationRegistry")
            .field("once", &Self::sorted(self.once.keys().copied()))
            .field("persistent", &Self::sorted(self.persistent.keys().copied()))
            .field("late", &Self::sorted(self.late.keys().copied()))
            .field("unexpected_handler", &self.unexpected.is_some())
            .finish()
    }
}
