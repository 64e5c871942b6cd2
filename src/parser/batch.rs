//! Batch adapter
//!
//! Convenience entry points for callers that work a read buffer at a time.
//! Each is a plain fold over [`AnsiResponseParser::advance`], so the per-unit
//! state machine stays the single source of truth and chunking never
//! changes the result.

use super::held::InputUnit;
use super::state::AnsiResponseParser;

impl<T> AnsiResponseParser<T> {
    /// Process a batch of tagged units, collecting passthrough in order
    pub fn process_batch<I>(&mut self, batch: I) -> Vec<InputUnit<T>>
    where
        I: IntoIterator<Item = InputUnit<T>>,
    {
        let mut output = Vec::new();
        self.process_batch_with(batch, |unit| output.push(unit));
        output
    }

    /// Process a batch, calling `emit` for each passthrough unit
    pub fn process_batch_with<I, F>(&mut self, batch: I, mut emit: F)
    where
        I: IntoIterator<Item = InputUnit<T>>,
        F: FnMut(InputUnit<T>),
    {
        for unit in batch {
            self.advance(unit, &mut emit);
        }
    }
}

impl AnsiResponseParser<()> {
    /// Process a string, returning the passthrough text
    pub fn process_str(&mut self, input: &str) -> String {
        let mut output = String::with_capacity(input.len());
        self.process_batch_with(input.chars().map(InputUnit::plain), |unit| {
            output.push(unit.ch)
        });
        output
    }

    /// Release held input as a string
    pub fn release_string(&mut self) -> String {
        let mut output = String::new();
        self.release_into(&mut |unit: InputUnit<()>| output.push(unit.ch));
        output
    }
}
