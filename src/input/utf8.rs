//! Streaming UTF-8 decoding for raw terminal input
//!
//! Reads from a tty deliver bytes, not characters, and a multi-byte
//! character may be split across two reads. The decoder keeps its partial
//! state between calls.

/// UTF-8 decoder state
#[derive(Debug, Clone, Default)]
pub struct Utf8Decoder {
    /// Bytes accumulated for current character
    buffer: [u8; 4],
    /// Number of bytes in buffer
    len: usize,
    /// Expected total bytes for current character
    expected: usize,
}

/// Result of feeding a byte to the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Result {
    /// Need more bytes
    Pending,
    /// Successfully decoded a character
    Char(char),
    /// Invalid sequence; callers substitute [`REPLACEMENT_CHAR`]
    Invalid,
}

pub const REPLACEMENT_CHAR: char = '\u{FFFD}';

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.len = 0;
        self.expected = 0;
    }

    /// Check if decoder is in the middle of a sequence
    pub fn is_pending(&self) -> bool {
        self.len > 0
    }

    /// Feed a byte to the decoder
    pub fn feed(&mut self, byte: u8) -> Utf8Result {
        if self.len == 0 {
            return self.start(byte);
        }

        if !is_continuation(byte) {
            self.reset();
            return Utf8Result::Invalid;
        }

        self.buffer[self.len] = byte;
        self.len += 1;
        if self.len < self.expected {
            return Utf8Result::Pending;
        }

        let result = self.finish();
        self.reset();
        result
    }

    /// Decode a chunk, calling `emit` with each character and the offset of
    /// the byte that completed it.
    ///
    /// A byte that interrupts a multi-byte sequence produces a replacement
    /// character for the broken sequence and is then decoded on its own, so
    /// an ESC is never swallowed by a truncated character.
    pub fn decode<F>(&mut self, bytes: &[u8], mut emit: F)
    where
        F: FnMut(usize, char),
    {
        for (offset, &byte) in bytes.iter().enumerate() {
            if self.is_pending() && !is_continuation(byte) {
                self.reset();
                emit(offset, REPLACEMENT_CHAR);
            }
            match self.feed(byte) {
                Utf8Result::Pending => {},
                Utf8Result::Char(c) => emit(offset, c),
                Utf8Result::Invalid => emit(offset, REPLACEMENT_CHAR),
            }
        }
    }

    fn start(&mut self, byte: u8) -> Utf8Result {
        let expected = match byte {
            0x00..=0x7F => return Utf8Result::Char(byte as char),
            _ if byte & 0b1110_0000 == 0b1100_0000 => 2,
            _ if byte & 0b1111_0000 == 0b1110_0000 => 3,
            _ if byte & 0b1111_1000 == 0b1111_0000 => 4,
            _ => return Utf8Result::Invalid,
        };
        self.buffer[0] = byte;
        self.len = 1;
        self.expected = expected;
        Utf8Result::Pending
    }

    /// Decode a complete buffer, rejecting overlong forms and surrogates
    fn finish(&self) -> Utf8Result {
        let b = &self.buffer;
        let (cp, min) = match self.expected {
            2 => ((u32::from(b[0] & 0x1F) << 6) | u32::from(b[1] & 0x3F), 0x80),
            3 => (
                (u32::from(b[0] & 0x0F) << 12)
                    | (u32::from(b[1] & 0x3F) << 6)
                    | u32::from(b[2] & 0x3F),
                0x800,
            ),
            4 => (
                (u32::from(b[0] & 0x07) << 18)
                    | (u32::from(b[1] & 0x3F) << 12)
                    | (u32::from(b[2] & 0x3F) << 6)
                    | u32::from(b[3] & 0x3F),
                0x10000,
            ),
            _ => return Utf8Result::Invalid,
        };

        if cp < min {
            return Utf8Result::Invalid;
        }
        // from_u32 rejects surrogates and anything above U+10FFFF
        char::from_u32(cp).map_or(Utf8Result::Invalid, Utf8Result::Char)
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}
