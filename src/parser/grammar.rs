//! Response grammar
//!
//! Byte-class knowledge about the CSI replies a terminal sends back on the
//! input stream:
//!
//! ```text
//! ESC [ <parameter bytes 0x30-0x3F>* <intermediate bytes 0x20-0x2F>* <terminator 0x40-0x7E>
//! ```
//!
//! The parser never interprets parameters. It only needs to know whether a
//! character may continue a sequence or ends one. [`ResponseKind`] names the
//! reply family of a finished sequence for logging and decoding.
//!
//! Reference: https://invisible-island.net/xterm/ctlseqs/ctlseqs.html

use serde::Serialize;

/// Escape (0x1B)
pub const ESC: char = '\x1b';

/// Second byte of a CSI introducer
pub const CSI_BRACKET: char = '[';

/// Is `c` a final byte that ends a CSI sequence?
///
/// Covers letters (`c`, `R`, `M`, `t`, ...) and the punctuation finals
/// `@`, `` ` ``, `{`, `|`, `}`, `~`. `[` is excluded since it only ever
/// introduces a sequence.
pub fn is_known_terminator(c: char) -> bool {
    matches!(c, '\x40'..='\x7e') && c != CSI_BRACKET
}

/// Parameter bytes: `0-9 : ; < = > ?`
pub fn is_parameter_byte(c: char) -> bool {
    matches!(c, '\x30'..='\x3f')
}

/// Intermediate bytes: space through `/` (e.g. `$` in DECRPM replies)
pub fn is_intermediate_byte(c: char) -> bool {
    matches!(c, '\x20'..='\x2f')
}

/// May `c` appear between the CSI introducer and the terminator?
pub fn is_sequence_body(c: char) -> bool {
    is_parameter_byte(c) || is_intermediate_byte(c)
}

/// Family of a complete CSI reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResponseKind {
    /// `ESC [ < b ; x ; y M`
    MousePress,
    /// `ESC [ < b ; x ; y m`
    MouseRelease,
    /// `ESC [ row ; col R`
    CursorPosition,
    /// `ESC [ ? attrs c`
    PrimaryDeviceAttributes,
    /// `ESC [ > type ; version ; rom c`
    SecondaryDeviceAttributes,
    /// `ESC [ 8 ; rows ; cols t`
    TextAreaSize,
    /// Anything else that is still a well-formed CSI sequence
    Other,
}

impl ResponseKind {
    /// Classify a reconstructed response string
    pub fn classify(response: &str) -> Self {
        let Some(body) = response.strip_prefix("\x1b[") else {
            return Self::Other;
        };
        let Some(terminator) = body.chars().last() else {
            return Self::Other;
        };
        let params = &body[..body.len() - terminator.len_utf8()];

        match (params.chars().next(), terminator) {
            (Some('<'), 'M') => Self::MousePress,
            (Some('<'), 'm') => Self::MouseRelease,
            (Some('?'), 'c') => Self::PrimaryDeviceAttributes,
            (Some('>'), 'c') => Self::SecondaryDeviceAttributes,
            (Some(c), 'R') if c.is_ascii_digit() => Self::CursorPosition,
            (Some('8'), 't') if params.starts_with("8;") => Self::TextAreaSize,
            _ => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminators() {
        for c in ['c', 'M', 'm', 'R', 't', 'A', '~', '@', '`'] {
            assert!(is_known_terminator(c), "{c:?} should terminate");
        }
        for c in ['[', '0', ';', '<', '?', ' ', '$', '\x1b', 'é'] {
            assert!(!is_known_terminator(c), "{c:?} should not terminate");
        }
    }

    #[test]
    fn test_body_bytes() {
        for c in "0123456789;<>?=:".chars() {
            assert!(is_parameter_byte(c));
            assert!(is_sequence_body(c));
        }
        assert!(is_intermediate_byte('$'));
        assert!(is_sequence_body(' '));
        assert!(!is_sequence_body('a'));
        assert!(!is_sequence_body('\x1b'));
    }

    #[test]
    fn test_classify() {
        assert_eq!(ResponseKind::classify("\x1b[<0;10;5M"), ResponseKind::MousePress);
        assert_eq!(ResponseKind::classify("\x1b[<0;10;5m"), ResponseKind::MouseRelease);
        assert_eq!(ResponseKind::classify("\x1b[12;40R"), ResponseKind::CursorPosition);
        assert_eq!(
            ResponseKind::classify("\x1b[?1;2c"),
            ResponseKind::PrimaryDeviceAttributes
        );
        assert_eq!(
            ResponseKind::classify("\x1b[>41;380;0c"),
            ResponseKind::SecondaryDeviceAttributes
        );
        assert_eq!(ResponseKind::classify("\x1b[8;24;80t"), ResponseKind::TextAreaSize);
        assert_eq!(ResponseKind::classify("\x1b[A"), ResponseKind::Other);
        assert_eq!(ResponseKind::classify("plain"), ResponseKind::Other);
        assert_eq!(ResponseKind::classify("\x1b["), ResponseKind::Other);
    }
}
