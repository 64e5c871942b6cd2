//! Response decoding
//!
//! Turns the raw reply strings handed to expectation callbacks into typed
//! values. Each decoder checks the exact shape of its reply and reports
//! the offending value when something does not fit.
//!
//! Query / reply pairs:
//!
//! | Query        | Reply                         | Type                          |
//! |--------------|-------------------------------|-------------------------------|
//! | `CSI 6 n`    | `CSI row ; col R`             | [`CursorPosition`]            |
//! | `CSI c`      | `CSI ? Ps ; ... c`            | [`DeviceAttributes`]          |
//! | `CSI > c`    | `CSI > Pp ; Pv ; Pc c`        | [`SecondaryDeviceAttributes`] |
//! | `CSI 18 t`   | `CSI 8 ; rows ; cols t`       | [`TextAreaSize`]              |
//! | (unsolicited)| `CSI < b ; x ; y M` / `m`     | [`MouseReport`]               |

use serde::Serialize;

use crate::input::MouseReport;
use crate::parser::ResponseKind;

/// Error decoding a terminal reply
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    #[error("response {response:?} does not start with {expected:?}")]
    Prefix {
        response: String,
        expected: &'static str,
    },

    #[error("response {response:?} does not end with {expected:?}")]
    Terminator { response: String, expected: String },

    #[error("response {response:?} has {found} parameters, expected {expected}")]
    ParamCount {
        response: String,
        found: usize,
        expected: &'static str,
    },

    #[error("parameter {value:?} in response {response:?} is not a decimal number")]
    NotNumeric { response: String, value: String },

    #[error("response {response:?} is not a recognized terminal reply")]
    Unrecognized { response: String },

    #[error("{name} = {value} is out of range, expected {constraint}")]
    OutOfRange {
        name: &'static str,
        value: u32,
        constraint: &'static str,
    },
}

/// Result type for reply decoding
pub type ResponseResult<T> = Result<T, ResponseError>;

/// Split `ESC [ <prefix> p1 ; p2 ; ... <terminator>` into numbers
pub(crate) fn parse_params(
    response: &str,
    prefix: &'static str,
    terminators: &[char],
) -> ResponseResult<Vec<u32>> {
    let body = response
        .strip_prefix(prefix)
        .ok_or_else(|| ResponseError::Prefix {
            response: response.to_string(),
            expected: prefix,
        })?;

    let body = match body.chars().last() {
        Some(last) if terminators.contains(&last) => &body[..body.len() - last.len_utf8()],
        _ => {
            return Err(ResponseError::Terminator {
                response: response.to_string(),
                expected: terminators.iter().collect(),
            })
        },
    };

    body.split(';')
        .map(|value| {
            value.parse::<u32>().map_err(|_| ResponseError::NotNumeric {
                response: response.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// Require exactly `n` parameters
fn expect_count(
    response: &str,
    params: &[u32],
    n: usize,
    expected: &'static str,
) -> ResponseResult<()> {
    if params.len() == n {
        Ok(())
    } else {
        Err(ResponseError::ParamCount {
            response: response.to_string(),
            found: params.len(),
            expected,
        })
    }
}

/// Convert a 1-based terminal coordinate or extent to `u16`
pub(crate) fn one_based(name: &'static str, value: u32) -> ResponseResult<u16> {
    match u16::try_from(value) {
        Ok(v) if v >= 1 => Ok(v),
        _ => Err(ResponseError::OutOfRange {
            name,
            value,
            constraint: "1..=65535",
        }),
    }
}

/// Cursor position report (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CursorPosition {
    pub row: u16,
    pub col: u16,
}

impl CursorPosition {
    /// Decode `ESC [ row ; col R`
    pub fn decode(response: &str) -> ResponseResult<Self> {
        let params = parse_params(response, "\x1b[", &['R'])?;
        expect_count(response, &params, 2, "2 (row;col)")?;
        Ok(Self {
            row: one_based("row", params[0])?,
            col: one_based("col", params[1])?,
        })
    }
}

/// Primary device attributes (DA1)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceAttributes {
    /// Conformance level followed by feature codes
    pub attributes: Vec<u32>,
}

impl DeviceAttributes {
    /// Decode `ESC [ ? Ps ; ... c`
    pub fn decode(response: &str) -> ResponseResult<Self> {
        let attributes = parse_params(response, "\x1b[?", &['c'])?;
        Ok(Self { attributes })
    }

    /// Conformance level (first attribute), e.g. 62 for VT220
    pub fn conformance_level(&self) -> Option<u32> {
        self.attributes.first().copied()
    }

    /// Does the terminal advertise feature `code` (4 = sixel, 22 = color)?
    pub fn has(&self, code: u32) -> bool {
        self.attributes.iter().skip(1).any(|&a| a == code)
    }
}

/// Secondary device attributes (DA2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SecondaryDeviceAttributes {
    pub terminal_type: u32,
    pub version: u32,
    pub rom: u32,
}

impl SecondaryDeviceAttributes {
    /// Decode `ESC [ > Pp ; Pv ; Pc c`. The ROM field is optional.
    pub fn decode(response: &str) -> ResponseResult<Self> {
        let params = parse_params(response, "\x1b[>", &['c'])?;
        match params[..] {
            [terminal_type, version] => Ok(Self {
                terminal_type,
                version,
                rom: 0,
            }),
            [terminal_type, version, rom] => Ok(Self {
                terminal_type,
                version,
                rom,
            }),
            _ => Err(ResponseError::ParamCount {
                response: response.to_string(),
                found: params.len(),
                expected: "2 or 3 (type;version[;rom])",
            }),
        }
    }

    /// Human-readable name of the terminal type
    pub fn terminal_name(&self) -> &'static str {
        match self.terminal_type {
            0 => "vt100",
            1 => "vt220",
            2 => "vt240",
            41 => "xterm",
            65 => "vt520",
            77 => "mintty",
            83 => "screen",
            84 => "tmux",
            85 => "rxvt-unicode",
            _ => "unknown",
        }
    }
}

/// Text area size in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextAreaSize {
    pub rows: u16,
    pub cols: u16,
}

impl TextAreaSize {
    /// Decode `ESC [ 8 ; rows ; cols t`
    pub fn decode(response: &str) -> ResponseResult<Self> {
        let params = parse_params(response, "\x1b[", &['t'])?;
        expect_count(response, &params, 3, "3 (8;rows;cols)")?;
        if params[0] != 8 {
            return Err(ResponseError::OutOfRange {
                name: "report",
                value: params[0],
                constraint: "8 (text area size)",
            });
        }
        Ok(Self {
            rows: one_based("rows", params[1])?,
            cols: one_based("cols", params[2])?,
        })
    }
}

/// Any decodable terminal reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Response {
    CursorPosition(CursorPosition),
    DeviceAttributes(DeviceAttributes),
    SecondaryDeviceAttributes(SecondaryDeviceAttributes),
    TextAreaSize(TextAreaSize),
    Mouse(MouseReport),
}

impl Response {
    /// Decode a reply, picking the decoder from its leader and terminator
    pub fn decode(response: &str) -> ResponseResult<Self> {
        match ResponseKind::classify(response) {
            ResponseKind::MousePress | ResponseKind::MouseRelease => {
                MouseReport::decode_sgr(response).map(Self::Mouse)
            },
            ResponseKind::CursorPosition => {
                CursorPosition::decode(response).map(Self::CursorPosition)
            },
            ResponseKind::PrimaryDeviceAttributes => {
                DeviceAttributes::decode(response).map(Self::DeviceAttributes)
            },
            ResponseKind::SecondaryDeviceAttributes => {
                SecondaryDeviceAttributes::decode(response).map(Self::SecondaryDeviceAttributes)
            },
            ResponseKind::TextAreaSize => TextAreaSize::decode(response).map(Self::TextAreaSize),
            ResponseKind::Other => Err(ResponseError::Unrecognized {
                response: response.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_position() {
        assert_eq!(
            CursorPosition::decode("\x1b[12;40R"),
            Ok(CursorPosition { row: 12, col: 40 })
        );
    }

    #[test]
    fn test_cursor_position_errors() {
        assert!(matches!(
            CursorPosition::decode("\x1b[12R"),
            Err(ResponseError::ParamCount { found: 1, .. })
        ));
        assert!(matches!(
            CursorPosition::decode("\x1b[0;1R"),
            Err(ResponseError::OutOfRange { name: "row", value: 0, .. })
        ));
        assert!(matches!(
            CursorPosition::decode("\x1b[1;1c"),
            Err(ResponseError::Terminator { .. })
        ));
        assert!(matches!(
            CursorPosition::decode("[1;1R"),
            Err(ResponseError::Prefix { .. })
        ));
        assert!(matches!(
            CursorPosition::decode("\x1b[1;xR"),
            Err(ResponseError::NotNumeric { .. })
        ));
    }

    #[test]
    fn test_error_message_names_value() {
        let err = CursorPosition::decode("\x1b[70000;1R").unwrap_err();
        assert_eq!(err.to_string(), "row = 70000 is out of range, expected 1..=65535");
    }

    #[test]
    fn test_device_attributes() {
        let da = DeviceAttributes::decode("\x1b[?62;4;22c").unwrap();
        assert_eq!(da.attributes, vec![62, 4, 22]);
        assert_eq!(da.conformance_level(), Some(62));
        assert!(da.has(4));
        assert!(da.has(22));
        assert!(!da.has(62));
    }

    #[test]
    fn test_device_attributes_requires_private_marker() {
        assert!(matches!(
            DeviceAttributes::decode("\x1b[62;4c"),
            Err(ResponseError::Prefix { .. })
        ));
        assert!(matches!(
            DeviceAttributes::decode("\x1b[?c"),
            Err(ResponseError::NotNumeric { .. })
        ));
    }

    #[test]
    fn test_secondary_device_attributes() {
        let da2 = SecondaryDeviceAttributes::decode("\x1b[>41;380;0c").unwrap();
        assert_eq!(da2.terminal_type, 41);
        assert_eq!(da2.version, 380);
        assert_eq!(da2.terminal_name(), "xterm");

        let da2 = SecondaryDeviceAttributes::decode("\x1b[>84;30c").unwrap();
        assert_eq!(da2.terminal_name(), "tmux");
        assert_eq!(da2.rom, 0);

        assert!(SecondaryDeviceAttributes::decode("\x1b[>1c").is_err());
    }

    #[test]
    fn test_text_area_size() {
        assert_eq!(
            TextAreaSize::decode("\x1b[8;24;80t"),
            Ok(TextAreaSize { rows: 24, cols: 80 })
        );
        assert!(matches!(
            TextAreaSize::decode("\x1b[4;480;640t"),
            Err(ResponseError::OutOfRange { name: "report", .. })
        ));
    }

    #[test]
    fn test_decode_any() {
        assert_eq!(
            Response::decode("\x1b[3;7R"),
            Ok(Response::CursorPosition(CursorPosition { row: 3, col: 7 }))
        );
        assert!(matches!(
            Response::decode("\x1b[?1;2c"),
            Ok(Response::DeviceAttributes(_))
        ));
        assert!(matches!(
            Response::decode("\x1b[<0;1;1m"),
            Ok(Response::Mouse(_))
        ));
        assert!(matches!(
            Response::decode("\x1b[A"),
            Err(ResponseError::Unrecognized { .. })
        ));
    }
}
