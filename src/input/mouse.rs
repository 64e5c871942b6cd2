//! SGR mouse report decoding
//!
//! With SGR extended reporting (`CSI ? 1006 h`) the terminal sends
//! `CSI < Pb ; Px ; Py M` on press and motion and the same with a final `m`
//! on release. Coordinates are 1-based on the wire; decoded reports are
//! 0-based.
//!
//! Button code layout:
//! - bits 0-1: button (0 left, 1 middle, 2 right, 3 none)
//! - bit 2: shift, bit 3: alt, bit 4: ctrl
//! - bit 5: motion
//! - bit 6: wheel (buttons 0-3 become up/down/left/right)
//! - bit 7: extra buttons 8-11

use serde::Serialize;

use crate::response::{one_based, parse_params, ResponseError, ResponseResult};

/// Keyboard modifiers held during a mouse event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Extract modifiers from an SGR button code (Shift=4, Alt=8, Ctrl=16)
    pub fn from_button_code(code: u32) -> Self {
        Self {
            shift: code & 4 != 0,
            alt: code & 8 != 0,
            ctrl: code & 16 != 0,
        }
    }

    /// Check if any modifier is pressed
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt
    }
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    /// Motion with no button held
    None,
    WheelUp,
    WheelDown,
    WheelLeft,
    WheelRight,
    Button8,
    Button9,
    Button10,
    Button11,
}

/// Mouse event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MouseEventType {
    Press,
    Release,
    Move,
}

/// A decoded mouse report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MouseReport {
    pub button: MouseButton,
    pub kind: MouseEventType,
    /// 0-based column
    pub col: u16,
    /// 0-based row
    pub row: u16,
    pub modifiers: Modifiers,
}

impl MouseReport {
    /// Decode `ESC [ < Pb ; Px ; Py M` or `... m`
    pub fn decode_sgr(response: &str) -> ResponseResult<Self> {
        let params = parse_params(response, "\x1b[<", &['M', 'm'])?;
        let &[code, x, y] = params.as_slice() else {
            return Err(ResponseError::ParamCount {
                response: response.to_string(),
                found: params.len(),
                expected: "3 (button;col;row)",
            });
        };

        let button = decode_button(code)?;
        let kind = if response.ends_with('m') {
            MouseEventType::Release
        } else if code & 32 != 0 {
            MouseEventType::Move
        } else {
            MouseEventType::Press
        };

        Ok(Self {
            button,
            kind,
            col: one_based("col", x)? - 1,
            row: one_based("row", y)? - 1,
            modifiers: Modifiers::from_button_code(code),
        })
    }

    /// Is this a scroll wheel event?
    pub fn is_wheel(&self) -> bool {
        matches!(
            self.button,
            MouseButton::WheelUp
                | MouseButton::WheelDown
                | MouseButton::WheelLeft
                | MouseButton::WheelRight
        )
    }
}

fn decode_button(code: u32) -> ResponseResult<MouseButton> {
    let low = code & 0b11;
    let button = match (code & 64 != 0, code & 128 != 0, low) {
        (false, false, 0) => MouseButton::Left,
        (false, false, 1) => MouseButton::Middle,
        (false, false, 2) => MouseButton::Right,
        (false, false, _) => MouseButton::None,
        (true, false, 0) => MouseButton::WheelUp,
        (true, false, 1) => MouseButton::WheelDown,
        (true, false, 2) => MouseButton::WheelLeft,
        (true, false, _) => MouseButton::WheelRight,
        (false, true, 0) => MouseButton::Button8,
        (false, true, 1) => MouseButton::Button9,
        (false, true, 2) => MouseButton::Button10,
        (false, true, _) => MouseButton::Button11,
        (true, true, _) => {
            return Err(ResponseError::OutOfRange {
                name: "button",
                value: code,
                constraint: "wheel (64) or extra button (128) bit, not both",
            })
        },
    };
    Ok(button)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_press_and_release() {
        let press = MouseReport::decode_sgr("\x1b[<0;11;6M").unwrap();
        assert_eq!(press.button, MouseButton::Left);
        assert_eq!(press.kind, MouseEventType::Press);
        assert_eq!((press.col, press.row), (10, 5));
        assert!(!press.modifiers.any());

        let release = MouseReport::decode_sgr("\x1b[<0;11;6m").unwrap();
        assert_eq!(release.kind, MouseEventType::Release);
    }

    #[test]
    fn test_modifiers_and_motion() {
        // right button (2) + shift (4) + ctrl (16) + motion (32)
        let report = MouseReport::decode_sgr("\x1b[<54;1;1M").unwrap();
        assert_eq!(report.button, MouseButton::Right);
        assert_eq!(report.kind, MouseEventType::Move);
        assert!(report.modifiers.shift);
        assert!(report.modifiers.ctrl);
        assert!(!report.modifiers.alt);
    }

    #[test]
    fn test_motion_without_button() {
        let report = MouseReport::decode_sgr("\x1b[<35;3;4M").unwrap();
        assert_eq!(report.button, MouseButton::None);
        assert_eq!(report.kind, MouseEventType::Move);
    }

    #[test]
    fn test_wheel() {
        let up = MouseReport::decode_sgr("\x1b[<64;5;5M").unwrap();
        assert_eq!(up.button, MouseButton::WheelUp);
        assert!(up.is_wheel());

        let down = MouseReport::decode_sgr("\x1b[<65;5;5M").unwrap();
        assert_eq!(down.button, MouseButton::WheelDown);
    }

    #[test]
    fn test_extra_buttons() {
        assert_eq!(
            MouseReport::decode_sgr("\x1b[<128;1;1M").unwrap().button,
            MouseButton::Button8
        );
        assert_eq!(
            MouseReport::decode_sgr("\x1b[<131;1;1m").unwrap().button,
            MouseButton::Button11
        );
        assert!(MouseReport::decode_sgr("\x1b[<192;1;1M").is_err());
    }

    #[test]
    fn test_malformed_reports() {
        assert!(matches!(
            MouseReport::decode_sgr("\x1b[<0;1M"),
            Err(ResponseError::ParamCount { found: 2, .. })
        ));
        assert!(matches!(
            MouseReport::decode_sgr("\x1b[0;1;1M"),
            Err(ResponseError::Prefix { .. })
        ));
        assert!(matches!(
            MouseReport::decode_sgr("\x1b[<0;0;1M"),
            Err(ResponseError::OutOfRange { name: "col", .. })
        ));
    }
}
