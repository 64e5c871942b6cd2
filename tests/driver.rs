//! End-to-end tests for the input driver
//!
//! A captured startup exchange is replayed in every read size; the user
//! input and the resulting terminal model must not depend on how the tty
//! happened to split it.

use std::fs;

use ansi_response::app::Config;
use ansi_response::input::MouseButton;
use ansi_response::response::{CursorPosition, TextAreaSize};
use ansi_response::{InputDriver, InputUnit, ParserState, Query, ReadTag, TerminalModel};

const STARTUP: &[u8] =
    b"ls\x1b[?62;22;4c -la\x1b[>1;4000;0c\x1b[12;40R\x1b[8;50;132t\x1b[<64;10;2M\r";

fn text(units: &[InputUnit<ReadTag>]) -> String {
    units.iter().map(|u| u.ch).collect()
}

fn startup_driver(config: &Config) -> InputDriver {
    let mut driver = InputDriver::new(config);
    for query in [
        Query::DeviceAttributes,
        Query::SecondaryDeviceAttributes,
        Query::CursorPosition,
        Query::TextAreaSize,
    ] {
        driver.request(query);
    }
    driver
}

fn replay(config: &Config, input: &[u8], read_size: usize) -> (String, TerminalModel) {
    let mut driver = startup_driver(config);
    let mut out = Vec::new();
    for read in input.chunks(read_size) {
        out.extend(driver.feed(read));
    }
    out.extend(driver.flush());
    (text(&out), driver.model())
}

fn mouse_config() -> Config {
    let mut config = Config::default();
    config.mouse.enabled = true;
    config
}

#[test]
fn test_startup_exchange_whole() {
    let (passthrough, model) = replay(&mouse_config(), STARTUP, STARTUP.len());

    assert_eq!(passthrough, "ls -la\r");
    assert_eq!(model.cursor, Some(CursorPosition { row: 12, col: 40 }));
    assert_eq!(model.size, Some(TextAreaSize { rows: 50, cols: 132 }));
    assert_eq!(
        model.device_attributes.as_ref().and_then(|da| da.conformance_level()),
        Some(62)
    );
    assert_eq!(model.terminal.map(|t| t.version), Some(4000));
    assert_eq!(model.rejected_replies, 0);
}

#[test]
fn test_startup_exchange_every_read_size() {
    let config = mouse_config();
    let expected = replay(&config, STARTUP, STARTUP.len());

    for read_size in 1..STARTUP.len() {
        assert_eq!(
            replay(&config, STARTUP, read_size),
            expected,
            "read size {read_size}"
        );
    }
}

#[test]
fn test_mouse_reports_survive_chunking() {
    let mut driver = startup_driver(&mouse_config());
    for byte in STARTUP {
        driver.feed(std::slice::from_ref(byte));
    }

    let events = driver.take_mouse_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].button, MouseButton::WheelUp);
    assert_eq!((events[0].col, events[0].row), (9, 1));
}

#[test]
fn test_without_mouse_reports_reach_the_application() {
    let (passthrough, _) = replay(&Config::default(), STARTUP, 4);
    assert_eq!(passthrough, "ls -la\x1b[<64;10;2M\r");
}

#[test]
fn test_alt_key_released_by_timeout() {
    let mut driver = InputDriver::new(&Config::default());

    // ESC followed by a letter is an alt chord, not a reply
    assert_eq!(text(&driver.feed(b"\x1bx")), "\x1bx");

    // a bare ESC waits for the idle timer
    assert!(driver.feed(b"\x1b").is_empty());
    let since = driver.pending_since().expect("escape is pending");
    let released = driver.poll_timeout(since + driver.escape_timeout());
    assert_eq!(text(&released), "\x1b");
    assert_eq!(driver.parser_state(), ParserState::Normal);
}

#[test]
fn test_tags_point_back_into_reads() {
    let mut driver = InputDriver::new(&Config::default());
    driver.request(Query::CursorPosition);

    let reads: [&[u8]; 3] = [b"a\x1b[3", b";4Rb", "é".as_bytes()];
    let mut out = Vec::new();
    for read in reads {
        out.extend(driver.feed(read));
    }

    assert_eq!(text(&out), "abé");
    assert_eq!(out[0].tag, ReadTag { batch: 0, offset: 0 });
    assert_eq!(out[1].tag, ReadTag { batch: 1, offset: 3 });
    // tagged with the byte that completed the character
    assert_eq!(out[2].tag, ReadTag { batch: 2, offset: 1 });
}

#[test]
fn test_driver_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "escape_timeout_ms": 200, "mouse": { "enabled": true } }"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    let driver = InputDriver::new(&config);

    assert_eq!(driver.escape_timeout().as_millis(), 200);
    assert!(driver.enable_mouse_sequence().is_some());
}
