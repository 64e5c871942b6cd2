//! ANSI Response Replay
//!
//! Replays captured tty input through the input driver and shows what an
//! application would see: the user input that passes through, and what the
//! terminal reported about itself.
//!
//! The driver behaves as if it had just sent DA1, DA2, cursor position and
//! text area size queries, so captured replies to those are pulled out.
//!
//! # Usage
//!
//! ```bash
//! # Replay a capture in 3-byte reads
//! ansi-replay --chunk 3 capture.bin
//!
//! # JSON output, mouse reports enabled
//! printf 'a\033[<0;5;5Mb' | ansi-replay --mouse --json
//! ```

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;

use ansi_response::app::{init_logging, Config};
use ansi_response::input::MouseReport;
use ansi_response::{InputDriver, InputUnit, Query, ReadTag, TerminalModel};

/// Command-line arguments
#[derive(Default)]
struct Args {
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    /// Bytes per simulated read (0 = whole input at once)
    chunk: usize,
    mouse: bool,
    json: bool,
    help: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut argv = std::env::args().skip(1);

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "-h" | "--help" => args.help = true,
            "-j" | "--json" => args.json = true,
            "-m" | "--mouse" => args.mouse = true,
            "-c" | "--chunk" => {
                let value = argv.next().ok_or("--chunk needs a value")?;
                args.chunk = value
                    .parse()
                    .map_err(|_| format!("--chunk: {value:?} is not a byte count"))?;
            },
            "--config" => {
                let value = argv.next().ok_or("--config needs a path")?;
                args.config = Some(PathBuf::from(value));
            },
            other if !other.starts_with('-') && args.input.is_none() => {
                args.input = Some(PathBuf::from(other));
            },
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(args)
}

/// Everything the replay produced
#[derive(Serialize)]
struct Report {
    passthrough: String,
    units: Vec<InputUnit<ReadTag>>,
    mouse: Vec<MouseReport>,
    model: TerminalModel,
    reads: usize,
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            print_help();
            return ExitCode::FAILURE;
        },
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    let mut config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            },
        },
        None => Config::load_or_default(),
    };
    if args.mouse {
        config.mouse.enabled = true;
    }

    init_logging(&config.log_filter);

    let input = match &args.input {
        Some(path) => match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            },
        },
        None => {
            let mut data = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut data) {
                eprintln!("Error reading stdin: {e}");
                return ExitCode::FAILURE;
            }
            data
        },
    };

    let report = replay(&config, &input, args.chunk);

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            },
        }
    } else {
        print_text(&report);
    }

    ExitCode::SUCCESS
}

fn replay(config: &Config, input: &[u8], chunk: usize) -> Report {
    let mut driver = InputDriver::new(config);
    for query in [
        Query::DeviceAttributes,
        Query::SecondaryDeviceAttributes,
        Query::CursorPosition,
        Query::TextAreaSize,
    ] {
        driver.request(query);
    }

    let chunk = if chunk == 0 { input.len().max(1) } else { chunk };
    let mut units = Vec::new();
    let mut reads = 0;
    for read in input.chunks(chunk) {
        units.extend(driver.feed(read));
        reads += 1;
    }
    // End of input stands in for the idle timer
    units.extend(driver.flush());

    Report {
        passthrough: units.iter().map(|u| u.ch).collect(),
        units,
        mouse: driver.take_mouse_events(),
        model: driver.model(),
        reads,
    }
}

fn print_text(report: &Report) {
    println!("Reads: {}", report.reads);
    println!("Passthrough: {}", report.passthrough.escape_debug());
    if let Some(size) = report.model.size {
        println!("Size: {}x{}", size.cols, size.rows);
    }
    if let Some(cursor) = report.model.cursor {
        println!("Cursor: ({}, {})", cursor.row, cursor.col);
    }
    if let Some(da) = &report.model.device_attributes {
        println!("Device attributes: {:?}", da.attributes);
    }
    if let Some(terminal) = report.model.terminal {
        println!(
            "Terminal: {} (version {})",
            terminal.terminal_name(),
            terminal.version
        );
    }
    if report.model.rejected_replies > 0 {
        println!("Rejected replies: {}", report.model.rejected_replies);
    }
    for event in &report.mouse {
        println!(
            "Mouse: {:?} {:?} at ({}, {})",
            event.kind, event.button, event.col, event.row
        );
    }
}

fn print_help() {
    println!("ANSI Response Replay");
    println!();
    println!("Usage: ansi-replay [OPTIONS] [INPUT_FILE]");
    println!();
    println!("Options:");
    println!("  -c, --chunk <N>      Feed input in reads of N bytes (default: all at once)");
    println!("  -m, --mouse          Decode SGR mouse reports");
    println!("  -j, --json           Output report as JSON");
    println!("      --config <PATH>  Load configuration from PATH");
    println!("  -h, --help           Show this help message");
    println!();
    println!("If no input file is specified, reads from stdin.");
}
