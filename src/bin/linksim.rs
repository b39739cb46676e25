//! Host simulation of a complete link.
//!
//! Runs the sender and receiver in one process, joined by a shared line
//! register: stdin lines are keyed onto the virtual wire in real time and
//! decoded bytes come out on stdout. Logs from both sides drain to stderr
//! so the decoded byte stream stays clean.
//!
//! Usage: `linksim [unit_ms]` (default 50)

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use rust_pulse_link::hal::{ByteSink, ByteSource, LineBuffer, NullIndicator};
use rust_pulse_link::logging::LogStream;
use rust_pulse_link::sim::{HostDelay, SharedLine, WallClock};
use rust_pulse_link::timing::LinkConfig;
use rust_pulse_link::{ReceiverService, SenderService};

/// Version string (set by build.rs, includes git hash)
const VERSION: &str = env!("VERSION_STRING");

static SEND_LOG: LogStream = LogStream::new();
static RECV_LOG: LogStream = LogStream::new();

/// Side channel fed by stdin. Always connected; one line per sequence.
struct StdinHost;

impl ByteSource for StdinHost {
    fn is_connected(&mut self) -> bool {
        true
    }

    fn poll_line(&mut self, buf: &mut LineBuffer) -> bool {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => {
                // EOF: give the receiver and the log drain a moment, then stop.
                thread::sleep(Duration::from_millis(300));
                std::process::exit(0);
            }
            Ok(_) => {
                buf.set(line.trim_end_matches(['\r', '\n']));
                true
            }
            Err(_) => false,
        }
    }
}

/// Decoded bytes go straight to stdout, unbuffered.
struct StdoutSink;

impl ByteSink for StdoutSink {
    fn write_byte(&mut self, byte: u8) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(&[byte]);
        let _ = out.flush();
    }
}

fn drain_logs() {
    for (name, stream) in [("send", &SEND_LOG), ("recv", &RECV_LOG)] {
        while let Some(entry) = stream.drain() {
            eprintln!(
                "[{:8}] {:5} {}: {}",
                entry.timestamp_ms,
                entry.level.as_str(),
                name,
                entry.message()
            );
        }
    }
}

fn main() {
    let unit_ms: u32 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(50);

    let config = LinkConfig::for_unit(unit_ms);
    if let Err(e) = config.validate() {
        eprintln!("bad timing config: {}", e);
        std::process::exit(1);
    }

    eprintln!("{}", VERSION);
    eprintln!("unit length: {} ms", unit_ms);
    eprintln!("sequence characters:");
    eprintln!("  '0'  short pulse (1 unit)");
    eprintln!("  '1'  long pulse (3 units)");
    eprintln!("  ' '  letter gap (3 units)");
    eprintln!("  '|'  word gap (7 units)");
    eprintln!("example: 101 | 01 0");

    let line = SharedLine::new();

    let probe = line.probe();
    thread::spawn(move || {
        let mut receiver = ReceiverService::new(
            config,
            probe,
            NullIndicator,
            StdoutSink,
            WallClock::new(),
            HostDelay,
            &RECV_LOG,
        );
        let _ = receiver.run();
    });

    thread::spawn(|| loop {
        drain_logs();
        thread::sleep(Duration::from_millis(50));
    });

    let mut sender = SenderService::new(
        config,
        line.driver(),
        HostDelay,
        StdinHost,
        WallClock::new(),
        &SEND_LOG,
    );
    let _ = sender.run();
}
