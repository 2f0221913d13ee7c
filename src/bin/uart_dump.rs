//! Serial line raw byte dumper
//!
//! Opens a serial device and prints received bytes in hex for line-level
//! debugging. Capture polls the port for a fixed window, then reports how
//! many bytes arrived.

use setu_serial::{SerialLine, SerialPort};
use std::env;
use std::time::{Duration, Instant};

const CAPTURE_SECS: u64 = 10;
const BYTES_PER_LINE: usize = 16;

/// Parse `uart_dump [device] [baud]` from positional arguments.
fn parse_args() -> (String, u32) {
    let args: Vec<String> = env::args().collect();

    let device = if args.len() > 1 {
        args[1].clone()
    } else if cfg!(windows) {
        "COM1".to_string()
    } else {
        "/dev/ttyUSB0".to_string()
    };

    let baud = if args.len() > 2 {
        args[2].parse().unwrap_or(115_200)
    } else {
        115_200
    };

    (device, baud)
}

fn print_hex_line(offset: usize, bytes: &[u8]) {
    let hex: String = bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ");
    println!("[{:06}] {}", offset, hex);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (device, baud) = parse_args();

    log::info!("Opening {} at {} baud...", device, baud);
    let mut port = SerialPort::open(&device, baud)?;

    log::info!("Capturing for {} seconds...", CAPTURE_SECS);
    let start = Instant::now();
    let window = Duration::from_secs(CAPTURE_SECS);
    let mut line = Vec::with_capacity(BYTES_PER_LINE);
    let mut total = 0usize;

    while start.elapsed() < window {
        match port.poll_byte() {
            Some(byte) => {
                total += 1;
                line.push(byte);
                if line.len() == BYTES_PER_LINE {
                    print_hex_line(total - line.len(), &line);
                    line.clear();
                }
            }
            None => std::thread::sleep(Duration::from_millis(10)),
        }
    }
    if !line.is_empty() {
        print_hex_line(total - line.len(), &line);
    }

    log::info!("Capture complete: {} bytes received", total);
    port.close();
    Ok(())
}
