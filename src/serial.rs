//! Real serial transport: opening the port, RTS/DTR boot-mode pulsing, and
//! the startup banner. None of this is part of the protocol core; it is
//! the external collaborator spec section 1 describes.

use std::time::Duration;

use tokio::time::sleep;
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

use crate::error::BslError;

/// Opens `port` at `baud` and returns an async serial stream.
pub fn open(port: &str, baud: u32) -> Result<SerialStream, BslError> {
    tokio_serial::new(port, baud)
        .timeout(Duration::from_secs(1))
        .open_native_async()
        .map_err(|e| BslError::SerialOpen(e.to_string()))
}

/// Pulses RTS and DTR the way the CH340K-based boards expect in order to
/// leave reset and deassert BOOT, putting the target in BSL mode before a
/// flash session begins.
pub async fn pulse_boot_mode(stream: &mut SerialStream) -> Result<(), BslError> {
    stream
        .write_request_to_send(false)
        .map_err(|e| BslError::SerialIo(e.to_string()))?;
    sleep(Duration::from_millis(50)).await;
    stream
        .write_request_to_send(true)
        .map_err(|e| BslError::SerialIo(e.to_string()))?;
    stream
        .write_data_terminal_ready(true)
        .map_err(|e| BslError::SerialIo(e.to_string()))?;
    sleep(Duration::from_millis(50)).await;
    Ok(())
}

/// Prints the startup banner, mirroring the original tool's ASCII art.
pub fn print_banner() {
    println!();
    println!("                      _     __ __  ___  _____ ");
    println!("                     | |   /_ /_ |/ _ \\| ____|");
    println!("  ___  __ _ ___ _   _| |    | || | | | | |__  ");
    println!(" / _ \\/ _` / __| | | | |    | || | | | |___ \\ ");
    println!("|  __/ (_| \\__ \\ |_| | |____| || | |_| |___) |");
    println!(" \\___|\\__,_|___/\\__, |______|_||_|\\___/|____/ ");
    println!("                 __/ |                        ");
    println!("                |___/                         ");
    println!("mspm0-prog - host-side BSL programmer");
    println!();
}
