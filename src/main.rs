use std::fs;
use std::io::{self, Write as _};

use clap::{Parser, Subcommand};
use mspm0_bsl::image::Image;
use mspm0_bsl::{client, logging::init_logger, logging::log_info, serial, simulator::Simulator, BslError};

#[derive(Parser)]
#[command(name = "mspm0-prog")]
#[command(about = "MSPM0 BSL host-side programmer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Program a device from an Intel HEX file.
    Flash {
        /// Path to the firmware .hex file.
        file: String,
        #[arg(long, default_value = "/dev/ttyUSB0")]
        port: String,
        #[arg(long, default_value = "9600")]
        baud: u32,
        /// Skip the confirmation prompt before flashing.
        #[arg(long)]
        auto: bool,
        /// Save the normalized image alongside the .hex file in the
        /// interim file format.
        #[arg(long)]
        save_interim: bool,
    },
    /// Run the protocol simulator against a serial device.
    Simulate {
        #[arg(long, default_value = "/dev/ttyUSB0")]
        port: String,
        #[arg(long, default_value = "9600")]
        baud: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), BslError> {
    init_logger();
    serial::print_banner();

    let cli = Cli::parse();
    match cli.command {
        Commands::Flash {
            file,
            port,
            baud,
            auto,
            save_interim,
        } => flash(&file, &port, baud, auto, save_interim).await,
        Commands::Simulate { port, baud } => simulate(&port, baud).await,
    }
}

async fn flash(
    file: &str,
    port: &str,
    baud: u32,
    auto: bool,
    save_interim: bool,
) -> Result<(), BslError> {
    let content = fs::read_to_string(file).map_err(|e| BslError::SerialIo(e.to_string()))?;
    let image = Image::from_hex(&content)?;
    log_info(&format!(
        "parsed {} segment(s), {} total byte(s)",
        image.segments.len(),
        image.total_bytes()
    ));

    if save_interim {
        let interim_path = format!("{file}.interim");
        fs::write(&interim_path, image.to_interim_bytes())
            .map_err(|e| BslError::SerialIo(e.to_string()))?;
        log_info(&format!("saved interim image to {interim_path}"));
    }

    if !auto {
        print!("Press Enter to begin flashing {port}... ");
        io::stdout().flush().ok();
        let mut line = String::new();
        io::stdin().read_line(&mut line).ok();
    }

    let mut stream = serial::open(port, baud)?;
    serial::pulse_boot_mode(&mut stream).await?;

    let info = client::run_session(&mut stream, &image).await?;
    log_info(&format!("session complete, device: {info:?}"));
    Ok(())
}

async fn simulate(port: &str, baud: u32) -> Result<(), BslError> {
    let mut stream = serial::open(port, baud)?;
    log_info(&format!("simulating BSL device on {port} at {baud} baud"));
    let mut sim = Simulator::new();
    sim.run(&mut stream).await
}
