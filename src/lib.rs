//! # mspm0-bsl-flash - Host-side USB-serial BSL programmer
//!
//! Consumes a firmware image in Intel HEX, normalizes it into an internal
//! image representation with strict alignment guarantees, and drives a
//! target device through a request/response protocol over a serial line to
//! erase flash, write program data, and start the loaded application.
//! Ships a loopback simulator that speaks the same wire protocol so the
//! programmer can be exercised end-to-end without hardware.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mspm0-bsl-flash = "0.1.0"
//! ```
//!
//! ```rust,no_run
//! use mspm0_bsl::{image::Image, client, logging::init_logger};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! init_logger();
//! let image = Image::from_hex(":10000000000102030405060708090A0B0C0D0E0F7D\n:00000001FF\n")?;
//! let mut port = tokio_serial::new("/dev/ttyUSB0", 9600)
//!     .open_native_async()?;
//! client::run_session(&mut port, &image).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod constants;
pub mod crc;
pub mod erase;
pub mod error;
pub mod frame;
pub mod hex;
pub mod image;
pub mod logging;
pub mod serial;
pub mod simulator;

pub use crate::client::{run_session, DeviceInfo};
pub use crate::error::BslError;
pub use crate::image::{Image, Segment};
pub use crate::logging::{init_logger, log_info};
pub use crate::simulator::Simulator;
