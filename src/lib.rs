#![no_std]
//! EBYTE E32 LoRa Module Driver
//!
//! This crate provides a type-safe driver for the EBYTE E32 series of
//! UART-attached LoRa transceiver modules (E32-433T20D, E32-868T20D,
//! E32-915T30D and friends). The E32 hides the LoRa radio behind a plain
//! serial link: the host writes bytes, the module transmits them, and
//! anything received comes back out of the same UART.
//!
//! # Features
//! - All five frequency bands (170/400/433/868/915 MHz) and the three
//!   power classes (T20/T27/T30)
//! - Transparent and fixed transmission with automatic mode arbitration
//!   per destination
//! - JSON key-value payloads with an optional 2's-complement frame
//!   checksum
//! - Full configuration register access: address, channel, UART framing,
//!   air data rate, TX power, FEC, wake-up time, IO drive
//! - Version query and module reset
//! - Optional host-side configuration snapshots through a pluggable store
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`device`]: Main driver, owns the UART, the control pins and the
//!   configuration
//! - [`mode`]: M0/M1 operating mode selection and AUX busy/idle polling
//! - [`config`]: Configuration record and the register field enums
//! - [`register`]: 6-byte configuration register codec
//! - [`commands`]: Sleep-mode command channel (0xC0-0xC4)
//! - [`payload`]: Payload mapping, JSON wire codec and frame checksum
//! - [`snapshot`]: Host-side configuration persistence seam
//! - [`error`]: Error taxonomy and the public sentinel status
//!
//! # Usage
//! The main entry point is the [`E32`] struct, generic over the UART
//! (`embedded-io`), the three control pins and the delay provider
//! (`embedded-hal`). A typical bring-up:
//!
//! 1. Create an [`E32`] with [`Params`] describing the module variant,
//!    address and channel
//! 2. Call [`E32::start`] to push the configuration into the module
//! 3. Exchange payloads with [`E32::send_message`] and
//!    [`E32::recv_message`]
//!
//! # Important Notes
//! - Configuration commands only work while the module sleeps; the driver
//!   handles the mode transitions itself
//! - The operating frequency is derived from band and channel, never set
//!   directly
//! - Sending to your own address and channel uses transparent mode; any
//!   other destination switches the module to fixed mode first
//!
//! # Example
//! ```no_run
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use embedded_io::{Read, ReadReady, Write};
//! use e32::{Params, Payload, E32};
//!
//! fn report<U, M0, M1, A, D>(uart: U, m0: M0, m1: M1, aux: A, delay: D)
//! where
//!     U: Read + Write + ReadReady,
//!     M0: OutputPin,
//!     M1: OutputPin,
//!     A: InputPin,
//!     D: DelayNs,
//! {
//!     let params = Params {
//!         address: 0x0001,
//!         channel: 4,
//!         ..Params::default()
//!     };
//!     let mut driver = E32::new(uart, m0, m1, aux, delay, params);
//!     driver.start();
//!
//!     let mut payload = Payload::new();
//!     let _ = payload.insert_str("temp", "21");
//!     driver.send_message(0x0003, 4, &payload, true);
//! }
//! ```

mod fmt;

pub use regiface::{FromByteArray, ToByteArray};

pub mod commands;
pub mod config;
pub mod device;
pub mod error;
pub mod mode;
pub mod payload;
pub mod register;
pub mod snapshot;

pub use commands::*;
pub use config::*;
pub use device::{Params, RecvOutcome, E32};
pub use error::{Error, Status};
pub use mode::OperatingMode;
pub use payload::{Payload, PayloadError, Value};
pub use register::{DecodeError, RegisterImage};
pub use snapshot::{NoSnapshot, SnapshotStore};
