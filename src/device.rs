//! E32 device interface
//!
//! This module provides the high-level driver for an E32 module attached
//! over a UART plus three GPIO lines (M0, M1, AUX). The driver owns the
//! serial link, the mode controller, a delay provider and the in-memory
//! [`Configuration`], and exposes the module's operations:
//!
//! - [`start`](E32::start): push the constructed configuration into the
//!   module and persist it
//! - [`send_message`](E32::send_message) /
//!   [`recv_message`](E32::recv_message): exchange JSON payloads
//! - [`get_config`](E32::get_config) / [`set_config`](E32::set_config):
//!   read and write the configuration register
//! - [`get_version`](E32::get_version) / [`reset`](E32::reset)
//!
//! Public operations collapse failures to [`Status::Nok`] (or
//! [`RecvOutcome::Failed`]) so a polling loop never unwinds; the `try_*`
//! variants return the structured [`Error`] instead.
//!
//! # Transmission mode arbitration
//! `send_message` and `recv_message` pick the wire mode from the peer: a
//! peer equal to the driver's own address and channel means transparent,
//! anything else switches the module to fixed mode (and, on send, prefixes
//! the frame with the 3-byte destination). The switch is a real register
//! write and is persisted, so mixed-peer traffic pays a reconfiguration
//! each time the mode flips.
//!
//! # Important Notes
//! - Commands are only accepted in sleep mode; the driver enters it on
//!   your behalf and the module stays in the mode of the last operation
//! - The configuration is only committed after both the module echo and
//!   the snapshot store accepted it

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_io::{Error as _, Read, ReadReady, Write};
use heapless::{String, Vec};
use regiface::{ByteArray, Command, FromByteArray, ToByteArray};

use crate::commands::{
    GetConfig, GetVersion, Reset, SaveMode, SetConfigPersistent, SetConfigVolatile, Version,
};
use crate::config::{AirDataRate, BaudRate, Configuration, Model, Parity, TransmissionMode};
use crate::error::{Error, Status};
use crate::mode::{ModeControl, OperatingMode};
use crate::payload::{self, Payload, PayloadError};
use crate::register::RegisterImage;
use crate::snapshot::{self, NoSnapshot, SnapshotStore};

/// Settle delay after writing a command and after reading its response,
/// in milliseconds.
pub const COMMAND_SETTLE_MS: u32 = 50;
/// Maximum JSON text length of one payload frame.
pub const MAX_TEXT_LEN: usize = 240;
/// Receive buffer size; covers the fixed-mode prefix, the JSON text and
/// the checksum byte.
pub const FRAME_CAPACITY: usize = 256;

/// Constructor parameters for the driver.
///
/// Everything not listed here starts at the module's factory defaults and
/// can be changed later through [`E32::set_config`].
#[derive(Debug, Clone, Copy)]
pub struct Params {
    pub model: Model,
    pub baud_rate: BaudRate,
    pub parity: Parity,
    pub air_data_rate: AirDataRate,
    /// This device's logical address; 0xFFFF listens to everyone.
    pub address: u16,
    pub channel: u8,
    /// Log command failures on the debug channel.
    pub debug: bool,
}

impl Default for Params {
    fn default() -> Self {
        let config = Configuration::default();
        Params {
            model: config.model,
            baud_rate: config.baud_rate,
            parity: config.parity,
            air_data_rate: config.air_data_rate,
            address: config.address,
            channel: config.channel,
            debug: false,
        }
    }
}

impl Params {
    fn into_config(self) -> Configuration {
        let mut config = Configuration {
            model: self.model,
            baud_rate: self.baud_rate,
            parity: self.parity,
            air_data_rate: self.air_data_rate,
            address: self.address,
            channel: self.channel,
            ..Configuration::default()
        };
        config.normalize();
        config
    }
}

/// Result of one receive poll.
#[derive(Debug, Clone, PartialEq)]
pub enum RecvOutcome {
    /// A frame arrived and decoded.
    Received(Payload),
    /// Nothing waiting on the serial link.
    Empty,
    /// A frame arrived but its checksum residual was nonzero; the text was
    /// not parsed.
    Corrupt {
        /// The residual byte sum, zero for an intact frame.
        checksum: u8,
    },
    /// The link or the decoder failed; the cause was reported on the debug
    /// channel.
    Failed,
}

/// Main driver for an E32 module.
///
/// Wraps the UART, the M0/M1/AUX lines, a delay provider and an optional
/// snapshot store, and tracks the module's configuration.
pub struct E32<U, M0, M1, A, D, S = NoSnapshot> {
    uart: U,
    mode: ModeControl<M0, M1, A>,
    delay: D,
    snapshot: S,
    config: Configuration,
    debug: bool,
}

impl<U, M0, M1, A, D> E32<U, M0, M1, A, D, NoSnapshot> {
    /// Creates a driver without snapshot persistence.
    pub fn new(uart: U, m0: M0, m1: M1, aux: A, delay: D, params: Params) -> Self {
        Self::with_snapshot(uart, m0, m1, aux, delay, NoSnapshot, params)
    }
}

impl<U, M0, M1, A, D, S> E32<U, M0, M1, A, D, S> {
    /// Creates a driver that mirrors every committed configuration to
    /// `snapshot`.
    pub fn with_snapshot(
        uart: U,
        m0: M0,
        m1: M1,
        aux: A,
        delay: D,
        snapshot: S,
        params: Params,
    ) -> Self {
        let debug = params.debug;
        E32 {
            uart,
            mode: ModeControl::new(m0, m1, aux),
            delay,
            snapshot,
            config: params.into_config(),
            debug,
        }
    }

    /// The driver's view of the module configuration.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Releases the underlying peripherals.
    pub fn release(self) -> (U, M0, M1, A, D, S) {
        let (m0, m1, aux) = self.mode.release();
        (self.uart, m0, m1, aux, self.delay, self.snapshot)
    }
}

impl<U, M0, M1, A, D, S> E32<U, M0, M1, A, D, S>
where
    U: Read + Write + ReadReady,
    M0: OutputPin,
    M1: OutputPin,
    A: InputPin,
    D: DelayNs,
    S: SnapshotStore,
{
    /// Pushes the constructed configuration into the module, persisted
    /// across its power-down.
    pub fn start(&mut self) -> Status {
        let result = self.try_start();
        self.report("start", result)
    }

    pub fn try_start(&mut self) -> Result<(), Error> {
        self.try_set_config(SaveMode::Persistent, self.config)
    }

    /// Sends a payload to `to_address`/`to_channel`, switching the wire
    /// mode first if the destination requires it.
    pub fn send_message(
        &mut self,
        to_address: u16,
        to_channel: u8,
        payload: &Payload,
        use_checksum: bool,
    ) -> Status {
        let result = self.try_send_message(to_address, to_channel, payload, use_checksum);
        self.report("send", result)
    }

    pub fn try_send_message(
        &mut self,
        to_address: u16,
        to_channel: u8,
        payload: &Payload,
        use_checksum: bool,
    ) -> Result<(), Error> {
        self.select_transmission_mode(to_address, to_channel)?;
        self.mode.set(OperatingMode::WakeUp, &mut self.delay)?;

        let mut text: String<MAX_TEXT_LEN> = String::new();
        payload.encode_json(&mut text)?;

        let mut frame: Vec<u8, FRAME_CAPACITY> = Vec::new();
        if self.config.transmission_mode == TransmissionMode::Fixed {
            frame
                .extend_from_slice(&[(to_address >> 8) as u8, to_address as u8, to_channel])
                .map_err(|_| Error::Payload(PayloadError::Overflow))?;
        }
        frame
            .extend_from_slice(text.as_bytes())
            .map_err(|_| Error::Payload(PayloadError::Overflow))?;
        if use_checksum {
            // The checksum covers the JSON text only, never the
            // destination prefix the module strips off.
            frame
                .push(payload::checksum(text.as_bytes()))
                .map_err(|_| Error::Payload(PayloadError::Overflow))?;
        }

        self.mode.wait_idle(&mut self.delay)?;
        self.uart
            .write_all(&frame)
            .map_err(|e| Error::Serial(e.kind()))?;
        self.uart.flush().map_err(|e| Error::Serial(e.kind()))?;
        debug!("sent {=usize} bytes", frame.len());
        Ok(())
    }

    /// Polls for one payload from `from_address`/`from_channel`, switching
    /// the wire mode first if the sender requires it.
    pub fn recv_message(
        &mut self,
        from_address: u16,
        from_channel: u8,
        use_checksum: bool,
    ) -> RecvOutcome {
        match self.try_recv_message(from_address, from_channel, use_checksum) {
            Ok(outcome) => outcome,
            Err(err) => {
                if self.debug {
                    warn!("recv failed: {}", err);
                }
                RecvOutcome::Failed
            }
        }
    }

    pub fn try_recv_message(
        &mut self,
        from_address: u16,
        from_channel: u8,
        use_checksum: bool,
    ) -> Result<RecvOutcome, Error> {
        self.select_transmission_mode(from_address, from_channel)?;
        self.mode.set(OperatingMode::Normal, &mut self.delay)?;
        self.mode.wait_idle(&mut self.delay)?;

        if !self.uart.read_ready().map_err(|e| Error::Serial(e.kind()))? {
            return Ok(RecvOutcome::Empty);
        }
        let mut buf = [0u8; FRAME_CAPACITY];
        let got = self
            .uart
            .read(&mut buf)
            .map_err(|e| Error::Serial(e.kind()))?;
        if got == 0 {
            return Ok(RecvOutcome::Empty);
        }

        let frame = &buf[..got];
        let text = if use_checksum {
            // An intact frame sums to zero with its trailing checksum
            // byte included.
            let residual = payload::checksum(frame);
            if residual != 0 {
                return Ok(RecvOutcome::Corrupt { checksum: residual });
            }
            &frame[..got - 1]
        } else {
            frame
        };
        let payload = Payload::from_json_bytes(text)?;
        Ok(RecvOutcome::Received(payload))
    }

    /// Reads the module's version frame.
    pub fn get_version(&mut self) -> Option<Version> {
        match self.try_get_version() {
            Ok(version) => Some(version),
            Err(err) => {
                if self.debug {
                    warn!("get version failed: {}", err);
                }
                None
            }
        }
    }

    pub fn try_get_version(&mut self) -> Result<Version, Error> {
        self.execute_command(GetVersion)
    }

    /// Refreshes the driver's configuration from the module's register.
    pub fn get_config(&mut self) -> Status {
        let result = self.try_get_config().map(|_| ());
        self.report("get config", result)
    }

    pub fn try_get_config(&mut self) -> Result<Configuration, Error> {
        let image = self.execute_command(GetConfig)?;
        let mut config = self.config;
        config.apply_register(&image);
        self.config = config;
        Ok(config)
    }

    /// Writes `config` to the module's register.
    ///
    /// The driver's configuration and the snapshot only change after the
    /// module echoed the accepted register and the snapshot store took it.
    pub fn set_config(&mut self, save: SaveMode, config: Configuration) -> Status {
        let result = self.try_set_config(save, config);
        self.report("set config", result)
    }

    pub fn try_set_config(
        &mut self,
        save: SaveMode,
        mut config: Configuration,
    ) -> Result<(), Error> {
        config.normalize();
        let image = RegisterImage::from(&config);
        let echo = match save {
            SaveMode::Persistent => self.execute_command(SetConfigPersistent { register: image })?,
            SaveMode::Volatile => self.execute_command(SetConfigVolatile { register: image })?,
        };
        let mut accepted = config;
        accepted.apply_register(&echo);

        let snapshot = snapshot::render(&accepted)?;
        self.snapshot
            .persist(snapshot.as_bytes())
            .map_err(|_| Error::Snapshot)?;
        self.config = accepted;
        debug!("configuration applied");
        Ok(())
    }

    /// Reboots the module. The module answers with nothing structured, so
    /// the driver only confirms the command went out.
    pub fn reset(&mut self) -> Status {
        let result = self.try_reset();
        self.report("reset", result)
    }

    pub fn try_reset(&mut self) -> Result<(), Error> {
        self.execute_command(Reset)?;
        Ok(())
    }

    /// Picks transparent or fixed mode for a peer and reconfigures the
    /// module when the current mode does not match.
    fn select_transmission_mode(
        &mut self,
        peer_address: u16,
        peer_channel: u8,
    ) -> Result<(), Error> {
        let wanted = if peer_address == self.config.address && peer_channel == self.config.channel
        {
            TransmissionMode::Transparent
        } else {
            TransmissionMode::Fixed
        };
        if wanted == self.config.transmission_mode {
            return Ok(());
        }
        let mut config = self.config;
        config.transmission_mode = wanted;
        self.try_set_config(SaveMode::Persistent, config)
    }

    /// Executes a command against the module.
    ///
    /// Enters sleep mode, writes the opcode followed by the serialized
    /// request, then reads the full response in one exchange. A short read
    /// is a protocol error; commands without a response skip the read.
    fn execute_command<C>(&mut self, command: C) -> Result<C::ResponseParameters, Error>
    where
        C: Command<IdType = u8>,
        C::CommandParameters: ToByteArray<Error = Infallible>,
        <C::ResponseParameters as FromByteArray>::Error: Into<Error>,
    {
        self.mode.set(OperatingMode::Sleep, &mut self.delay)?;
        self.mode.wait_idle(&mut self.delay)?;

        let request = command.invoking_parameters().to_bytes().unwrap();
        self.uart
            .write_all(&[C::id()])
            .map_err(|e| Error::Serial(e.kind()))?;
        self.uart
            .write_all(request.as_ref())
            .map_err(|e| Error::Serial(e.kind()))?;
        self.uart.flush().map_err(|e| Error::Serial(e.kind()))?;
        self.delay.delay_ms(COMMAND_SETTLE_MS);

        let mut raw_response = <C::ResponseParameters as FromByteArray>::Array::new();
        let expected = raw_response.as_ref().len();
        if expected > 0 {
            let got = self
                .uart
                .read(raw_response.as_mut())
                .map_err(|e| Error::Serial(e.kind()))?;
            self.delay.delay_ms(COMMAND_SETTLE_MS);
            if got != expected {
                return Err(Error::Response { expected, got });
            }
        }
        C::ResponseParameters::from_bytes(raw_response).map_err(Into::into)
    }

    fn report(&self, op: &str, result: Result<(), Error>) -> Status {
        match result {
            Ok(()) => Status::Ok,
            Err(err) => {
                if self.debug {
                    warn!("{=str} failed: {}", op, err);
                }
                Status::Nok
            }
        }
    }
}
