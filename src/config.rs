//! Module configuration types
//!
//! This module contains the in-memory configuration record of an E32 module
//! and the enumerated types for every field that crosses the wire inside the
//! 6-byte configuration register:
//!
//! - UART framing: [`Parity`], [`BaudRate`]
//! - Radio: [`AirDataRate`], [`TxPower`], [`ForwardErrorCorrection`]
//! - Behavior: [`TransmissionMode`], [`IoMode`], [`WakeupTime`]
//!
//! Every enum carries its exact register bit pattern as its discriminant;
//! the patterns must be reproduced bit-for-bit to interoperate with real
//! E32 hardware. Fields whose bit space is not fully populated (parity, air
//! data rate) decode through `TryFrom<u8>` and fail on unknown patterns
//! rather than substituting a guess.
//!
//! # Frequency derivation
//! The operating frequency is always derived, never stored: it is the band
//! minimum of the [`Model`] plus the channel number in MHz, clamped to the
//! band maximum. When the clamp engages, the channel is rewritten to the
//! clamp offset `max - min` so that channel and frequency stay consistent.

use core::fmt;

/// UART parity scheme, register bits 7:6 of the speed byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    /// 8N1 (default)
    None = 0b00,
    /// 8O1
    Odd = 0b01,
    /// 8E1
    Even = 0b10,
}

/// Error type for invalid parity bit patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidParity(pub u8);

impl Parity {
    /// Conventional name of the framing scheme.
    pub fn as_str(self) -> &'static str {
        match self {
            Parity::None => "8N1",
            Parity::Odd => "8O1",
            Parity::Even => "8E1",
        }
    }
}

impl TryFrom<u8> for Parity {
    type Error = InvalidParity;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b00 => Ok(Parity::None),
            0b01 => Ok(Parity::Odd),
            0b10 => Ok(Parity::Even),
            invalid => Err(InvalidParity(invalid)),
        }
    }
}

/// UART baudrate of the local serial link, register bits 5:3 of the speed
/// byte. All eight bit patterns are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaudRate {
    B1200 = 0b000,
    B2400 = 0b001,
    B4800 = 0b010,
    /// Default
    B9600 = 0b011,
    B19200 = 0b100,
    B38400 = 0b101,
    B57600 = 0b110,
    B115200 = 0b111,
}

impl BaudRate {
    /// Bits per second on the serial link.
    pub fn bps(self) -> u32 {
        match self {
            BaudRate::B1200 => 1200,
            BaudRate::B2400 => 2400,
            BaudRate::B4800 => 4800,
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B115200 => 115200,
        }
    }

    /// Decode the 3-bit register field. The table is complete, so only the
    /// low three bits participate.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => BaudRate::B1200,
            0b001 => BaudRate::B2400,
            0b010 => BaudRate::B4800,
            0b011 => BaudRate::B9600,
            0b100 => BaudRate::B19200,
            0b101 => BaudRate::B38400,
            0b110 => BaudRate::B57600,
            _ => BaudRate::B115200,
        }
    }
}

/// Over-the-air bitrate, register bits 2:0 of the speed byte.
///
/// Patterns 0b110 and 0b111 are not assigned; decoding them is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AirDataRate {
    Bps300 = 0b000,
    Bps1200 = 0b001,
    /// Default
    Bps2400 = 0b010,
    Bps4800 = 0b011,
    Bps9600 = 0b100,
    Bps19200 = 0b101,
}

/// Error type for invalid air data rate bit patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidAirDataRate(pub u8);

impl AirDataRate {
    /// Conventional short name ("2.4k" etc).
    pub fn as_str(self) -> &'static str {
        match self {
            AirDataRate::Bps300 => "0.3k",
            AirDataRate::Bps1200 => "1.2k",
            AirDataRate::Bps2400 => "2.4k",
            AirDataRate::Bps4800 => "4.8k",
            AirDataRate::Bps9600 => "9.6k",
            AirDataRate::Bps19200 => "19.2k",
        }
    }
}

impl TryFrom<u8> for AirDataRate {
    type Error = InvalidAirDataRate;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b000 => Ok(AirDataRate::Bps300),
            0b001 => Ok(AirDataRate::Bps1200),
            0b010 => Ok(AirDataRate::Bps2400),
            0b011 => Ok(AirDataRate::Bps4800),
            0b100 => Ok(AirDataRate::Bps9600),
            0b101 => Ok(AirDataRate::Bps19200),
            invalid => Err(InvalidAirDataRate(invalid)),
        }
    }
}

/// Transmission mode, register bit 7 of the option byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmissionMode {
    /// All modules sharing one address+channel receive every frame; no
    /// addressing fields on the wire (default).
    Transparent = 0,
    /// Every frame carries an explicit 3-byte destination address+channel
    /// prefix; used for point-to-point or broadcast (address 0xFFFF).
    Fixed = 1,
}

impl TransmissionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TransmissionMode::Transparent => "transparent",
            TransmissionMode::Fixed => "fixed",
        }
    }

    pub fn from_bits(bits: u8) -> Self {
        match bits & 1 {
            0 => TransmissionMode::Transparent,
            _ => TransmissionMode::Fixed,
        }
    }
}

/// IO drive mode of the TXD/AUX/RXD lines, register bit 6 of the option
/// byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoMode {
    /// TXD and AUX floating outputs, RXD floating input.
    Floating = 0,
    /// TXD and AUX push-pull outputs, RXD pull-up input (default).
    PushPull = 1,
}

impl IoMode {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 1 {
            0 => IoMode::Floating,
            _ => IoMode::PushPull,
        }
    }
}

/// Wireless wake-up interval used in power-save reception and by the
/// wake-up preamble, register bits 5:3 of the option byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeupTime {
    /// Default
    Ms250 = 0b000,
    Ms500 = 0b001,
    Ms750 = 0b010,
    Ms1000 = 0b011,
    Ms1250 = 0b100,
    Ms1500 = 0b101,
    Ms1750 = 0b110,
    Ms2000 = 0b111,
}

impl WakeupTime {
    /// Interval in milliseconds.
    pub fn millis(self) -> u16 {
        (self as u16 + 1) * 250
    }

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => WakeupTime::Ms250,
            0b001 => WakeupTime::Ms500,
            0b010 => WakeupTime::Ms750,
            0b011 => WakeupTime::Ms1000,
            0b100 => WakeupTime::Ms1250,
            0b101 => WakeupTime::Ms1500,
            0b110 => WakeupTime::Ms1750,
            _ => WakeupTime::Ms2000,
        }
    }
}

/// Forward error correction, register bit 2 of the option byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ForwardErrorCorrection {
    Off = 0,
    /// Default
    On = 1,
}

impl ForwardErrorCorrection {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 1 {
            0 => ForwardErrorCorrection::Off,
            _ => ForwardErrorCorrection::On,
        }
    }
}

/// Transmission power step, register bits 1:0 of the option byte.
///
/// The step maps to a dBm value through the module's power class, see
/// [`TxPower::dbm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxPower {
    /// Maximum power of the power class (default).
    Highest = 0b00,
    High = 0b01,
    Low = 0b10,
    Lowest = 0b11,
}

impl TxPower {
    /// Output power in dBm for a given power class.
    pub fn dbm(self, class: PowerClass) -> u8 {
        const TABLE: [[u8; 3]; 4] = [
            [20, 27, 30],
            [17, 24, 27],
            [14, 21, 24],
            [10, 18, 21],
        ];
        TABLE[self as usize][class as usize]
    }

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => TxPower::Highest,
            0b01 => TxPower::High,
            0b10 => TxPower::Low,
            _ => TxPower::Lowest,
        }
    }
}

/// Frequency band of a module variant.
///
/// Each band defines the minimum, typical and maximum operating frequency
/// in MHz. The channel number selects `min + channel` MHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Band {
    Mhz170,
    Mhz400,
    Mhz433,
    Mhz868,
    Mhz915,
}

impl Band {
    /// Lowest operating frequency of the band (channel 0), MHz.
    pub const fn min_mhz(self) -> u16 {
        match self {
            Band::Mhz170 => 160,
            Band::Mhz400 => 410,
            Band::Mhz433 => 410,
            Band::Mhz868 => 862,
            Band::Mhz915 => 900,
        }
    }

    /// Typical (marketing) frequency of the band, MHz.
    pub const fn typical_mhz(self) -> u16 {
        match self {
            Band::Mhz170 => 170,
            Band::Mhz400 => 470,
            Band::Mhz433 => 433,
            Band::Mhz868 => 868,
            Band::Mhz915 => 915,
        }
    }

    /// Highest operating frequency of the band, MHz.
    pub const fn max_mhz(self) -> u16 {
        match self {
            Band::Mhz170 => 173,
            Band::Mhz400 => 525,
            Band::Mhz433 => 441,
            Band::Mhz868 => 893,
            Band::Mhz915 => 931,
        }
    }

    /// Band number as it appears in the model designator ("868" in
    /// "868T20D").
    pub const fn designator(self) -> u16 {
        match self {
            Band::Mhz170 => 170,
            Band::Mhz400 => 400,
            Band::Mhz433 => 433,
            Band::Mhz868 => 868,
            Band::Mhz915 => 915,
        }
    }
}

/// Maximum transmission power class of a module variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerClass {
    /// 20 dBm / 100 mW
    T20 = 0,
    /// 27 dBm / 500 mW
    T27 = 1,
    /// 30 dBm / 1 W
    T30 = 2,
}

impl PowerClass {
    pub fn as_str(self) -> &'static str {
        match self {
            PowerClass::T20 => "T20",
            PowerClass::T27 => "T27",
            PowerClass::T30 => "T30",
        }
    }
}

/// Module variant: frequency band plus power class.
///
/// The model never crosses the wire; it only selects the band table used
/// for frequency derivation and the dBm column of the TX power table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Model {
    pub band: Band,
    pub power: PowerClass,
}

impl Default for Model {
    /// E32-868T20D
    fn default() -> Self {
        Model {
            band: Band::Mhz868,
            power: PowerClass::T20,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}D", self.band.designator(), self.power.as_str())
    }
}

/// In-memory configuration record of one module.
///
/// One instance lives inside the driver and is the single authority for the
/// module's settings. It is refreshed from the module's own register echo
/// after every successful get/set-config exchange; the operating frequency
/// is derived on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Configuration {
    /// Module variant; selects the band table, never serialized.
    pub model: Model,
    /// Local serial link baudrate.
    pub baud_rate: BaudRate,
    /// Local serial link parity.
    pub parity: Parity,
    /// Over-the-air bitrate.
    pub air_data_rate: AirDataRate,
    /// This device's logical address. 0xFFFF is the broadcast/monitor
    /// wildcard.
    pub address: u16,
    /// Channel 0-31, offset in MHz above the band minimum.
    pub channel: u8,
    pub transmission_mode: TransmissionMode,
    pub io_mode: IoMode,
    pub wakeup_time: WakeupTime,
    pub fec: ForwardErrorCorrection,
    pub tx_power: TxPower,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            model: Model::default(),
            baud_rate: BaudRate::B9600,
            parity: Parity::None,
            air_data_rate: AirDataRate::Bps2400,
            address: 0x0000,
            channel: 0x06,
            transmission_mode: TransmissionMode::Transparent,
            io_mode: IoMode::PushPull,
            wakeup_time: WakeupTime::Ms250,
            fec: ForwardErrorCorrection::On,
            tx_power: TxPower::Highest,
        }
    }
}

impl Configuration {
    /// Highest channel number the register can carry.
    pub const MAX_CHANNEL: u8 = 31;

    /// Operating frequency in MHz: band minimum plus channel, clamped to
    /// the band maximum. Always recomputed, never cached.
    pub fn frequency_mhz(&self) -> u16 {
        let min = self.model.band.min_mhz();
        let max = self.model.band.max_mhz();
        (min + u16::from(self.channel)).min(max)
    }

    /// Clamp the channel into the register domain and onto the band.
    ///
    /// If `min + channel` exceeds the band maximum, the channel is
    /// rewritten to the clamp offset `max - min`, keeping channel and
    /// derived frequency consistent.
    pub fn normalize(&mut self) {
        self.channel = self.channel.min(Self::MAX_CHANNEL);
        let min = self.model.band.min_mhz();
        let max = self.model.band.max_mhz();
        if min + u16::from(self.channel) > max {
            self.channel = (max - min) as u8;
        }
    }
}
