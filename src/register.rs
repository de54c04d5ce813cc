//! Configuration register codec
//!
//! The E32 exposes its settings through a single 6-byte register that is
//! written and read over the command channel while the module sleeps:
//!
//! | byte | content                                                      |
//! |------|--------------------------------------------------------------|
//! | 0    | header: save-command opcode on write, echoed on read         |
//! | 1-2  | address, big-endian                                          |
//! | 3    | speed: parity `7:6`, baudrate `5:3`, air data rate `2:0`     |
//! | 4    | channel (0-31)                                               |
//! | 5    | option: transmission `7`, IO `6`, wake `5:3`, FEC `2`, power `1:0` |
//!
//! [`RegisterImage`] is the decoded form. Serialization emits the 5-byte
//! body only, because the header position is owned by the command opcode;
//! deserialization consumes all 6 response bytes and reads-but-ignores the
//! header. Unknown bit patterns in the partially-populated fields fail with
//! a [`DecodeError`] instead of being silently replaced.

use core::convert::Infallible;

use regiface::{FromByteArray, ToByteArray};

use crate::config::{
    AirDataRate, BaudRate, Configuration, ForwardErrorCorrection, InvalidAirDataRate,
    InvalidParity, IoMode, Parity, TransmissionMode, TxPower, WakeupTime,
};

/// Length of a register read/set response, header included.
pub const REGISTER_LEN: usize = 6;

/// Error type for register responses carrying unknown bit patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// The parity field held an unassigned pattern.
    Parity(u8),
    /// The air data rate field held an unassigned pattern.
    AirDataRate(u8),
}

impl From<InvalidParity> for DecodeError {
    fn from(err: InvalidParity) -> Self {
        DecodeError::Parity(err.0)
    }
}

impl From<InvalidAirDataRate> for DecodeError {
    fn from(err: InvalidAirDataRate) -> Self {
        DecodeError::AirDataRate(err.0)
    }
}

/// Decoded form of the configuration register.
///
/// Carries exactly the fields that cross the wire; the model and the
/// derived frequency never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterImage {
    pub address: u16,
    pub parity: Parity,
    pub baud_rate: BaudRate,
    pub air_data_rate: AirDataRate,
    pub channel: u8,
    pub transmission_mode: TransmissionMode,
    pub io_mode: IoMode,
    pub wakeup_time: WakeupTime,
    pub fec: ForwardErrorCorrection,
    pub tx_power: TxPower,
}

impl From<&Configuration> for RegisterImage {
    fn from(config: &Configuration) -> Self {
        RegisterImage {
            address: config.address,
            parity: config.parity,
            baud_rate: config.baud_rate,
            air_data_rate: config.air_data_rate,
            channel: config.channel,
            transmission_mode: config.transmission_mode,
            io_mode: config.io_mode,
            wakeup_time: config.wakeup_time,
            fec: config.fec,
            tx_power: config.tx_power,
        }
    }
}

impl Configuration {
    /// Merge a register echo into the configuration.
    ///
    /// The model is local-only and survives; the channel is re-normalized
    /// against the model's band so the derived frequency stays valid.
    pub fn apply_register(&mut self, image: &RegisterImage) {
        self.address = image.address;
        self.parity = image.parity;
        self.baud_rate = image.baud_rate;
        self.air_data_rate = image.air_data_rate;
        self.channel = image.channel;
        self.transmission_mode = image.transmission_mode;
        self.io_mode = image.io_mode;
        self.wakeup_time = image.wakeup_time;
        self.fec = image.fec;
        self.tx_power = image.tx_power;
        self.normalize();
    }
}

impl ToByteArray for RegisterImage {
    type Error = Infallible;
    type Array = [u8; 5];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let speed =
            (self.parity as u8) << 6 | (self.baud_rate as u8) << 3 | self.air_data_rate as u8;
        let option = (self.transmission_mode as u8) << 7
            | (self.io_mode as u8) << 6
            | (self.wakeup_time as u8) << 3
            | (self.fec as u8) << 2
            | self.tx_power as u8;
        Ok([
            (self.address >> 8) as u8,
            self.address as u8,
            speed,
            self.channel,
            option,
        ])
    }
}

impl FromByteArray for RegisterImage {
    type Error = DecodeError;
    type Array = [u8; REGISTER_LEN];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        // bytes[0] is the command header, read but not stored.
        let speed = bytes[3];
        let option = bytes[5];
        Ok(RegisterImage {
            address: u16::from_be_bytes([bytes[1], bytes[2]]),
            parity: Parity::try_from(speed >> 6)?,
            baud_rate: BaudRate::from_bits(speed >> 3),
            air_data_rate: AirDataRate::try_from(speed & 0b111)?,
            channel: bytes[4],
            transmission_mode: TransmissionMode::from_bits(option >> 7),
            io_mode: IoMode::from_bits(option >> 6),
            wakeup_time: WakeupTime::from_bits(option >> 3),
            fec: ForwardErrorCorrection::from_bits(option >> 2),
            tx_power: TxPower::from_bits(option),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARITIES: [Parity; 3] = [Parity::None, Parity::Odd, Parity::Even];
    const BAUD_RATES: [BaudRate; 8] = [
        BaudRate::B1200,
        BaudRate::B2400,
        BaudRate::B4800,
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
    ];
    const AIR_RATES: [AirDataRate; 6] = [
        AirDataRate::Bps300,
        AirDataRate::Bps1200,
        AirDataRate::Bps2400,
        AirDataRate::Bps4800,
        AirDataRate::Bps9600,
        AirDataRate::Bps19200,
    ];
    const WAKEUPS: [WakeupTime; 8] = [
        WakeupTime::Ms250,
        WakeupTime::Ms500,
        WakeupTime::Ms750,
        WakeupTime::Ms1000,
        WakeupTime::Ms1250,
        WakeupTime::Ms1500,
        WakeupTime::Ms1750,
        WakeupTime::Ms2000,
    ];
    const POWERS: [TxPower; 4] = [
        TxPower::Highest,
        TxPower::High,
        TxPower::Low,
        TxPower::Lowest,
    ];

    fn round_trip(image: RegisterImage) -> RegisterImage {
        let body = image.to_bytes().unwrap();
        let mut frame = [0u8; REGISTER_LEN];
        frame[0] = 0xC0;
        frame[1..].copy_from_slice(&body);
        RegisterImage::from_bytes(frame).unwrap()
    }

    #[test]
    fn default_configuration_encodes_to_known_bytes() {
        let image = RegisterImage::from(&Configuration::default());
        // speed = 00 011 010, option = 0 1 000 1 00
        assert_eq!(image.to_bytes().unwrap(), [0x00, 0x00, 0x1A, 0x06, 0x44]);
    }

    #[test]
    fn speed_byte_round_trips_for_every_table_entry() {
        let mut image = RegisterImage::from(&Configuration::default());
        for parity in PARITIES {
            for baud_rate in BAUD_RATES {
                for air_data_rate in AIR_RATES {
                    image.parity = parity;
                    image.baud_rate = baud_rate;
                    image.air_data_rate = air_data_rate;
                    assert_eq!(round_trip(image), image);
                }
            }
        }
    }

    #[test]
    fn option_byte_round_trips_for_every_table_entry() {
        let mut image = RegisterImage::from(&Configuration::default());
        for transmission_mode in [TransmissionMode::Transparent, TransmissionMode::Fixed] {
            for io_mode in [IoMode::Floating, IoMode::PushPull] {
                for wakeup_time in WAKEUPS {
                    for fec in [ForwardErrorCorrection::Off, ForwardErrorCorrection::On] {
                        for tx_power in POWERS {
                            image.transmission_mode = transmission_mode;
                            image.io_mode = io_mode;
                            image.wakeup_time = wakeup_time;
                            image.fec = fec;
                            image.tx_power = tx_power;
                            assert_eq!(round_trip(image), image);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn address_and_channel_round_trip() {
        let mut image = RegisterImage::from(&Configuration::default());
        for address in [0x0000u16, 0x0001, 0x1234, 0xABCD, 0xFFFF] {
            for channel in 0..=31u8 {
                image.address = address;
                image.channel = channel;
                assert_eq!(round_trip(image), image);
            }
        }
    }

    #[test]
    fn header_byte_is_ignored_on_decode() {
        let a = RegisterImage::from_bytes([0xC0, 0, 0, 0x1A, 6, 0x44]).unwrap();
        let b = RegisterImage::from_bytes([0xC1, 0, 0, 0x1A, 6, 0x44]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_parity_pattern_fails_decode() {
        let err = RegisterImage::from_bytes([0xC1, 0, 0, 0b11_011_010, 6, 0x44]).unwrap_err();
        assert_eq!(err, DecodeError::Parity(0b11));
    }

    #[test]
    fn unknown_air_rate_pattern_fails_decode() {
        let err = RegisterImage::from_bytes([0xC1, 0, 0, 0b00_011_110, 6, 0x44]).unwrap_err();
        assert_eq!(err, DecodeError::AirDataRate(0b110));
    }

    #[test]
    fn register_echo_preserves_model_and_renormalizes() {
        let mut config = Configuration::default();
        let mut image = RegisterImage::from(&config);
        image.address = 0x0102;
        image.channel = 4;
        config.apply_register(&image);
        assert_eq!(config.address, 0x0102);
        assert_eq!(config.channel, 4);
        assert_eq!(config.model, crate::config::Model::default());
        assert_eq!(config.frequency_mhz(), 866);
    }
}
