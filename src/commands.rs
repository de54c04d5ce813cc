//! Command channel vocabulary
//!
//! This module contains the commands the E32 accepts over the serial link
//! while it is held in sleep mode (M0=1, M1=1):
//!
//! - [`SetConfigPersistent`] (0xC0): write the configuration register,
//!   retained across power-down
//! - [`GetConfig`] (0xC1): read the configuration register
//! - [`SetConfigVolatile`] (0xC2): write the configuration register,
//!   lost on power-down
//! - [`GetVersion`] (0xC3): read the 4-byte version frame
//! - [`Reset`] (0xC4): reboot the module
//!
//! # Wire format
//! Read-style commands (get config, get version, reset) are framed as the
//! opcode repeated three times. Set-style commands are framed as the opcode
//! followed by the 5-byte register body. The module answers get/set config
//! with the full 6-byte register and get version with 4 bytes; reset gives
//! no structured response at all.
//!
//! # Important Notes
//! - Commands are only accepted in sleep mode; the device layer owns that
//!   transition
//! - A response of unexpected length is a protocol error, never retried
//! - The version frame's frequency byte is informational: unknown values
//!   decode to `None` rather than failing the whole exchange

use core::convert::Infallible;

use regiface::{Command, FromByteArray, NoParameters, ToByteArray};

use crate::register::RegisterImage;

/// Opcode repeated twice after the command id byte, forming the 3-byte
/// frame of a read-style command.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeEcho(pub u8);

impl ToByteArray for OpcodeEcho {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.0, self.0])
    }
}

/// Whether a configuration write survives power-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SaveMode {
    /// 0xC0: saved to non-volatile storage in the module.
    Persistent,
    /// 0xC2: applied until the next power-down.
    Volatile,
}

/// GetConfig command (0xC1)
///
/// Reads the 6-byte configuration register back from the module.
#[derive(Debug, Clone)]
pub struct GetConfig;

impl Command for GetConfig {
    type IdType = u8;
    type CommandParameters = OpcodeEcho;
    type ResponseParameters = RegisterImage;

    fn id() -> Self::IdType {
        0xC1
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        OpcodeEcho(0xC1)
    }
}

/// SetConfigPersistent command (0xC0)
///
/// Writes the configuration register; the module retains it across
/// power-down. The module echoes the accepted register back.
#[derive(Debug, Clone)]
pub struct SetConfigPersistent {
    pub register: RegisterImage,
}

impl Command for SetConfigPersistent {
    type IdType = u8;
    type CommandParameters = RegisterImage;
    type ResponseParameters = RegisterImage;

    fn id() -> Self::IdType {
        0xC0
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.register
    }
}

/// SetConfigVolatile command (0xC2)
///
/// Writes the configuration register without persisting it in the module.
#[derive(Debug, Clone)]
pub struct SetConfigVolatile {
    pub register: RegisterImage,
}

impl Command for SetConfigVolatile {
    type IdType = u8;
    type CommandParameters = RegisterImage;
    type ResponseParameters = RegisterImage;

    fn id() -> Self::IdType {
        0xC2
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.register
    }
}

/// GetVersion command (0xC3)
///
/// Reads the 4-byte version frame: header, frequency code, version,
/// features.
#[derive(Debug, Clone)]
pub struct GetVersion;

impl Command for GetVersion {
    type IdType = u8;
    type CommandParameters = OpcodeEcho;
    type ResponseParameters = Version;

    fn id() -> Self::IdType {
        0xC3
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        OpcodeEcho(0xC3)
    }
}

/// Reset command (0xC4)
///
/// Reboots the module. The module gives no structured response; the device
/// layer returns without reading.
#[derive(Debug, Clone)]
pub struct Reset;

impl Command for Reset {
    type IdType = u8;
    type CommandParameters = OpcodeEcho;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0xC4
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        OpcodeEcho(0xC4)
    }
}

/// Error type for version frames not starting with the 0xC3 opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidVersionHeader(pub u8);

/// Decoded version frame.
///
/// Purely informational: reading it never mutates the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Version {
    /// Operating band reported by the module, `None` when the frequency
    /// code is not in the published table.
    pub frequency_mhz: Option<u16>,
    pub version: u8,
    pub features: u8,
}

impl FromByteArray for Version {
    type Error = InvalidVersionHeader;
    type Array = [u8; 4];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        if bytes[0] != 0xC3 {
            return Err(InvalidVersionHeader(bytes[0]));
        }
        let frequency_mhz = match bytes[1] {
            0x32 => Some(433),
            0x38 => Some(470),
            0x44 => Some(915),
            0x45 => Some(868),
            0x46 => Some(170),
            _ => None,
        };
        Ok(Version {
            frequency_mhz,
            version: bytes[2],
            features: bytes[3],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_commands_echo_their_opcode() {
        assert_eq!(GetConfig.invoking_parameters().to_bytes().unwrap(), [0xC1; 2]);
        assert_eq!(GetVersion.invoking_parameters().to_bytes().unwrap(), [0xC3; 2]);
        assert_eq!(Reset.invoking_parameters().to_bytes().unwrap(), [0xC4; 2]);
    }

    #[test]
    fn version_frame_decodes_known_frequency_codes() {
        let version = Version::from_bytes([0xC3, 0x45, 7, 30]).unwrap();
        assert_eq!(
            version,
            Version {
                frequency_mhz: Some(868),
                version: 7,
                features: 30
            }
        );
        assert_eq!(
            Version::from_bytes([0xC3, 0x32, 0, 0]).unwrap().frequency_mhz,
            Some(433)
        );
    }

    #[test]
    fn version_frame_with_unknown_frequency_is_informational() {
        let version = Version::from_bytes([0xC3, 0x99, 1, 2]).unwrap();
        assert_eq!(version.frequency_mhz, None);
        assert_eq!(version.version, 1);
    }

    #[test]
    fn version_frame_with_wrong_header_is_rejected() {
        assert_eq!(
            Version::from_bytes([0xC1, 0x45, 0, 0]),
            Err(InvalidVersionHeader(0xC1))
        );
    }
}
