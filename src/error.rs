//! Driver error taxonomy and the sentinel status codes exposed at the
//! public boundary.
//!
//! Internally every operation reports a structured [`Error`]; the public
//! driver operations collapse it to [`Status::Nok`] (logging the cause on
//! the debug channel) so that callers can poll without unwinding. The
//! `try_*` variants on the driver expose the full error for tests and for
//! applications that want more than the sentinel.

use core::convert::Infallible;

use crate::commands::InvalidVersionHeader;
use crate::payload::PayloadError;
use crate::register::DecodeError;

/// Sentinel result of a driver operation.
///
/// Failures never propagate as panics or fatal errors; they collapse to
/// [`Status::Nok`] and the caller is expected to retry at its next polling
/// interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// The operation completed.
    Ok,
    /// The operation failed; the cause was reported on the debug channel.
    Nok,
}

impl Status {
    /// Returns `true` for [`Status::Ok`].
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

/// Internal error detail behind a [`Status::Nok`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The serial link failed to read or write.
    Serial(embedded_io::ErrorKind),
    /// A mode-select or status line failed to drive or read.
    Pin(embedded_hal::digital::ErrorKind),
    /// The module answered a command with an unexpected number of bytes.
    Response { expected: usize, got: usize },
    /// A configuration register response carried an unknown bit pattern.
    Register(DecodeError),
    /// A version response did not start with the version opcode.
    Version(InvalidVersionHeader),
    /// The payload could not be serialized or parsed.
    Payload(PayloadError),
    /// The configuration snapshot store rejected the snapshot.
    Snapshot,
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Register(err)
    }
}

impl From<InvalidVersionHeader> for Error {
    fn from(err: InvalidVersionHeader) -> Self {
        Error::Version(err)
    }
}

impl From<PayloadError> for Error {
    fn from(err: PayloadError) -> Self {
        Error::Payload(err)
    }
}

impl From<Infallible> for Error {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}
