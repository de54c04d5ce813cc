//! Operating mode control
//!
//! The E32 selects its operating mode through the two digital inputs M0 and
//! M1 and reports busy/idle through the AUX output:
//!
//! | mode                      | M0 | M1 | UART | radio                 |
//! |---------------------------|----|----|------|-----------------------|
//! | [`Normal`]                | 0  | 0  | on   | on                    |
//! | [`WakeUp`]                | 1  | 0  | on   | on, preamble added    |
//! | [`PowerSave`]             | 0  | 1  | off  | wake-on-radio receive |
//! | [`Sleep`]                 | 1  | 1  | on   | off, accepts commands |
//!
//! [`Normal`]: OperatingMode::Normal
//! [`WakeUp`]: OperatingMode::WakeUp
//! [`PowerSave`]: OperatingMode::PowerSave
//! [`Sleep`]: OperatingMode::Sleep
//!
//! # Important Notes
//! - After switching, the module needs a settle period before it is stable;
//!   [`ModeControl::set`] blocks for it before returning
//! - AUX is low while the module is busy and high when it is idle;
//!   [`ModeControl::wait_idle`] is a bounded best-effort wait with no
//!   timeout indication, so callers must tolerate a still-busy module

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, InputPin, OutputPin, PinState};

use crate::error::Error;

/// Settle delay after driving M0/M1, in milliseconds.
pub const MODE_SETTLE_MS: u32 = 50;
/// Interval between AUX polls, in milliseconds.
pub const IDLE_POLL_INTERVAL_MS: u32 = 10;
/// Maximum number of AUX polls before giving up silently.
pub const IDLE_POLL_LIMIT: u8 = 10;

/// Operating mode of the module, selected through M0/M1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// UART and radio on; transmit and receive.
    Normal,
    /// Like normal, but transmissions carry a preamble long enough to wake
    /// receivers sitting in power-save mode.
    WakeUp,
    /// UART off, radio in wake-on-radio receive; transmission not allowed.
    PowerSave,
    /// Radio off, UART on; the only mode that accepts commands.
    Sleep,
}

impl OperatingMode {
    /// (M0, M1) levels selecting this mode.
    pub const fn pin_levels(self) -> (bool, bool) {
        match self {
            OperatingMode::Normal => (false, false),
            OperatingMode::WakeUp => (true, false),
            OperatingMode::PowerSave => (false, true),
            OperatingMode::Sleep => (true, true),
        }
    }
}

/// Drives the M0/M1 mode-select lines and polls the AUX busy/idle line.
///
/// Tracks the most recently selected mode so the device layer can reason
/// about transitions explicitly instead of mirroring pin state.
#[derive(Debug)]
pub struct ModeControl<M0, M1, A> {
    m0: M0,
    m1: M1,
    aux: A,
    current: Option<OperatingMode>,
}

impl<M0, M1, A> ModeControl<M0, M1, A> {
    /// Wrap the three control lines. No pin is touched until the first
    /// [`set`](ModeControl::set).
    pub fn new(m0: M0, m1: M1, aux: A) -> Self {
        ModeControl {
            m0,
            m1,
            aux,
            current: None,
        }
    }

    /// Mode selected by the last successful [`set`](ModeControl::set), if
    /// any.
    pub fn current(&self) -> Option<OperatingMode> {
        self.current
    }

    /// Releases the three control lines.
    pub fn release(self) -> (M0, M1, A) {
        (self.m0, self.m1, self.aux)
    }
}

impl<M0, M1, A> ModeControl<M0, M1, A>
where
    M0: OutputPin,
    M1: OutputPin,
    A: InputPin,
{
    /// Drive M0/M1 to the pattern of `mode`, then block for the settle
    /// delay. The module must not be assumed stable before this returns.
    pub fn set(&mut self, mode: OperatingMode, delay: &mut impl DelayNs) -> Result<(), Error> {
        let (m0, m1) = mode.pin_levels();
        self.m0
            .set_state(PinState::from(m0))
            .map_err(|e| Error::Pin(e.kind()))?;
        self.m1
            .set_state(PinState::from(m1))
            .map_err(|e| Error::Pin(e.kind()))?;
        delay.delay_ms(MODE_SETTLE_MS);
        self.current = Some(mode);
        Ok(())
    }

    /// Poll AUX until the module reports idle, or until the poll budget is
    /// spent, whichever is first.
    ///
    /// Best effort: there is no way to tell "idle reached" apart from
    /// "budget spent". Errors are only reported for pin read failures.
    pub fn wait_idle(&mut self, delay: &mut impl DelayNs) -> Result<(), Error> {
        let mut polls = 0u8;
        while !self.aux.is_high().map_err(|e| Error::Pin(e.kind()))? {
            polls += 1;
            if polls == IDLE_POLL_LIMIT {
                break;
            }
            delay.delay_ms(IDLE_POLL_INTERVAL_MS);
        }
        Ok(())
    }
}
