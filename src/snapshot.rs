//! Configuration snapshot persistence
//!
//! Every committed configuration change is mirrored to a host-side store so
//! the settings survive the host's own power cycle (the module persists its
//! register itself; the snapshot keeps the host's view, including the
//! local-only model and derived frequency). The store is a seam: targets
//! with a filesystem or flash page implement [`SnapshotStore`], everything
//! else uses [`NoSnapshot`].
//!
//! The snapshot format is a flat JSON object so it stays readable in place:
//!
//! ```text
//! {"model":"868T20D","frequency":868,"address":0,"channel":6,...}
//! ```

use core::convert::Infallible;
use core::fmt::Write;

use heapless::String;

use crate::config::Configuration;
use crate::payload::PayloadError;

/// Upper bound of a rendered snapshot in bytes.
pub const SNAPSHOT_CAPACITY: usize = 192;

/// Sink for configuration snapshots.
///
/// `persist` must either durably store the bytes or fail; a partial write
/// reported as success would leave a stale snapshot behind.
pub trait SnapshotStore {
    type Error;

    fn persist(&mut self, snapshot: &[u8]) -> Result<(), Self::Error>;
}

/// Store that drops every snapshot. Default for hosts without storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSnapshot;

impl SnapshotStore for NoSnapshot {
    type Error = Infallible;

    fn persist(&mut self, _snapshot: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Render the configuration as its snapshot JSON.
pub fn render(
    config: &Configuration,
) -> Result<String<SNAPSHOT_CAPACITY>, PayloadError> {
    let mut out = String::new();
    write!(
        out,
        concat!(
            "{{\"model\":\"{}\",\"frequency\":{},\"address\":{},\"channel\":{},",
            "\"baudrate\":{},\"parity\":\"{}\",\"datarate\":\"{}\",",
            "\"transmode\":\"{}\",\"iomode\":{},\"wutime\":{},\"fec\":{},\"txpower\":{}}}"
        ),
        config.model,
        config.frequency_mhz(),
        config.address,
        config.channel,
        config.baud_rate.bps(),
        config.parity.as_str(),
        config.air_data_rate.as_str(),
        config.transmission_mode.as_str(),
        config.io_mode as u8,
        config.wakeup_time.millis(),
        config.fec as u8,
        config.tx_power.dbm(config.model.power),
    )
    .map_err(|_| PayloadError::Overflow)?;
    Ok(out)
}
