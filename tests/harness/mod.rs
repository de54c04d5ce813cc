//! Scriptable fakes for the driver's hardware seams.
//!
//! Each fake hands out cheap clones sharing one interior state, so a test
//! can keep a handle while the driver owns the peripheral: queue receive
//! chunks, flip the AUX level, then inspect the write log and pin history
//! afterwards.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use e32::SnapshotStore;

#[derive(Default)]
struct UartState {
    rx: VecDeque<Vec<u8>>,
    writes: Vec<Vec<u8>>,
}

/// In-memory UART: reads pop queued chunks, writes are logged per call.
#[derive(Clone, Default)]
pub struct FakeUart {
    inner: Rc<RefCell<UartState>>,
}

impl FakeUart {
    /// Queue one chunk; each driver read consumes at most one chunk.
    pub fn push_rx(&self, bytes: &[u8]) {
        self.inner.borrow_mut().rx.push_back(bytes.to_vec());
    }

    /// Every write call in order, one entry per call.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.inner.borrow().writes.clone()
    }

    /// All written bytes flattened.
    pub fn written(&self) -> Vec<u8> {
        self.inner.borrow().writes.concat()
    }
}

impl embedded_io::ErrorType for FakeUart {
    type Error = Infallible;
}

impl embedded_io::Read for FakeUart {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut state = self.inner.borrow_mut();
        match state.rx.pop_front() {
            None => Ok(0),
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    state.rx.push_front(chunk[n..].to_vec());
                }
                Ok(n)
            }
        }
    }
}

impl embedded_io::ReadReady for FakeUart {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.inner.borrow().rx.is_empty())
    }
}

impl embedded_io::Write for FakeUart {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.inner.borrow_mut().writes.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Output pin recording every level it was driven to.
#[derive(Clone, Default)]
pub struct FakePin {
    levels: Rc<RefCell<Vec<bool>>>,
}

impl FakePin {
    pub fn history(&self) -> Vec<bool> {
        self.levels.borrow().clone()
    }

    pub fn last(&self) -> Option<bool> {
        self.levels.borrow().last().copied()
    }
}

impl embedded_hal::digital::ErrorType for FakePin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(true);
        Ok(())
    }
}

struct AuxState {
    high: bool,
    reads: usize,
}

/// AUX busy/idle line with a settable level and a read counter.
///
/// Starts high (idle).
#[derive(Clone)]
pub struct FakeAux {
    inner: Rc<RefCell<AuxState>>,
}

impl Default for FakeAux {
    fn default() -> Self {
        FakeAux {
            inner: Rc::new(RefCell::new(AuxState {
                high: true,
                reads: 0,
            })),
        }
    }
}

impl FakeAux {
    pub fn set_high(&self) {
        self.inner.borrow_mut().high = true;
    }

    pub fn set_low(&self) {
        self.inner.borrow_mut().high = false;
    }

    /// Number of level reads the driver performed.
    pub fn reads(&self) -> usize {
        self.inner.borrow().reads
    }
}

impl embedded_hal::digital::ErrorType for FakeAux {
    type Error = Infallible;
}

impl embedded_hal::digital::InputPin for FakeAux {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mut state = self.inner.borrow_mut();
        state.reads += 1;
        Ok(state.high)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Delay provider that only accumulates the requested time.
#[derive(Clone, Default)]
pub struct FakeDelay {
    ns: Rc<RefCell<u64>>,
}

impl FakeDelay {
    /// Total delay requested so far, in milliseconds.
    pub fn ms(&self) -> u64 {
        *self.ns.borrow() / 1_000_000
    }
}

impl embedded_hal::delay::DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.ns.borrow_mut() += u64::from(ns);
    }
}

/// Snapshot store keeping every persisted snapshot in order.
#[derive(Clone, Default)]
pub struct VecStore {
    saves: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl VecStore {
    pub fn saves(&self) -> Vec<Vec<u8>> {
        self.saves.borrow().clone()
    }
}

impl SnapshotStore for VecStore {
    type Error = Infallible;

    fn persist(&mut self, snapshot: &[u8]) -> Result<(), Self::Error> {
        self.saves.borrow_mut().push(snapshot.to_vec());
        Ok(())
    }
}
