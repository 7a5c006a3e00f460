// SPDX-License-Identifier: MIT OR Apache-2.0

//! The boundary through which event records leave the instrumented program.

use std::sync::mpsc;

use detour_common::{EventRecord, Sysno};

/// Receives one record per gated operation, synchronously on the thread that
/// performed the call.
///
/// Blocking inside [`report`](Reporter::report) holds that thread, which is
/// the intended mechanism for a scheduler to impose an order on otherwise
/// concurrent OS interactions. Delivery failure handling belongs to the
/// transport an implementation plugs into, not to this layer.
pub trait Reporter: Send + Sync {
    fn report(&self, sysno: Sysno, record: &EventRecord);
}

/// Discards every record. Used when a session is constructed with the gate
/// off and no scheduler attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _sysno: Sysno, _record: &EventRecord) {}
}

/// Forwards records over an in-process channel, for harnesses that consume
/// them from another thread.
#[derive(Clone)]
pub struct ChannelReporter {
    tx: mpsc::Sender<EventRecord>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::Receiver<EventRecord>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl Reporter for ChannelReporter {
    fn report(&self, _sysno: Sysno, record: &EventRecord) {
        // A gone receiver means nobody is scheduling us anymore; the real
        // operation already completed, so the record is simply dropped.
        let _ = self.tx.send(*record);
    }
}
