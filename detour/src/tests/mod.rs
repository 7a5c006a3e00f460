// SPDX-License-Identifier: MIT OR Apache-2.0

mod encoding;
mod filesystem;

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use detour_common::{EventRecord, Sysno};

use crate::{reporter::Reporter, session::Session};

/// Captures every record for later assertions.
#[derive(Clone, Default)]
pub struct Recorder {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl Recorder {
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn count(&self, sysno: Sysno) -> usize {
        self.records()
            .iter()
            .filter(|record| record.sysno() == sysno)
            .count()
    }

    pub fn last(&self, sysno: Sysno) -> EventRecord {
        self.records()
            .iter()
            .rev()
            .find(|record| record.sysno() == sysno)
            .copied()
            .unwrap_or_else(|| panic!("no record for {}", sysno.name()))
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

impl Reporter for Recorder {
    fn report(&self, _sysno: Sysno, record: &EventRecord) {
        self.records.lock().unwrap().push(*record);
    }
}

pub fn recording_session() -> (Session, Recorder) {
    let recorder = Recorder::default();
    (Session::new(recorder.clone()), recorder)
}

/// A path under the system temp directory, unique per test and process.
pub fn temp_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("detour_test_{tag}_{}", std::process::id()))
}
