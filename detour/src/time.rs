// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interposition points for clock reads and sleeps, the purest sources of
//! nondeterminism a replayed program has.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use detour_common::{EventRecord, Sysno, Value};
use log::trace;

use crate::session::Session;

/// Reads the wall clock. The report carries the observed instant as unix
/// nanoseconds, captured after the read.
pub fn now(session: &Session) -> SystemTime {
    let gated = session.is_active();

    let now = SystemTime::now();

    if gated {
        let nanos = now
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as i64);
        trace!(target: "detour", "[TIMENOW] {nanos}");
        session.report(EventRecord::new(
            Sysno::TimeNow,
            &[],
            &[Value::Integer64(nanos)],
        ));
    }

    now
}

/// Blocks the calling thread for at least `duration`.
pub fn sleep(session: &Session, duration: Duration) {
    let args = session
        .is_active()
        .then(|| [Value::Integer64(duration.as_nanos() as i64)]);

    std::thread::sleep(duration);

    if let Some(args) = args {
        trace!(target: "detour", "[SLEEP] {:?}", duration);
        session.report(EventRecord::new(Sysno::Sleep, &args, &[]));
    }
}
