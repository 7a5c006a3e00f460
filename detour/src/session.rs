// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session ties the profiling gate to an injected reporter.
//!
//! There is deliberately no global state here: a session is an explicitly
//! constructed handle, and every wrapped operation works against the one it
//! was given. Tests run any number of isolated sessions side by side.

use std::sync::Arc;

use detour_common::EventRecord;

use crate::reporter::{NullReporter, Reporter};

/// Environment variable consulted by [`Session::from_env`].
pub const PROFILE_ENV_VAR: &str = "DETOUR_PROFILE";

/// Gate plus reporting channel for one instrumented session.
///
/// Cloning is cheap (an `Arc` bump); file and socket wrappers keep a clone so
/// their operations report to the session that opened them. The gate is fixed
/// at construction and read on every interposition point; checking it is a
/// plain field load with no synchronization beyond the `Arc`.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    active: bool,
    reporter: Box<dyn Reporter>,
}

impl Session {
    /// A session with the gate on, reporting to `reporter`.
    pub fn new(reporter: impl Reporter + 'static) -> Self {
        Self::with_gate(true, reporter)
    }

    pub fn with_gate(active: bool, reporter: impl Reporter + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                active,
                reporter: Box::new(reporter),
            }),
        }
    }

    /// A session whose interposition points do nothing beyond the gate check.
    pub fn disabled() -> Self {
        Self::with_gate(false, NullReporter)
    }

    /// Gate state taken from the `DETOUR_PROFILE` environment variable
    /// (`"1"` or `"true"`). How the gate gets configured is owned by the
    /// surrounding harness; this is the conventional hook.
    pub fn from_env(reporter: impl Reporter + 'static) -> Self {
        let active = match std::env::var(PROFILE_ENV_VAR) {
            Ok(value) => value == "1" || value.eq_ignore_ascii_case("true"),
            Err(_) => false,
        };
        Self::with_gate(active, reporter)
    }

    /// Whether gated operations report. Side-effect free.
    pub fn is_active(&self) -> bool {
        self.inner.active
    }

    /// Hands one completed operation's record to the reporter. Callers have
    /// already checked the gate; a record, once built, is delivered exactly
    /// once.
    pub(crate) fn report(&self, record: EventRecord) {
        self.inner.reporter.report(record.sysno(), &record);
    }
}
