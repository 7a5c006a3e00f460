// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interposition points for process environment access.
//!
//! The environment is process-wide mutable state and therefore a source of
//! nondeterminism between threads; every access is observable. The real
//! operations go through `std::env`, which is the direct binding here.

use detour_common::{EventRecord, Sysno, Value};
use log::trace;

use crate::session::Session;

/// Looks up an environment variable. A missing or non-UTF-8 variable yields
/// `None`; the report's result slot distinguishes found values from misses.
pub fn var(session: &Session, key: &str) -> Option<String> {
    let args = session.is_active().then(|| [Value::string(key)]);

    let value = std::env::var(key).ok();

    if let Some(args) = args {
        trace!(target: "detour", "[GETENV] {key}");
        let result = match &value {
            Some(value) => Value::string(value),
            None => Value::Unsupported,
        };
        session.report(EventRecord::new(Sysno::GetEnv, &args, &[result]));
    }

    value
}

pub fn set_var(session: &Session, key: &str, value: &str) {
    let args = session
        .is_active()
        .then(|| [Value::string(key), Value::string(value)]);

    std::env::set_var(key, value);

    if let Some(args) = args {
        trace!(target: "detour", "[SETENV] {key} {value}");
        session.report(EventRecord::new(Sysno::SetEnv, &args, &[Value::Error]));
    }
}

pub fn remove_var(session: &Session, key: &str) {
    let args = session.is_active().then(|| [Value::string(key)]);

    std::env::remove_var(key);

    if let Some(args) = args {
        trace!(target: "detour", "[UNSETENV] {key}");
        session.report(EventRecord::new(Sysno::UnsetEnv, &args, &[Value::Error]));
    }
}

/// Removes every environment variable of the process.
pub fn clear(session: &Session) {
    let gated = session.is_active();

    let keys: Vec<String> = std::env::vars().map(|(key, _)| key).collect();
    for key in &keys {
        std::env::remove_var(key);
    }

    if gated {
        trace!(target: "detour", "[CLEARENV]");
        session.report(EventRecord::new(Sysno::ClearEnv, &[], &[]));
    }
}

/// Snapshots the environment. The report carries only the variable count;
/// contents stay out of the fixed-size record.
pub fn vars(session: &Session) -> Vec<(String, String)> {
    let gated = session.is_active();

    let vars: Vec<(String, String)> = std::env::vars().collect();

    if gated {
        trace!(target: "detour", "[ENVIRON] {}", vars.len());
        session.report(EventRecord::new(
            Sysno::Environ,
            &[],
            &[Value::array(vars.len())],
        ));
    }

    vars
}
