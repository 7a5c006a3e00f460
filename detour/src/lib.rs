// SPDX-License-Identifier: MIT OR Apache-2.0

//! Syscall interposition and event reporting for deterministic testing.
//!
//! Every OS-facing operation offered by this crate is an interposition point:
//! a thin wrapper around the real call that, when the session's gate is
//! active, hands a fixed-shape [`EventRecord`] describing the completed call
//! to an injected [`Reporter`]. The reporter boundary is where an external
//! deterministic scheduler observes (and, by blocking, orders) the program's
//! OS-level nondeterminism. Instrumentation never changes what the caller
//! sees: return values and errors pass through untouched.
//!
//! ```no_run
//! use detour::{fs, ChannelReporter, Session};
//!
//! # fn main() -> std::io::Result<()> {
//! let (reporter, events) = ChannelReporter::new();
//! let session = Session::new(reporter);
//!
//! let mut file = fs::File::create(&session, "/tmp/x")?;
//! use std::io::Write as _;
//! file.write_all(b"hello")?;
//! drop(file);
//!
//! for record in events.try_iter() {
//!     println!("{record}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod env;
pub mod fs;
pub mod net;
pub mod process;
pub mod reporter;
pub mod session;
pub mod time;

#[cfg(test)]
mod tests;

pub use detour_common::{
    BoundedStr, EventRecord, Sysno, Value, ValueKind, EVENT_SLOTS, NAME_CAPACITY,
};
pub use reporter::{ChannelReporter, NullReporter, Reporter};
pub use session::Session;
