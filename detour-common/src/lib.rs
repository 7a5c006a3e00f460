// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared vocabulary between an instrumented program and the external
//! deterministic scheduler: tagged values, the fixed-shape event record, and
//! the syscall catalog.
//!
//! Everything in this crate is part of the wire contract. Records are plain
//! `Copy` snapshots with no heap allocation, so building one on the hot path
//! of an intercepted call costs a few stack writes.

use core::fmt;

pub mod syscalls;

pub use syscalls::Sysno;

/// Capacity of the textual payload carried by [`Value::String`] and
/// [`Value::Handle`]. Longer inputs are silently truncated.
pub const NAME_CAPACITY: usize = 256;

/// Number of argument and result slots in an [`EventRecord`].
pub const EVENT_SLOTS: usize = 10;

/// Fixed-capacity UTF-8 string used for paths and handle names.
///
/// Construction copies at most [`NAME_CAPACITY`] bytes and truncates on a
/// character boundary, so the stored prefix is always valid UTF-8. Truncation
/// is documented lossy behavior, not an error.
#[derive(Clone, Copy)]
pub struct BoundedStr {
    len: usize,
    buf: [u8; NAME_CAPACITY],
}

impl BoundedStr {
    pub const fn empty() -> Self {
        Self {
            len: 0,
            buf: [0; NAME_CAPACITY],
        }
    }

    /// Copies `s` up to capacity, backing off to the nearest character
    /// boundary so the kept prefix stays representable.
    pub fn truncate_from(s: &str) -> Self {
        let mut end = s.len().min(NAME_CAPACITY);
        while !s.is_char_boundary(end) {
            end -= 1;
        }

        let mut buf = [0u8; NAME_CAPACITY];
        buf[..end].copy_from_slice(&s.as_bytes()[..end]);

        Self { len: end, buf }
    }

    pub fn as_str(&self) -> &str {
        // Always a prefix produced by truncate_from, so this cannot fail.
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PartialEq for BoundedStr {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for BoundedStr {}

impl From<&str> for BoundedStr {
    fn from(s: &str) -> Self {
        Self::truncate_from(s)
    }
}

impl fmt::Debug for BoundedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for BoundedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One encoded argument or return value. Exactly one kind is active.
///
/// Encoding never fails: values whose representation is not captured degrade
/// to [`Value::Unsupported`], and over-long text degrades to truncation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Value {
    /// Machine-word integer: flags, descriptors, counts, pids, modes.
    Integer(isize),
    /// 64-bit integer: offsets, sizes, nanosecond durations and timestamps.
    Integer64(i64),
    /// Bounded text, used for paths and names.
    String(BoundedStr),
    /// Length-only capture of a buffer argument. Contents are never copied;
    /// the record stays fixed-size and allocation-free.
    Array { len: usize },
    /// Bounded name identifying an open file or socket.
    Handle(BoundedStr),
    /// Placeholder for a value intentionally not captured, such as a returned
    /// handle or raw pointer. Lossy, not an error.
    Unsupported,
    /// Presence-only marker for a fallible return slot. The concrete error
    /// payload is not serialized at this layer.
    Error,
}

impl Value {
    pub fn string(s: &str) -> Self {
        Value::String(BoundedStr::truncate_from(s))
    }

    pub fn handle(name: &str) -> Self {
        Value::Handle(BoundedStr::truncate_from(name))
    }

    pub fn array(len: usize) -> Self {
        Value::Array { len }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Integer64(_) => ValueKind::Integer64,
            Value::String(_) => ValueKind::String,
            Value::Array { .. } => ValueKind::Array,
            Value::Handle(_) => ValueKind::Handle,
            Value::Unsupported => ValueKind::Unsupported,
            Value::Error => ValueKind::Error,
        }
    }
}

/// Kind tag of a [`Value`], without its payload.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ValueKind {
    Integer,
    Integer64,
    String,
    Array,
    Handle,
    Unsupported,
    Error,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "int:{v}"),
            Value::Integer64(v) => write!(f, "int64:{v}"),
            Value::String(s) => write!(f, "str:{s:?}"),
            Value::Array { len } => write!(f, "array:{len}"),
            Value::Handle(s) => write!(f, "handle:{s:?}"),
            Value::Unsupported => f.write_str("unsupported"),
            Value::Error => f.write_str("error"),
        }
    }
}

/// Fixed-shape snapshot of one completed operation: catalog identity,
/// declared counts, and the encoded argument and result lists.
///
/// Immutable once constructed. The declared counts can never exceed
/// [`EVENT_SLOTS`]; anything beyond capacity is clipped at construction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EventRecord {
    sysno: Sysno,
    num_args: u8,
    num_results: u8,
    args: [Value; EVENT_SLOTS],
    results: [Value; EVENT_SLOTS],
}

impl EventRecord {
    pub fn new(sysno: Sysno, args: &[Value], results: &[Value]) -> Self {
        let mut record = Self {
            sysno,
            num_args: args.len().min(EVENT_SLOTS) as u8,
            num_results: results.len().min(EVENT_SLOTS) as u8,
            args: [Value::Unsupported; EVENT_SLOTS],
            results: [Value::Unsupported; EVENT_SLOTS],
        };

        for (slot, value) in record.args.iter_mut().zip(args) {
            *slot = *value;
        }
        for (slot, value) in record.results.iter_mut().zip(results) {
            *slot = *value;
        }

        record
    }

    pub fn sysno(&self) -> Sysno {
        self.sysno
    }

    /// The populated argument slots, in call order.
    pub fn args(&self) -> &[Value] {
        &self.args[..self.num_args as usize]
    }

    /// The populated result slots, reflecting the post-call outcome.
    pub fn results(&self) -> &[Value] {
        &self.results[..self.num_results as usize]
    }

    pub fn num_args(&self) -> usize {
        self.num_args as usize
    }

    pub fn num_results(&self) -> usize {
        self.num_results as usize
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.sysno.name())?;
        for (i, arg) in self.args().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")?;
        if self.num_results > 0 {
            f.write_str(" -> [")?;
            for (i, result) in self.results().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{result}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}
