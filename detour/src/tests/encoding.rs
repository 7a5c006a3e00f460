// SPDX-License-Identifier: MIT OR Apache-2.0

use detour_common::{BoundedStr, EventRecord, Sysno, Value, ValueKind, EVENT_SLOTS, NAME_CAPACITY};

#[test]
fn bounded_str_exact_capacity_round_trips() {
    let input = "a".repeat(NAME_CAPACITY);
    let bounded = BoundedStr::truncate_from(&input);
    assert_eq!(bounded.as_str(), input);
    assert_eq!(bounded.len(), NAME_CAPACITY);
}

#[test]
fn bounded_str_one_over_loses_one_byte() {
    let input = "a".repeat(NAME_CAPACITY + 1);
    let bounded = BoundedStr::truncate_from(&input);
    assert_eq!(bounded.len(), NAME_CAPACITY);
    assert_eq!(bounded.as_str(), &input[..NAME_CAPACITY]);
}

#[test]
fn bounded_str_truncates_on_char_boundary() {
    // 255 ASCII bytes plus a two-byte scalar straddling the capacity limit:
    // the whole scalar must go, leaving 255 bytes.
    let input = format!("{}é", "a".repeat(NAME_CAPACITY - 1));
    assert_eq!(input.len(), NAME_CAPACITY + 1);

    let bounded = BoundedStr::truncate_from(&input);
    assert_eq!(bounded.len(), NAME_CAPACITY - 1);
    assert!(bounded.as_str().chars().all(|c| c == 'a'));
}

#[test]
fn truncation_is_deterministic() {
    let input = "x".repeat(4096);
    assert_eq!(
        BoundedStr::truncate_from(&input),
        BoundedStr::truncate_from(&input)
    );
}

#[test]
fn value_kinds_are_exclusive() {
    assert_eq!(Value::Integer(1).kind(), ValueKind::Integer);
    assert_eq!(Value::Integer64(1).kind(), ValueKind::Integer64);
    assert_eq!(Value::string("x").kind(), ValueKind::String);
    assert_eq!(Value::array(3).kind(), ValueKind::Array);
    assert_eq!(Value::handle("x").kind(), ValueKind::Handle);
    assert_eq!(Value::Unsupported.kind(), ValueKind::Unsupported);
    assert_eq!(Value::Error.kind(), ValueKind::Error);
}

#[test]
fn record_clips_at_capacity() {
    let too_many = vec![Value::Integer(7); EVENT_SLOTS + 2];
    let record = EventRecord::new(Sysno::Read, &too_many, &too_many);

    assert_eq!(record.num_args(), EVENT_SLOTS);
    assert_eq!(record.num_results(), EVENT_SLOTS);
    assert_eq!(record.args().len(), EVENT_SLOTS);
    assert_eq!(record.results().len(), EVENT_SLOTS);
}

#[test]
fn record_keeps_declared_counts() {
    let record = EventRecord::new(
        Sysno::Open,
        &[Value::string("/tmp/x"), Value::Integer(0)],
        &[Value::Unsupported, Value::Error],
    );

    assert_eq!(record.num_args(), 2);
    assert_eq!(record.num_results(), 2);
    assert_eq!(record.args()[0], Value::string("/tmp/x"));
    assert_eq!(record.results()[1], Value::Error);
}

#[test]
fn catalog_is_dense_and_zero_based() {
    for (index, sysno) in Sysno::ALL.iter().enumerate() {
        assert_eq!(sysno.id() as usize, index, "{} moved", sysno.name());
        assert_eq!(Sysno::from_id(index as u16), Some(*sysno));
    }
    assert_eq!(Sysno::ALL.len(), Sysno::COUNT);
    assert_eq!(Sysno::from_id(Sysno::COUNT as u16), None);
}

#[test]
fn catalog_identities_are_stable() {
    // Wire protocol: these numbers are shared with the scheduler and must
    // never change. Spot checks across the table.
    assert_eq!(Sysno::Read.id(), 0);
    assert_eq!(Sysno::Open.id(), 2);
    assert_eq!(Sysno::Lseek.id(), 7);
    assert_eq!(Sysno::Exit.id(), 24);
    assert_eq!(Sysno::Pipe2.id(), 31);
    assert_eq!(Sysno::TimeNow.id(), 39);
    assert_eq!(Sysno::SetDeadline.id(), 50);
    assert_eq!(Sysno::Socket.id(), 61);
    assert_eq!(Sysno::Sleep.id(), 63);
}

#[test]
fn record_display_is_one_line() {
    let record = EventRecord::new(
        Sysno::Open,
        &[
            Value::string("/tmp/x"),
            Value::Integer(577),
            Value::Integer(0o644),
        ],
        &[Value::Unsupported, Value::Error],
    );

    assert_eq!(
        record.to_string(),
        "open(str:\"/tmp/x\", int:577, int:420) -> [unsupported, error]"
    );
}
