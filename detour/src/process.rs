// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interposition points for process identity and lifecycle queries.

use std::{io, path::PathBuf};

use detour_common::{EventRecord, Sysno, Value};
use log::trace;

use crate::session::Session;

fn identity_query(session: &Session, sysno: Sysno, value: isize) {
    trace!(target: "detour", "[{}] {value}", sysno.name());
    session.report(EventRecord::new(sysno, &[], &[Value::Integer(value)]));
}

pub fn id(session: &Session) -> u32 {
    let pid = unsafe { libc::getpid() };
    if session.is_active() {
        identity_query(session, Sysno::GetPid, pid as isize);
    }
    pid as u32
}

pub fn parent_id(session: &Session) -> u32 {
    let ppid = unsafe { libc::getppid() };
    if session.is_active() {
        identity_query(session, Sysno::GetPpid, ppid as isize);
    }
    ppid as u32
}

pub fn uid(session: &Session) -> u32 {
    let uid = unsafe { libc::getuid() };
    if session.is_active() {
        identity_query(session, Sysno::GetUid, uid as isize);
    }
    uid
}

pub fn euid(session: &Session) -> u32 {
    let euid = unsafe { libc::geteuid() };
    if session.is_active() {
        identity_query(session, Sysno::GetEuid, euid as isize);
    }
    euid
}

pub fn gid(session: &Session) -> u32 {
    let gid = unsafe { libc::getgid() };
    if session.is_active() {
        identity_query(session, Sysno::GetGid, gid as isize);
    }
    gid
}

pub fn egid(session: &Session) -> u32 {
    let egid = unsafe { libc::getegid() };
    if session.is_active() {
        identity_query(session, Sysno::GetEgid, egid as isize);
    }
    egid
}

/// Returns the supplementary group ids of the process.
pub fn groups(session: &Session) -> io::Result<Vec<u32>> {
    let gated = session.is_active();

    let count = unsafe { libc::getgroups(0, std::ptr::null_mut()) };
    let mut err = (count < 0).then(io::Error::last_os_error);

    let mut gids = vec![0 as libc::gid_t; count.max(0) as usize];
    if err.is_none() && count > 0 {
        let res = unsafe { libc::getgroups(count, gids.as_mut_ptr()) };
        err = (res < 0).then(io::Error::last_os_error);
        if res >= 0 {
            gids.truncate(res as usize);
        }
    }

    if gated {
        trace!(target: "detour", "[GETGROUPS] {}", gids.len());
        let result = if err.is_none() {
            Value::array(gids.len())
        } else {
            Value::Unsupported
        };
        session.report(EventRecord::new(
            Sysno::GetGroups,
            &[],
            &[result, Value::Error],
        ));
    }

    match err {
        Some(err) => Err(err),
        None => Ok(gids.into_iter().map(|gid| gid as u32).collect()),
    }
}

/// Sends `signal` to `pid`.
pub fn kill(session: &Session, pid: i32, signal: i32) -> io::Result<()> {
    let args = session
        .is_active()
        .then(|| [Value::Integer(pid as isize), Value::Integer(signal as isize)]);

    let res = unsafe { libc::kill(pid as libc::pid_t, signal as libc::c_int) };
    let err = (res < 0).then(io::Error::last_os_error);

    if let Some(args) = args {
        trace!(target: "detour", "[KILL] {pid} {signal}");
        session.report(EventRecord::new(Sysno::Kill, &args, &[Value::Error]));
    }

    match err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Waits for the child `pid` to change state, returning its raw wait status.
pub fn wait(session: &Session, pid: i32) -> io::Result<i32> {
    let args = session.is_active().then(|| [Value::Integer(pid as isize)]);

    let mut status: libc::c_int = 0;
    let res = unsafe { libc::waitpid(pid as libc::pid_t, &mut status, 0) };
    let err = (res < 0).then(io::Error::last_os_error);

    if let Some(args) = args {
        trace!(target: "detour", "[WAIT4] {pid}");
        session.report(EventRecord::new(
            Sysno::Wait4,
            &args,
            &[Value::Integer(res.max(0) as isize), Value::Error],
        ));
    }

    match err {
        Some(err) => Err(err),
        None => Ok(status),
    }
}

/// Terminates the process with `code`. The one wrapper whose real operation
/// never returns, so the report necessarily precedes it.
pub fn exit(session: &Session, code: i32) -> ! {
    if session.is_active() {
        trace!(target: "detour", "[EXIT] {code}");
        session.report(EventRecord::new(
            Sysno::Exit,
            &[Value::Integer(code as isize)],
            &[],
        ));
    }

    std::process::exit(code)
}

/// Returns the path of the executable that started the process.
pub fn executable(session: &Session) -> io::Result<PathBuf> {
    let gated = session.is_active();

    let res = std::env::current_exe();

    if gated {
        trace!(target: "detour", "[EXECUTABLE]");
        let result = match &res {
            Ok(path) => Value::string(&path.to_string_lossy()),
            Err(_) => Value::Unsupported,
        };
        session.report(EventRecord::new(
            Sysno::Executable,
            &[],
            &[result, Value::Error],
        ));
    }

    res
}

/// Returns the current working directory.
pub fn getwd(session: &Session) -> io::Result<PathBuf> {
    let gated = session.is_active();

    let res = std::env::current_dir();

    if gated {
        trace!(target: "detour", "[GETWD]");
        let result = match &res {
            Ok(path) => Value::string(&path.to_string_lossy()),
            Err(_) => Value::Unsupported,
        };
        session.report(EventRecord::new(
            Sysno::Getwd,
            &[],
            &[result, Value::Error],
        ));
    }

    res
}

pub fn page_size(session: &Session) -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

    if session.is_active() {
        identity_query(session, Sysno::GetPageSize, size.max(0) as isize);
    }

    size.max(0) as usize
}
