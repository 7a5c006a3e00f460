// SPDX-License-Identifier: MIT OR Apache-2.0

//! The syscall catalog: the stable numbering of interceptable operations,
//! shared between the instrumented program and the scheduler.
//!
//! Identities are dense, zero-based, and part of the wire protocol. New
//! operations are appended at the end; reassigning or reordering existing
//! entries breaks compatibility with deployed schedulers.

/// Catalog identity of one interceptable operation.
#[repr(u16)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sysno {
    Read = 0,
    Write = 1,
    Open = 2,
    Close = 3,
    Stat = 4,
    Fstat = 5,
    Lstat = 6,
    Lseek = 7,
    Pread64 = 8,
    Pwrite64 = 9,
    GetPageSize = 10,
    Executable = 11,
    GetPid = 12,
    GetPpid = 13,
    Getwd = 14,
    ReadDir = 15,
    ReadDirNames = 16,
    Wait4 = 17,
    Kill = 18,
    GetUid = 19,
    GetEuid = 20,
    GetGid = 21,
    GetEgid = 22,
    GetGroups = 23,
    Exit = 24,
    Rename = 25,
    Truncate = 26,
    Unlink = 27,
    Rmdir = 28,
    Link = 29,
    Symlink = 30,
    Pipe2 = 31,
    Mkdir = 32,
    Chdir = 33,
    UnsetEnv = 34,
    GetEnv = 35,
    SetEnv = 36,
    ClearEnv = 37,
    Environ = 38,
    TimeNow = 39,
    ReadLink = 40,
    Chmod = 41,
    Fchmod = 42,
    Chown = 43,
    Lchown = 44,
    Fchown = 45,
    Ftruncate = 46,
    Fsync = 47,
    Utimes = 48,
    Fchdir = 49,
    SetDeadline = 50,
    SetReadDeadline = 51,
    SetWriteDeadline = 52,
    NetRead = 53,
    NetWrite = 54,
    NetClose = 55,
    NetSetDeadline = 56,
    NetSetReadDeadline = 57,
    NetSetWriteDeadline = 58,
    NetSetReadBuffer = 59,
    NetSetWriteBuffer = 60,
    Socket = 61,
    ListenTcp = 62,
    Sleep = 63,
}

impl Sysno {
    pub const COUNT: usize = 64;

    /// Every catalog entry, indexed by identity.
    pub const ALL: [Sysno; Self::COUNT] = [
        Sysno::Read,
        Sysno::Write,
        Sysno::Open,
        Sysno::Close,
        Sysno::Stat,
        Sysno::Fstat,
        Sysno::Lstat,
        Sysno::Lseek,
        Sysno::Pread64,
        Sysno::Pwrite64,
        Sysno::GetPageSize,
        Sysno::Executable,
        Sysno::GetPid,
        Sysno::GetPpid,
        Sysno::Getwd,
        Sysno::ReadDir,
        Sysno::ReadDirNames,
        Sysno::Wait4,
        Sysno::Kill,
        Sysno::GetUid,
        Sysno::GetEuid,
        Sysno::GetGid,
        Sysno::GetEgid,
        Sysno::GetGroups,
        Sysno::Exit,
        Sysno::Rename,
        Sysno::Truncate,
        Sysno::Unlink,
        Sysno::Rmdir,
        Sysno::Link,
        Sysno::Symlink,
        Sysno::Pipe2,
        Sysno::Mkdir,
        Sysno::Chdir,
        Sysno::UnsetEnv,
        Sysno::GetEnv,
        Sysno::SetEnv,
        Sysno::ClearEnv,
        Sysno::Environ,
        Sysno::TimeNow,
        Sysno::ReadLink,
        Sysno::Chmod,
        Sysno::Fchmod,
        Sysno::Chown,
        Sysno::Lchown,
        Sysno::Fchown,
        Sysno::Ftruncate,
        Sysno::Fsync,
        Sysno::Utimes,
        Sysno::Fchdir,
        Sysno::SetDeadline,
        Sysno::SetReadDeadline,
        Sysno::SetWriteDeadline,
        Sysno::NetRead,
        Sysno::NetWrite,
        Sysno::NetClose,
        Sysno::NetSetDeadline,
        Sysno::NetSetReadDeadline,
        Sysno::NetSetWriteDeadline,
        Sysno::NetSetReadBuffer,
        Sysno::NetSetWriteBuffer,
        Sysno::Socket,
        Sysno::ListenTcp,
        Sysno::Sleep,
    ];

    pub const fn id(self) -> u16 {
        self as u16
    }

    pub fn from_id(id: u16) -> Option<Sysno> {
        Self::ALL.get(id as usize).copied()
    }

    /// Protocol-level operation name, used by the diagnostic output.
    pub const fn name(self) -> &'static str {
        match self {
            Sysno::Read => "read",
            Sysno::Write => "write",
            Sysno::Open => "open",
            Sysno::Close => "close",
            Sysno::Stat => "stat",
            Sysno::Fstat => "fstat",
            Sysno::Lstat => "lstat",
            Sysno::Lseek => "lseek",
            Sysno::Pread64 => "pread64",
            Sysno::Pwrite64 => "pwrite64",
            Sysno::GetPageSize => "getpagesize",
            Sysno::Executable => "executable",
            Sysno::GetPid => "getpid",
            Sysno::GetPpid => "getppid",
            Sysno::Getwd => "getwd",
            Sysno::ReadDir => "readdir",
            Sysno::ReadDirNames => "readdirnames",
            Sysno::Wait4 => "wait4",
            Sysno::Kill => "kill",
            Sysno::GetUid => "getuid",
            Sysno::GetEuid => "geteuid",
            Sysno::GetGid => "getgid",
            Sysno::GetEgid => "getegid",
            Sysno::GetGroups => "getgroups",
            Sysno::Exit => "exit",
            Sysno::Rename => "rename",
            Sysno::Truncate => "truncate",
            Sysno::Unlink => "unlink",
            Sysno::Rmdir => "rmdir",
            Sysno::Link => "link",
            Sysno::Symlink => "symlink",
            Sysno::Pipe2 => "pipe2",
            Sysno::Mkdir => "mkdir",
            Sysno::Chdir => "chdir",
            Sysno::UnsetEnv => "unsetenv",
            Sysno::GetEnv => "getenv",
            Sysno::SetEnv => "setenv",
            Sysno::ClearEnv => "clearenv",
            Sysno::Environ => "environ",
            Sysno::TimeNow => "timenow",
            Sysno::ReadLink => "readlink",
            Sysno::Chmod => "chmod",
            Sysno::Fchmod => "fchmod",
            Sysno::Chown => "chown",
            Sysno::Lchown => "lchown",
            Sysno::Fchown => "fchown",
            Sysno::Ftruncate => "ftruncate",
            Sysno::Fsync => "fsync",
            Sysno::Utimes => "utimes",
            Sysno::Fchdir => "fchdir",
            Sysno::SetDeadline => "setdeadline",
            Sysno::SetReadDeadline => "setreaddeadline",
            Sysno::SetWriteDeadline => "setwritedeadline",
            Sysno::NetRead => "net_read",
            Sysno::NetWrite => "net_write",
            Sysno::NetClose => "net_close",
            Sysno::NetSetDeadline => "net_setdeadline",
            Sysno::NetSetReadDeadline => "net_setreaddeadline",
            Sysno::NetSetWriteDeadline => "net_setwritedeadline",
            Sysno::NetSetReadBuffer => "net_setreadbuffer",
            Sysno::NetSetWriteBuffer => "net_setwritebuffer",
            Sysno::Socket => "socket",
            Sysno::ListenTcp => "listen_tcp",
            Sysno::Sleep => "sleep",
        }
    }
}
