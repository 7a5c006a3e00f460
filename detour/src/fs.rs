// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interposition points for file and path operations.
//!
//! Every wrapper follows the same protocol: check the gate, encode the
//! arguments before the real call, perform the real call through `libc`,
//! encode the results from the actual outcome, report the assembled record
//! once, and hand the real result back untouched. The OS error, if any, is
//! captured with `io::Error::last_os_error()` immediately after the call so
//! nothing the reporter does can clobber it.

use std::{
    ffi::CString,
    io::{self, Read, Seek, SeekFrom, Write},
    mem,
    os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd},
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use detour_common::{EventRecord, Sysno, Value};
use log::trace;

use crate::session::Session;

fn cstring(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_encoded_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))
}

fn lossy(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Metadata snapshot returned by the stat family.
#[derive(Clone, Copy, Debug)]
pub struct FileInfo {
    pub size: i64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub modified_sec: i64,
    pub modified_nsec: i64,
}

impl FileInfo {
    fn from_stat(st: &libc::stat) -> Self {
        Self {
            size: st.st_size as i64,
            mode: st.st_mode as u32,
            uid: st.st_uid,
            gid: st.st_gid,
            modified_sec: st.st_mtime as i64,
            modified_nsec: st.st_mtime_nsec as i64,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFDIR as u32
    }

    pub fn is_symlink(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFLNK as u32
    }
}

/// An open file whose operations report to the session that opened it.
///
/// The bounded name kept here is what identifies the file in handle-kind
/// values; the descriptor itself is never encoded.
pub struct File {
    fd: Option<OwnedFd>,
    name: String,
    session: Session,
}

impl File {
    /// Opens for reading, like `open(2)` with `O_RDONLY`.
    pub fn open(session: &Session, path: impl AsRef<Path>) -> io::Result<File> {
        Self::open_with(session, path, libc::O_RDONLY, 0)
    }

    /// Creates or truncates for read/write.
    pub fn create(session: &Session, path: impl AsRef<Path>) -> io::Result<File> {
        Self::open_with(
            session,
            path,
            libc::O_RDWR | libc::O_CREAT | libc::O_TRUNC,
            0o666,
        )
    }

    /// Opens with explicit flags and permission bits. `O_CLOEXEC` is always
    /// added, as the standard library would.
    pub fn open_with(
        session: &Session,
        path: impl AsRef<Path>,
        flags: i32,
        mode: u32,
    ) -> io::Result<File> {
        let path = path.as_ref();
        let name = lossy(path);
        let args = session.is_active().then(|| {
            [
                Value::string(&name),
                Value::Integer(flags as isize),
                Value::Integer(mode as isize),
            ]
        });

        let cpath = cstring(path)?;
        let fd = unsafe { libc::open(cpath.as_ptr(), flags | libc::O_CLOEXEC, mode as libc::c_uint) };
        let err = (fd < 0).then(io::Error::last_os_error);

        if let Some(args) = args {
            trace!(target: "detour", "[OPEN] {name} {flags:#x} {mode:#o}");
            session.report(EventRecord::new(
                Sysno::Open,
                &args,
                &[Value::Unsupported, Value::Error],
            ));
        }

        if let Some(err) = err {
            return Err(err);
        }

        Ok(File {
            fd: Some(unsafe { OwnedFd::from_raw_fd(fd) }),
            name,
            session: session.clone(),
        })
    }

    fn from_parts(fd: RawFd, name: &str, session: &Session) -> File {
        File {
            fd: Some(unsafe { OwnedFd::from_raw_fd(fd) }),
            name: name.to_owned(),
            session: session.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn raw_fd(&self) -> io::Result<RawFd> {
        match &self.fd {
            Some(fd) => Ok(fd.as_raw_fd()),
            None => Err(io::Error::from_raw_os_error(libc::EBADF)),
        }
    }

    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let fd = self.raw_fd()?;
        let args = self
            .session
            .is_active()
            .then(|| [Value::handle(&self.name), Value::array(buf.len())]);

        let res = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        let err = (res < 0).then(io::Error::last_os_error);

        if let Some(args) = args {
            trace!(target: "detour", "[READ] {} {}", self.name, buf.len());
            self.session.report(EventRecord::new(
                Sysno::Read,
                &args,
                &[Value::Integer(res.max(0) as isize), Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(res as usize),
        }
    }

    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let fd = self.raw_fd()?;
        let args = self
            .session
            .is_active()
            .then(|| [Value::handle(&self.name), Value::array(buf.len())]);

        let res = unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) };
        let err = (res < 0).then(io::Error::last_os_error);

        if let Some(args) = args {
            trace!(target: "detour", "[WRITE] {} {}", self.name, buf.len());
            self.session.report(EventRecord::new(
                Sysno::Write,
                &args,
                &[Value::Integer(res.max(0) as isize), Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(res as usize),
        }
    }

    pub fn pread(&self, buf: &mut [u8], offset: i64) -> io::Result<usize> {
        let fd = self.raw_fd()?;
        let args = self.session.is_active().then(|| {
            [
                Value::handle(&self.name),
                Value::array(buf.len()),
                Value::Integer64(offset),
            ]
        });

        let res =
            unsafe { libc::pread(fd, buf.as_mut_ptr().cast(), buf.len(), offset as libc::off_t) };
        let err = (res < 0).then(io::Error::last_os_error);

        if let Some(args) = args {
            trace!(target: "detour", "[PREAD] {} {} {offset}", self.name, buf.len());
            self.session.report(EventRecord::new(
                Sysno::Pread64,
                &args,
                &[Value::Integer(res.max(0) as isize), Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(res as usize),
        }
    }

    pub fn pwrite(&self, buf: &[u8], offset: i64) -> io::Result<usize> {
        let fd = self.raw_fd()?;
        let args = self.session.is_active().then(|| {
            [
                Value::handle(&self.name),
                Value::array(buf.len()),
                Value::Integer64(offset),
            ]
        });

        let res =
            unsafe { libc::pwrite(fd, buf.as_ptr().cast(), buf.len(), offset as libc::off_t) };
        let err = (res < 0).then(io::Error::last_os_error);

        if let Some(args) = args {
            trace!(target: "detour", "[PWRITE] {} {} {offset}", self.name, buf.len());
            self.session.report(EventRecord::new(
                Sysno::Pwrite64,
                &args,
                &[Value::Integer(res.max(0) as isize), Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(res as usize),
        }
    }

    pub fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let fd = self.raw_fd()?;
        let (offset, whence) = match pos {
            SeekFrom::Start(offset) => (offset as i64, libc::SEEK_SET),
            SeekFrom::Current(offset) => (offset, libc::SEEK_CUR),
            SeekFrom::End(offset) => (offset, libc::SEEK_END),
        };
        let args = self.session.is_active().then(|| {
            [
                Value::handle(&self.name),
                Value::Integer64(offset),
                Value::Integer(whence as isize),
            ]
        });

        let res = unsafe { libc::lseek(fd, offset as libc::off_t, whence) };
        let err = (res < 0).then(io::Error::last_os_error);

        if let Some(args) = args {
            trace!(target: "detour", "[SEEK] {} {offset} {whence}", self.name);
            self.session.report(EventRecord::new(
                Sysno::Lseek,
                &args,
                &[Value::Integer64(res.max(0) as i64), Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(res as u64),
        }
    }

    pub fn metadata(&self) -> io::Result<FileInfo> {
        let fd = self.raw_fd()?;
        let gated = self.session.is_active();

        let mut st: libc::stat = unsafe { mem::zeroed() };
        let res = unsafe { libc::fstat(fd, &mut st) };
        let err = (res < 0).then(io::Error::last_os_error);

        if gated {
            trace!(target: "detour", "[FSTAT] {}", self.name);
            self.session.report(EventRecord::new(
                Sysno::Fstat,
                &[Value::handle(&self.name)],
                &[Value::Unsupported, Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(FileInfo::from_stat(&st)),
        }
    }

    pub fn set_len(&self, size: i64) -> io::Result<()> {
        let fd = self.raw_fd()?;
        let gated = self.session.is_active();

        let res = unsafe { libc::ftruncate(fd, size as libc::off_t) };
        let err = (res < 0).then(io::Error::last_os_error);

        if gated {
            trace!(target: "detour", "[FTRUNCATE] {} {size}", self.name);
            self.session.report(EventRecord::new(
                Sysno::Ftruncate,
                &[Value::handle(&self.name), Value::Integer64(size)],
                &[Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn sync_all(&self) -> io::Result<()> {
        let fd = self.raw_fd()?;
        let gated = self.session.is_active();

        let res = unsafe { libc::fsync(fd) };
        let err = (res < 0).then(io::Error::last_os_error);

        if gated {
            trace!(target: "detour", "[FSYNC] {}", self.name);
            self.session.report(EventRecord::new(
                Sysno::Fsync,
                &[Value::handle(&self.name)],
                &[Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn set_permissions(&self, mode: u32) -> io::Result<()> {
        let fd = self.raw_fd()?;
        let gated = self.session.is_active();

        let res = unsafe { libc::fchmod(fd, mode as libc::mode_t) };
        let err = (res < 0).then(io::Error::last_os_error);

        if gated {
            trace!(target: "detour", "[FCHMOD] {} {mode:#o}", self.name);
            self.session.report(EventRecord::new(
                Sysno::Fchmod,
                &[Value::handle(&self.name), Value::Integer(mode as isize)],
                &[Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn chown(&self, uid: u32, gid: u32) -> io::Result<()> {
        let fd = self.raw_fd()?;
        let gated = self.session.is_active();

        let res = unsafe { libc::fchown(fd, uid as libc::uid_t, gid as libc::gid_t) };
        let err = (res < 0).then(io::Error::last_os_error);

        if gated {
            trace!(target: "detour", "[FCHOWN] {} {uid} {gid}", self.name);
            self.session.report(EventRecord::new(
                Sysno::Fchown,
                &[
                    Value::handle(&self.name),
                    Value::Integer(uid as isize),
                    Value::Integer(gid as isize),
                ],
                &[Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Changes the process working directory to this (directory) file.
    pub fn change_dir(&self) -> io::Result<()> {
        let fd = self.raw_fd()?;
        let gated = self.session.is_active();

        let res = unsafe { libc::fchdir(fd) };
        let err = (res < 0).then(io::Error::last_os_error);

        if gated {
            trace!(target: "detour", "[FCHDIR] {}", self.name);
            self.session.report(EventRecord::new(
                Sysno::Fchdir,
                &[Value::handle(&self.name)],
                &[Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Regular files carry no deadline support; the attempt is still observed
    /// before being refused.
    pub fn set_deadline(&self, deadline: Option<Duration>) -> io::Result<()> {
        self.deadline_stub(Sysno::SetDeadline, deadline)
    }

    pub fn set_read_deadline(&self, deadline: Option<Duration>) -> io::Result<()> {
        self.deadline_stub(Sysno::SetReadDeadline, deadline)
    }

    pub fn set_write_deadline(&self, deadline: Option<Duration>) -> io::Result<()> {
        self.deadline_stub(Sysno::SetWriteDeadline, deadline)
    }

    fn deadline_stub(&self, sysno: Sysno, deadline: Option<Duration>) -> io::Result<()> {
        if self.session.is_active() {
            let nanos = deadline.map_or(-1, |d| d.as_nanos() as i64);
            trace!(target: "detour", "[{}] {} {nanos}", sysno.name(), self.name);
            self.session.report(EventRecord::new(
                sysno,
                &[Value::handle(&self.name), Value::Integer64(nanos)],
                &[Value::Error],
            ));
        }

        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "file type does not support deadlines",
        ))
    }

    /// Closes the file, reporting the close. Dropping without calling this
    /// closes and reports too; the explicit form surfaces the close error.
    pub fn close(mut self) -> io::Result<()> {
        self.close_inner()
    }

    fn close_inner(&mut self) -> io::Result<()> {
        let Some(fd) = self.fd.take() else {
            return Ok(());
        };
        let gated = self.session.is_active();

        let res = unsafe { libc::close(fd.into_raw_fd()) };
        let err = (res < 0).then(io::Error::last_os_error);

        if gated {
            trace!(target: "detour", "[CLOSE] {}", self.name);
            self.session.report(EventRecord::new(
                Sysno::Close,
                &[Value::handle(&self.name)],
                &[Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for File {
    fn drop(&mut self) {
        let _ = self.close_inner();
    }
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        File::read(self, buf)
    }
}

impl Write for File {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        File::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        File::seek(self, pos)
    }
}

/// Creates a connected pipe pair; reads from the first end return bytes
/// written to the second.
pub fn pipe(session: &Session) -> io::Result<(File, File)> {
    let gated = session.is_active();

    let mut fds = [0 as RawFd; 2];
    let res = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) };
    let err = (res < 0).then(io::Error::last_os_error);

    if gated {
        trace!(target: "detour", "[PIPE]");
        // The end names only exist once the descriptors do, so the result
        // slots are filled strictly after pipe2 returns.
        let results = if err.is_none() {
            [Value::handle("|0"), Value::handle("|1"), Value::Error]
        } else {
            [Value::Unsupported, Value::Unsupported, Value::Error]
        };
        session.report(EventRecord::new(Sysno::Pipe2, &[], &results));
    }

    if let Some(err) = err {
        return Err(err);
    }

    Ok((
        File::from_parts(fds[0], "|0", session),
        File::from_parts(fds[1], "|1", session),
    ))
}

pub fn stat(session: &Session, path: impl AsRef<Path>) -> io::Result<FileInfo> {
    stat_impl(session, path.as_ref(), Sysno::Stat)
}

/// Like [`stat`] but does not follow a trailing symlink.
pub fn lstat(session: &Session, path: impl AsRef<Path>) -> io::Result<FileInfo> {
    stat_impl(session, path.as_ref(), Sysno::Lstat)
}

fn stat_impl(session: &Session, path: &Path, sysno: Sysno) -> io::Result<FileInfo> {
    let name = lossy(path);
    let args = session.is_active().then(|| [Value::string(&name)]);

    let cpath = cstring(path)?;
    let mut st: libc::stat = unsafe { mem::zeroed() };
    let res = unsafe {
        match sysno {
            Sysno::Lstat => libc::lstat(cpath.as_ptr(), &mut st),
            _ => libc::stat(cpath.as_ptr(), &mut st),
        }
    };
    let err = (res < 0).then(io::Error::last_os_error);

    if let Some(args) = args {
        trace!(target: "detour", "[{}] {name}", sysno.name());
        session.report(EventRecord::new(
            sysno,
            &args,
            &[Value::Unsupported, Value::Error],
        ));
    }

    match err {
        Some(err) => Err(err),
        None => Ok(FileInfo::from_stat(&st)),
    }
}

pub fn truncate(session: &Session, path: impl AsRef<Path>, size: i64) -> io::Result<()> {
    let path = path.as_ref();
    let name = lossy(path);
    let args = session
        .is_active()
        .then(|| [Value::string(&name), Value::Integer64(size)]);

    let cpath = cstring(path)?;
    let res = unsafe { libc::truncate(cpath.as_ptr(), size as libc::off_t) };
    let err = (res < 0).then(io::Error::last_os_error);

    if let Some(args) = args {
        trace!(target: "detour", "[TRUNCATE] {name} {size}");
        session.report(EventRecord::new(Sysno::Truncate, &args, &[Value::Error]));
    }

    match err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub fn rename(
    session: &Session,
    from: impl AsRef<Path>,
    to: impl AsRef<Path>,
) -> io::Result<()> {
    path_pair_op(session, Sysno::Rename, from.as_ref(), to.as_ref(), |a, b| {
        unsafe { libc::rename(a, b) }
    })
}

/// Creates `link` as a hard link to `original`.
pub fn link(
    session: &Session,
    original: impl AsRef<Path>,
    link: impl AsRef<Path>,
) -> io::Result<()> {
    path_pair_op(
        session,
        Sysno::Link,
        original.as_ref(),
        link.as_ref(),
        |a, b| unsafe { libc::link(a, b) },
    )
}

/// Creates `link` as a symbolic link to `original`.
pub fn symlink(
    session: &Session,
    original: impl AsRef<Path>,
    link: impl AsRef<Path>,
) -> io::Result<()> {
    path_pair_op(
        session,
        Sysno::Symlink,
        original.as_ref(),
        link.as_ref(),
        |a, b| unsafe { libc::symlink(a, b) },
    )
}

fn path_pair_op(
    session: &Session,
    sysno: Sysno,
    a: &Path,
    b: &Path,
    call: impl FnOnce(*const libc::c_char, *const libc::c_char) -> libc::c_int,
) -> io::Result<()> {
    let (name_a, name_b) = (lossy(a), lossy(b));
    let args = session
        .is_active()
        .then(|| [Value::string(&name_a), Value::string(&name_b)]);

    let (ca, cb) = (cstring(a)?, cstring(b)?);
    let res = call(ca.as_ptr(), cb.as_ptr());
    let err = (res < 0).then(io::Error::last_os_error);

    if let Some(args) = args {
        trace!(target: "detour", "[{}] {name_a} {name_b}", sysno.name());
        session.report(EventRecord::new(sysno, &args, &[Value::Error]));
    }

    match err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub fn unlink(session: &Session, path: impl AsRef<Path>) -> io::Result<()> {
    path_op(session, Sysno::Unlink, path.as_ref(), |p| unsafe {
        libc::unlink(p)
    })
}

pub fn rmdir(session: &Session, path: impl AsRef<Path>) -> io::Result<()> {
    path_op(session, Sysno::Rmdir, path.as_ref(), |p| unsafe {
        libc::rmdir(p)
    })
}

pub fn chdir(session: &Session, path: impl AsRef<Path>) -> io::Result<()> {
    path_op(session, Sysno::Chdir, path.as_ref(), |p| unsafe {
        libc::chdir(p)
    })
}

fn path_op(
    session: &Session,
    sysno: Sysno,
    path: &Path,
    call: impl FnOnce(*const libc::c_char) -> libc::c_int,
) -> io::Result<()> {
    let name = lossy(path);
    let args = session.is_active().then(|| [Value::string(&name)]);

    let cpath = cstring(path)?;
    let res = call(cpath.as_ptr());
    let err = (res < 0).then(io::Error::last_os_error);

    if let Some(args) = args {
        trace!(target: "detour", "[{}] {name}", sysno.name());
        session.report(EventRecord::new(sysno, &args, &[Value::Error]));
    }

    match err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub fn mkdir(session: &Session, path: impl AsRef<Path>, mode: u32) -> io::Result<()> {
    let path = path.as_ref();
    let name = lossy(path);
    let args = session
        .is_active()
        .then(|| [Value::string(&name), Value::Integer(mode as isize)]);

    let cpath = cstring(path)?;
    let res = unsafe { libc::mkdir(cpath.as_ptr(), mode as libc::mode_t) };
    let err = (res < 0).then(io::Error::last_os_error);

    if let Some(args) = args {
        trace!(target: "detour", "[MKDIR] {name} {mode:#o}");
        session.report(EventRecord::new(Sysno::Mkdir, &args, &[Value::Error]));
    }

    match err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub fn chmod(session: &Session, path: impl AsRef<Path>, mode: u32) -> io::Result<()> {
    let path = path.as_ref();
    let name = lossy(path);
    let args = session
        .is_active()
        .then(|| [Value::string(&name), Value::Integer(mode as isize)]);

    let cpath = cstring(path)?;
    let res = unsafe { libc::chmod(cpath.as_ptr(), mode as libc::mode_t) };
    let err = (res < 0).then(io::Error::last_os_error);

    if let Some(args) = args {
        trace!(target: "detour", "[CHMOD] {name} {mode:#o}");
        session.report(EventRecord::new(Sysno::Chmod, &args, &[Value::Error]));
    }

    match err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub fn chown(session: &Session, path: impl AsRef<Path>, uid: u32, gid: u32) -> io::Result<()> {
    chown_impl(session, path.as_ref(), uid, gid, Sysno::Chown)
}

/// Like [`chown`] but does not follow a trailing symlink.
pub fn lchown(session: &Session, path: impl AsRef<Path>, uid: u32, gid: u32) -> io::Result<()> {
    chown_impl(session, path.as_ref(), uid, gid, Sysno::Lchown)
}

fn chown_impl(
    session: &Session,
    path: &Path,
    uid: u32,
    gid: u32,
    sysno: Sysno,
) -> io::Result<()> {
    let name = lossy(path);
    let args = session.is_active().then(|| {
        [
            Value::string(&name),
            Value::Integer(uid as isize),
            Value::Integer(gid as isize),
        ]
    });

    let cpath = cstring(path)?;
    let res = unsafe {
        match sysno {
            Sysno::Lchown => libc::lchown(cpath.as_ptr(), uid as libc::uid_t, gid as libc::gid_t),
            _ => libc::chown(cpath.as_ptr(), uid as libc::uid_t, gid as libc::gid_t),
        }
    };
    let err = (res < 0).then(io::Error::last_os_error);

    if let Some(args) = args {
        trace!(target: "detour", "[{}] {name} {uid} {gid}", sysno.name());
        session.report(EventRecord::new(sysno, &args, &[Value::Error]));
    }

    match err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Reads the target of a symbolic link.
pub fn read_link(session: &Session, path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = path.as_ref();
    let name = lossy(path);
    let args = session.is_active().then(|| [Value::string(&name)]);

    let cpath = cstring(path)?;
    let mut buf = [0u8; libc::PATH_MAX as usize];
    let res = unsafe { libc::readlink(cpath.as_ptr(), buf.as_mut_ptr().cast(), buf.len()) };
    let err = (res < 0).then(io::Error::last_os_error);

    let target = if err.is_none() {
        String::from_utf8_lossy(&buf[..res as usize]).into_owned()
    } else {
        String::new()
    };

    if let Some(args) = args {
        trace!(target: "detour", "[READLINK] {name}");
        let result = if err.is_none() {
            Value::string(&target)
        } else {
            Value::Unsupported
        };
        session.report(EventRecord::new(
            Sysno::ReadLink,
            &args,
            &[result, Value::Error],
        ));
    }

    match err {
        Some(err) => Err(err),
        None => Ok(PathBuf::from(target)),
    }
}

fn timeval(t: SystemTime) -> libc::timeval {
    let since_epoch = t.duration_since(UNIX_EPOCH).unwrap_or_default();
    libc::timeval {
        tv_sec: since_epoch.as_secs() as libc::time_t,
        tv_usec: since_epoch.subsec_micros() as libc::suseconds_t,
    }
}

fn unix_nanos(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as i64)
}

/// Sets the access and modification times of the named file.
pub fn utimes(
    session: &Session,
    path: impl AsRef<Path>,
    accessed: SystemTime,
    modified: SystemTime,
) -> io::Result<()> {
    let path = path.as_ref();
    let name = lossy(path);
    let args = session.is_active().then(|| {
        [
            Value::string(&name),
            Value::Integer64(unix_nanos(accessed)),
            Value::Integer64(unix_nanos(modified)),
        ]
    });

    let cpath = cstring(path)?;
    let times = [timeval(accessed), timeval(modified)];
    let res = unsafe { libc::utimes(cpath.as_ptr(), times.as_ptr()) };
    let err = (res < 0).then(io::Error::last_os_error);

    if let Some(args) = args {
        trace!(target: "detour", "[UTIMES] {name}");
        session.report(EventRecord::new(Sysno::Utimes, &args, &[Value::Error]));
    }

    match err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Lists a directory's entries along with their metadata.
pub fn read_dir(
    session: &Session,
    path: impl AsRef<Path>,
) -> io::Result<Vec<(String, FileInfo)>> {
    use std::os::unix::fs::MetadataExt;

    let path = path.as_ref();
    let name = lossy(path);
    let args = session.is_active().then(|| [Value::string(&name)]);

    let res: io::Result<Vec<(String, FileInfo)>> = std::fs::read_dir(path).and_then(|entries| {
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry?;
            let meta = entry.metadata()?;
            out.push((
                entry.file_name().to_string_lossy().into_owned(),
                FileInfo {
                    size: meta.size() as i64,
                    mode: meta.mode(),
                    uid: meta.uid(),
                    gid: meta.gid(),
                    modified_sec: meta.mtime(),
                    modified_nsec: meta.mtime_nsec(),
                },
            ));
        }
        Ok(out)
    });

    if let Some(args) = args {
        trace!(target: "detour", "[READDIR] {name}");
        let result = match &res {
            Ok(entries) => Value::array(entries.len()),
            Err(_) => Value::Unsupported,
        };
        session.report(EventRecord::new(
            Sysno::ReadDir,
            &args,
            &[result, Value::Error],
        ));
    }

    res
}

/// Lists the names of a directory's entries.
pub fn read_dir_names(session: &Session, path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let path = path.as_ref();
    let name = lossy(path);
    let args = session.is_active().then(|| [Value::string(&name)]);

    let res: io::Result<Vec<String>> = std::fs::read_dir(path).and_then(|entries| {
        let mut names = Vec::new();
        for entry in entries {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    });

    if let Some(args) = args {
        trace!(target: "detour", "[READDIRNAMES] {name}");
        let result = match &res {
            Ok(names) => Value::array(names.len()),
            Err(_) => Value::Unsupported,
        };
        session.report(EventRecord::new(
            Sysno::ReadDirNames,
            &args,
            &[result, Value::Error],
        ));
    }

    res
}
