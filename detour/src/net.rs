// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interposition points for TCP sockets.
//!
//! The real operations go through `std::net`; buffer sizing has no std
//! surface and goes through `libc::setsockopt` directly. Socket wrappers are
//! identified in handle-kind values by their peer (or local) address string.

use std::{
    io::{self, Read, Write},
    mem,
    net::SocketAddr,
    os::fd::AsRawFd,
    time::Duration,
};

use detour_common::{EventRecord, Sysno, Value};
use log::trace;

use crate::session::Session;

/// A listening TCP socket.
pub struct TcpListener {
    inner: std::net::TcpListener,
    name: String,
    session: Session,
}

impl TcpListener {
    /// Binds and listens on `addr`.
    pub fn bind(session: &Session, addr: &str) -> io::Result<TcpListener> {
        let args = session.is_active().then(|| [Value::string(addr)]);

        let res = std::net::TcpListener::bind(addr);

        if let Some(args) = args {
            trace!(target: "detour", "[LISTEN_TCP] {addr}");
            session.report(EventRecord::new(
                Sysno::ListenTcp,
                &args,
                &[Value::Unsupported, Value::Error],
            ));
        }

        let inner = res?;
        let name = inner
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| addr.to_owned());

        Ok(TcpListener {
            inner,
            name,
            session: session.clone(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepts one connection. The new socket is itself an interposition
    /// target, named after the peer it is connected to.
    pub fn accept(&self) -> io::Result<TcpStream> {
        let gated = self.session.is_active();

        let res = self.inner.accept();

        if gated {
            trace!(target: "detour", "[SOCKET] accept {}", self.name);
            let result = match &res {
                Ok((_, peer)) => Value::handle(&peer.to_string()),
                Err(_) => Value::Unsupported,
            };
            self.session.report(EventRecord::new(
                Sysno::Socket,
                &[Value::handle(&self.name)],
                &[result, Value::Error],
            ));
        }

        let (stream, peer) = res?;
        Ok(TcpStream {
            inner: Some(stream),
            name: peer.to_string(),
            session: self.session.clone(),
        })
    }
}

/// A connected TCP socket whose reads, writes, shutdown, and option changes
/// report to its session.
pub struct TcpStream {
    inner: Option<std::net::TcpStream>,
    name: String,
    session: Session,
}

impl TcpStream {
    pub fn connect(session: &Session, addr: &str) -> io::Result<TcpStream> {
        let args = session.is_active().then(|| [Value::string(addr)]);

        let res = std::net::TcpStream::connect(addr);

        let name = match &res {
            Ok(stream) => stream
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| addr.to_owned()),
            Err(_) => addr.to_owned(),
        };

        if let Some(args) = args {
            trace!(target: "detour", "[SOCKET] connect {addr}");
            let result = match &res {
                Ok(_) => Value::handle(&name),
                Err(_) => Value::Unsupported,
            };
            session.report(EventRecord::new(
                Sysno::Socket,
                &args,
                &[result, Value::Error],
            ));
        }

        Ok(TcpStream {
            inner: Some(res?),
            name,
            session: session.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn stream(&self) -> io::Result<&std::net::TcpStream> {
        self.inner
            .as_ref()
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EBADF))
    }

    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let args = self
            .session
            .is_active()
            .then(|| [Value::handle(&self.name), Value::array(buf.len())]);

        let mut stream = self.stream()?;
        let res = stream.read(buf);

        if let Some(args) = args {
            trace!(target: "detour", "[NET_READ] {} {}", self.name, buf.len());
            let count = *res.as_ref().unwrap_or(&0);
            self.session.report(EventRecord::new(
                Sysno::NetRead,
                &args,
                &[Value::Integer(count as isize), Value::Error],
            ));
        }

        res
    }

    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let args = self
            .session
            .is_active()
            .then(|| [Value::handle(&self.name), Value::array(buf.len())]);

        let mut stream = self.stream()?;
        let res = stream.write(buf);

        if let Some(args) = args {
            trace!(target: "detour", "[NET_WRITE] {} {}", self.name, buf.len());
            let count = *res.as_ref().unwrap_or(&0);
            self.session.report(EventRecord::new(
                Sysno::NetWrite,
                &args,
                &[Value::Integer(count as isize), Value::Error],
            ));
        }

        res
    }

    /// Applies one deadline to both directions.
    pub fn set_deadline(&self, deadline: Option<Duration>) -> io::Result<()> {
        let gated = self.session.is_active();

        let res = self
            .stream()?
            .set_read_timeout(deadline)
            .and_then(|_| self.stream()?.set_write_timeout(deadline));

        if gated {
            self.report_deadline(Sysno::NetSetDeadline, deadline);
        }

        res
    }

    pub fn set_read_deadline(&self, deadline: Option<Duration>) -> io::Result<()> {
        let gated = self.session.is_active();

        let res = self.stream()?.set_read_timeout(deadline);

        if gated {
            self.report_deadline(Sysno::NetSetReadDeadline, deadline);
        }

        res
    }

    pub fn set_write_deadline(&self, deadline: Option<Duration>) -> io::Result<()> {
        let gated = self.session.is_active();

        let res = self.stream()?.set_write_timeout(deadline);

        if gated {
            self.report_deadline(Sysno::NetSetWriteDeadline, deadline);
        }

        res
    }

    fn report_deadline(&self, sysno: Sysno, deadline: Option<Duration>) {
        let nanos = deadline.map_or(-1, |d| d.as_nanos() as i64);
        trace!(target: "detour", "[{}] {} {nanos}", sysno.name(), self.name);
        self.session.report(EventRecord::new(
            sysno,
            &[Value::handle(&self.name), Value::Integer64(nanos)],
            &[Value::Error],
        ));
    }

    pub fn set_read_buffer(&self, bytes: usize) -> io::Result<()> {
        self.set_buffer(Sysno::NetSetReadBuffer, libc::SO_RCVBUF, bytes)
    }

    pub fn set_write_buffer(&self, bytes: usize) -> io::Result<()> {
        self.set_buffer(Sysno::NetSetWriteBuffer, libc::SO_SNDBUF, bytes)
    }

    fn set_buffer(&self, sysno: Sysno, option: libc::c_int, bytes: usize) -> io::Result<()> {
        let fd = self.stream()?.as_raw_fd();
        let gated = self.session.is_active();

        let value = bytes as libc::c_int;
        let res = unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                option,
                (&value as *const libc::c_int).cast(),
                mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        let err = (res < 0).then(io::Error::last_os_error);

        if gated {
            trace!(target: "detour", "[{}] {} {bytes}", sysno.name(), self.name);
            self.session.report(EventRecord::new(
                sysno,
                &[Value::handle(&self.name), Value::Integer(bytes as isize)],
                &[Value::Error],
            ));
        }

        match err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Closes the socket, reporting the close. Dropping without calling this
    /// reports too.
    pub fn close(mut self) -> io::Result<()> {
        self.close_inner();
        Ok(())
    }

    fn close_inner(&mut self) {
        let Some(stream) = self.inner.take() else {
            return;
        };
        let gated = self.session.is_active();

        drop(stream);

        if gated {
            trace!(target: "detour", "[NET_CLOSE] {}", self.name);
            self.session.report(EventRecord::new(
                Sysno::NetClose,
                &[Value::handle(&self.name)],
                &[Value::Error],
            ));
        }
    }
}

impl Drop for TcpStream {
    fn drop(&mut self) {
        self.close_inner();
    }
}

impl Read for TcpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        TcpStream::read(self, buf)
    }
}

impl Write for TcpStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        TcpStream::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
