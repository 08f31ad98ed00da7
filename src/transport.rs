//! Stream socket transports.
//!
//! A [`Transport`] is one blocking byte-stream connection: tcp in
//! [`tcp::TcpTransport`], unix domain sockets in [`unix::UnixTransport`]
//! and a scripted in-memory double in [`test::ScriptedTransport`]. Each
//! instance owns at most one socket, connects once and never reconnects.

use std::io;

use crate::error::TransportError;

/// A blocking byte-stream connection.
pub trait Transport {
    /// Bind this instance to one connection. `target` is a host name for
    /// tcp and a filesystem path for unix sockets, which ignore `port`.
    /// Fails with [`TransportError::AlreadyConnected`] when called twice.
    fn connect(&mut self, target: &str, port: u16) -> Result<(), TransportError>;

    /// Write some of `data`, returning how many bytes were accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Read into `buf`, returning the byte count. A return of 0 is a
    /// graceful close by the peer, not an error.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Release the socket. Idempotent, a no-op when never connected.
    fn close(&mut self);
}

fn write_stream(stream: &mut impl io::Write, data: &[u8]) -> Result<usize, TransportError> {
    stream.write(data).map_err(TransportError::Write)
}

fn read_stream(stream: &mut impl io::Read, buf: &mut [u8]) -> Result<usize, TransportError> {
    match stream.read(buf) {
        Ok(n) => Ok(n),
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted
            ) =>
        {
            Err(TransportError::Closed)
        }
        Err(e) => Err(TransportError::Read(e)),
    }
}

pub mod tcp {
    use std::io;
    use std::net::{TcpStream, ToSocketAddrs};

    use log::debug;

    use super::Transport;
    use crate::error::TransportError;

    /// Tcp stream socket transport.
    ///
    /// Nagle's algorithm is disabled on connect so small requests go out
    /// immediately instead of waiting to coalesce with later writes.
    pub struct TcpTransport {
        stream: Option<TcpStream>,
    }

    impl TcpTransport {
        pub fn new() -> Self {
            Self { stream: None }
        }
    }

    impl Default for TcpTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for TcpTransport {
        fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
            if self.stream.is_some() {
                return Err(TransportError::AlreadyConnected);
            }

            // Name resolution is a separate failure from the connection
            // attempt itself.
            let addrs: Vec<_> = (host, port)
                .to_socket_addrs()
                .map_err(|e| TransportError::Dns {
                    host: host.to_string(),
                    source: e,
                })?
                .collect();
            if addrs.is_empty() {
                return Err(TransportError::Dns {
                    host: host.to_string(),
                    source: io::ErrorKind::NotFound.into(),
                });
            }

            let stream = TcpStream::connect(&addrs[..]).map_err(|e| TransportError::Connect {
                target: format!("{}:{}", host, port),
                source: e,
            })?;
            stream.set_nodelay(true).map_err(|e| TransportError::Connect {
                target: format!("{}:{}", host, port),
                source: e,
            })?;

            debug!("connected to {}:{}", host, port);
            self.stream = Some(stream);
            Ok(())
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
            match &mut self.stream {
                Some(stream) => super::write_stream(stream, data),
                None => Err(TransportError::NotConnected),
            }
        }

        fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            match &mut self.stream {
                Some(stream) => super::read_stream(stream, buf),
                None => Err(TransportError::NotConnected),
            }
        }

        fn close(&mut self) {
            if self.stream.take().is_some() {
                debug!("closed tcp connection");
            }
        }
    }
}

#[cfg(unix)]
pub mod unix {
    use std::os::unix::net::UnixStream;

    use log::debug;

    use super::Transport;
    use crate::error::TransportError;

    /// Unix domain stream socket transport.
    ///
    /// The connect target is a filesystem path. There is no dns phase, so
    /// every connect failure is [`TransportError::Connect`].
    pub struct UnixTransport {
        stream: Option<UnixStream>,
    }

    impl UnixTransport {
        pub fn new() -> Self {
            Self { stream: None }
        }
    }

    impl Default for UnixTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for UnixTransport {
        fn connect(&mut self, path: &str, _port: u16) -> Result<(), TransportError> {
            if self.stream.is_some() {
                return Err(TransportError::AlreadyConnected);
            }

            let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
                target: path.to_string(),
                source: e,
            })?;

            debug!("connected to {}", path);
            self.stream = Some(stream);
            Ok(())
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
            match &mut self.stream {
                Some(stream) => super::write_stream(stream, data),
                None => Err(TransportError::NotConnected),
            }
        }

        fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            match &mut self.stream {
                Some(stream) => super::read_stream(stream, buf),
                None => Err(TransportError::NotConnected),
            }
        }

        fn close(&mut self) {
            if self.stream.take().is_some() {
                debug!("closed unix connection");
            }
        }
    }
}

pub mod test {
    //! Scripted transport for tests.
    //!
    //! Plays back queued response chunks and records written bytes, so
    //! protocol and client behavior can be exercised without a socket.

    use std::collections::VecDeque;

    use super::Transport;
    use crate::error::TransportError;

    pub struct ScriptedTransport {
        reads: VecDeque<Vec<u8>>,
        written: Vec<u8>,
        write_limit: usize,
        connected: bool,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self {
                reads: VecDeque::new(),
                written: Vec::new(),
                write_limit: usize::MAX,
                connected: false,
            }
        }

        /// Queue one read's worth of response bytes. When the queue runs
        /// dry, reads return 0 the way a peer close does.
        pub fn reply(&mut self, chunk: impl Into<Vec<u8>>) {
            self.reads.push_back(chunk.into());
        }

        /// Cap how many bytes a single `write` accepts, to exercise short
        /// write handling.
        pub fn limit_writes(&mut self, max: usize) {
            self.write_limit = max;
        }

        /// Everything written so far.
        pub fn written(&self) -> &[u8] {
            &self.written
        }
    }

    impl Default for ScriptedTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for ScriptedTransport {
        fn connect(&mut self, _target: &str, _port: u16) -> Result<(), TransportError> {
            if self.connected {
                return Err(TransportError::AlreadyConnected);
            }
            self.connected = true;
            Ok(())
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            let n = data.len().min(self.write_limit);
            self.written.extend_from_slice(&data[..n]);
            Ok(n)
        }

        fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            let Some(mut chunk) = self.reads.pop_front() else {
                return Ok(0);
            };
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.reads.push_front(chunk.split_off(n));
            }
            Ok(n)
        }

        fn close(&mut self) {
            self.connected = false;
        }
    }
}
