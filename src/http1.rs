//! HTTP/1.1 request/response exchange over a [`Transport`].

use std::io;

use log::{debug, trace};

use crate::error::{Result, TransportError};
use crate::model::{Method, Request, SafeResponse, UnsafeResponse};
use crate::parser;
use crate::recv::{RecvBuffer, RecvState};
use crate::transport::Transport;

/// One HTTP/1.1 connection speaking request/response cycles.
///
/// Owns the transport, an output buffer for serialized requests and the
/// receive buffer that response views borrow from. Both buffers are reused
/// across requests, which is what makes [`Http1Protocol::request_unsafe`]
/// zero-copy: the returned views alias the receive buffer and are valid
/// only until the next request rewrites it. The borrow checker enforces
/// exactly that window.
pub struct Http1Protocol<T> {
    transport: T,
    out: Vec<u8>,
    recv: RecvBuffer,
}

impl<T: Transport> Http1Protocol<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            out: Vec::new(),
            recv: RecvBuffer::new(),
        }
    }

    pub fn connect(&mut self, target: &str, port: u16) -> Result<(), TransportError> {
        self.transport.connect(target, port)
    }

    pub fn disconnect(&mut self) {
        self.transport.close();
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Perform a request, returning an owned response.
    ///
    /// Same parse as [`Http1Protocol::request_unsafe`], deep copied so the
    /// result is independent of the receive buffer.
    pub fn request_safe(&mut self, request: &Request) -> Result<SafeResponse> {
        Ok(self.request_unsafe(request)?.to_safe())
    }

    /// Perform a request, returning views into the receive buffer.
    pub fn request_unsafe(&mut self, request: &Request) -> Result<UnsafeResponse<'_>> {
        self.send_request(request)?;
        self.read_response()?;

        let response = parser::parse_response(
            self.recv.filled(),
            self.recv.header_size(),
            self.recv.content_length(),
        )?;

        debug!(
            "{} {} -> {} ({} body bytes)",
            request.method,
            request.path,
            response.status_code,
            response.body.len()
        );
        Ok(response)
    }

    fn send_request(&mut self, request: &Request) -> Result<()> {
        self.out.clear();
        self.out.extend_from_slice(request.method.as_str().as_bytes());
        self.out.push(b' ');
        self.out.extend_from_slice(request.path.as_bytes());
        self.out.extend_from_slice(b" HTTP/1.1\r\n");

        for (name, value) in &request.headers {
            self.out.extend_from_slice(name.as_bytes());
            self.out.extend_from_slice(b": ");
            self.out.extend_from_slice(value.as_bytes());
            self.out.extend_from_slice(b"\r\n");
        }

        self.out.extend_from_slice(b"\r\n");

        if request.method == Method::Post {
            if let Some(body) = &request.body {
                self.out.extend_from_slice(body);
            }
        }

        let mut written = 0;
        while written < self.out.len() {
            let n = self.transport.write(&self.out[written..])?;
            if n == 0 {
                return Err(TransportError::Write(io::ErrorKind::WriteZero.into()).into());
            }
            written += n;
        }

        trace!("request sent: {} bytes", written);
        Ok(())
    }

    fn read_response(&mut self) -> Result<()> {
        self.recv.reset();

        loop {
            let dst = self.recv.spare();
            let n = match self.transport.read_into(dst) {
                Ok(n) => n,
                // A reset mid read counts as the peer closing.
                Err(TransportError::Closed) => 0,
                Err(e) => return Err(e.into()),
            };
            trace!("read {} bytes", n);

            let state = if n == 0 {
                self.recv.peer_closed()?
            } else {
                self.recv.commit(n)?
            };

            if state == RecvState::Complete {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::{ClientError, Error};
    use crate::transport::test::ScriptedTransport;

    fn connected() -> Http1Protocol<ScriptedTransport> {
        let mut protocol = Http1Protocol::new(ScriptedTransport::new());
        protocol.connect("test", 0).unwrap();
        protocol
    }

    #[test]
    fn serializes_get_request() {
        let mut protocol = connected();
        protocol.transport_mut().reply("HTTP/1.1 204 No Content\r\n\r\n");

        let request = Request::get("/test").header("Host", "example.com");
        protocol.request_unsafe(&request).unwrap();

        const EXPECTED: &[u8] = b"GET /test HTTP/1.1\r\nHost: example.com\r\n\r\n";
        assert_eq!(protocol.transport().written(), EXPECTED);
    }

    #[test]
    fn serializes_post_request_with_body() {
        let mut protocol = connected();
        protocol
            .transport_mut()
            .reply("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");

        let body = b"key=value&data=true";
        let request = Request::post("/api/submit", body.as_slice())
            .header("Host", "test-server")
            .header("Content-Length", body.len().to_string());
        protocol.request_unsafe(&request).unwrap();

        const EXPECTED: &[u8] = b"POST /api/submit HTTP/1.1\r\nHost: test-server\r\n\
                                  Content-Length: 19\r\n\r\nkey=value&data=true";
        assert_eq!(protocol.transport().written(), EXPECTED);
    }

    #[test]
    fn get_request_never_carries_body_bytes() {
        let mut protocol = connected();
        protocol.transport_mut().reply("HTTP/1.1 204 No Content\r\n\r\n");

        // The client layer rejects this shape; the serializer on its own
        // must still not append the body on a GET.
        let mut request = Request::get("/");
        request.body = Some(b"ignored".to_vec());
        protocol.request_unsafe(&request).unwrap();

        const EXPECTED: &[u8] = b"GET / HTTP/1.1\r\n\r\n";
        assert_eq!(protocol.transport().written(), EXPECTED);
    }

    #[test]
    fn parses_full_response() {
        let mut protocol = connected();
        protocol.transport_mut().reply(
            "HTTP/1.1 200 OK\r\nContent-Length: 12\r\nContent-Type: text/plain\r\n\r\nHello Client",
        );

        let response = protocol.request_unsafe(&Request::default()).unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.status_message, "OK");
        assert_eq!(
            response.headers,
            vec![("Content-Length", "12"), ("Content-Type", "text/plain")]
        );
        assert_eq!(response.body, b"Hello Client");
    }

    #[test]
    fn reassembles_fragmented_response() {
        let mut protocol = connected();
        for chunk in [
            "HTTP/1.1 200 OK\r\n",
            "Content-Type: text/plain\r\n",
            "Content-Length: 4\r\n",
            "\r\n",
            "Body",
        ] {
            protocol.transport_mut().reply(chunk);
        }

        let response = protocol.request_unsafe(&Request::default()).unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.headers.len(), 2);
        assert_eq!(response.body, b"Body");
    }

    #[test]
    fn reassembles_body_split_byte_by_byte() {
        let mut protocol = connected();
        protocol
            .transport_mut()
            .reply("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n");
        for byte in [b"h", b"e", b"l", b"l", b"o"] {
            protocol.transport_mut().reply(byte.as_slice());
        }

        let response = protocol.request_unsafe(&Request::default()).unwrap();
        assert_eq!(response.body, b"hello");
    }

    #[test]
    fn close_delimited_body_reads_to_close() {
        let mut protocol = connected();
        protocol
            .transport_mut()
            .reply("HTTP/1.1 200 OK\r\nConnection: close\r\n\r\nFull body.");

        let response = protocol.request_unsafe(&Request::default()).unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, b"Full body.");
    }

    #[test]
    fn close_before_content_length_is_an_error() {
        let mut protocol = connected();
        protocol
            .transport_mut()
            .reply("HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort body");

        let err = protocol.request_unsafe(&Request::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Client(ClientError::ClosedBeforeContentLength {
                expected: 100,
                received: 10
            })
        ));
    }

    #[test]
    fn missing_separator_is_an_error() {
        let mut protocol = connected();
        protocol
            .transport_mut()
            .reply("HTTP/1.1 200 OK\r\nContent-Type: text/plain");

        let err = protocol.request_unsafe(&Request::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Client(ClientError::MissingHeaderSeparator)
        ));
    }

    #[test]
    fn excess_bytes_beyond_content_length_are_ignored() {
        let mut protocol = connected();
        protocol
            .transport_mut()
            .reply("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi...junk after the body");

        let response = protocol.request_unsafe(&Request::default()).unwrap();
        assert_eq!(response.body, b"hi");
    }

    #[test]
    fn safe_response_outlives_buffer_reuse() {
        let mut protocol = connected();
        protocol
            .transport_mut()
            .reply("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nfirst");
        let first = protocol.request_safe(&Request::default()).unwrap();

        protocol
            .transport_mut()
            .reply("HTTP/1.1 200 OK\r\nContent-Length: 6\r\n\r\nsecond");
        let second = protocol.request_safe(&Request::default()).unwrap();

        assert_eq!(first.body, b"first");
        assert_eq!(second.body, b"second");
    }

    #[test]
    fn short_writes_are_retried_until_done() {
        let mut protocol = connected();
        protocol.transport_mut().limit_writes(3);
        protocol.transport_mut().reply("HTTP/1.1 204 No Content\r\n\r\n");

        protocol.request_unsafe(&Request::get("/retry")).unwrap();

        const EXPECTED: &[u8] = b"GET /retry HTTP/1.1\r\n\r\n";
        assert_eq!(protocol.transport().written(), EXPECTED);
    }

    #[test]
    fn request_on_disconnected_transport_fails() {
        let mut protocol = Http1Protocol::new(ScriptedTransport::new());
        let err = protocol.request_unsafe(&Request::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::NotConnected)
        ));
    }
}
