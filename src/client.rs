//! Request validation in front of the protocol layer.

use crate::error::{ClientError, Result, TransportError};
use crate::http1::Http1Protocol;
use crate::model::{Method, Request, SafeResponse, UnsafeResponse};
use crate::transport::Transport;

/// Http client over one connection.
///
/// Checks request shape before anything touches the socket, then delegates
/// to [`Http1Protocol`]. The `_safe` operations return owned responses,
/// the `_unsafe` ones return zero-copy views bound to this client's
/// receive buffer.
pub struct Client<T> {
    protocol: Http1Protocol<T>,
}

impl<T: Transport> Client<T> {
    pub fn new(protocol: Http1Protocol<T>) -> Self {
        Self { protocol }
    }

    pub fn connect(&mut self, target: &str, port: u16) -> Result<(), TransportError> {
        self.protocol.connect(target, port)
    }

    pub fn disconnect(&mut self) {
        self.protocol.disconnect();
    }

    pub fn protocol(&self) -> &Http1Protocol<T> {
        &self.protocol
    }

    pub fn protocol_mut(&mut self) -> &mut Http1Protocol<T> {
        &mut self.protocol
    }

    pub fn get_safe(&mut self, request: Request) -> Result<SafeResponse> {
        let request = into_get(request)?;
        self.protocol.request_safe(&request)
    }

    pub fn get_unsafe(&mut self, request: Request) -> Result<UnsafeResponse<'_>> {
        let request = into_get(request)?;
        self.protocol.request_unsafe(&request)
    }

    pub fn post_safe(&mut self, request: Request) -> Result<SafeResponse> {
        let request = into_post(request)?;
        self.protocol.request_safe(&request)
    }

    pub fn post_unsafe(&mut self, request: Request) -> Result<UnsafeResponse<'_>> {
        let request = into_post(request)?;
        self.protocol.request_unsafe(&request)
    }
}

/// A GET must not carry a body.
fn into_get(mut request: Request) -> Result<Request, ClientError> {
    if request.body.is_some() {
        return Err(ClientError::GetWithBody);
    }
    request.method = Method::Get;
    Ok(request)
}

/// A POST must carry a body and declare its `Content-Length` itself.
fn into_post(mut request: Request) -> Result<Request, ClientError> {
    if !request.body.as_ref().is_some_and(|body| !body.is_empty()) {
        return Err(ClientError::PostWithoutBody);
    }
    if !request.has_header("content-length") {
        return Err(ClientError::PostWithoutContentLength);
    }
    request.method = Method::Post;
    Ok(request)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use crate::transport::test::ScriptedTransport;

    fn connected() -> Client<ScriptedTransport> {
        let mut client = Client::new(Http1Protocol::new(ScriptedTransport::new()));
        client.connect("test", 0).unwrap();
        client
    }

    #[test]
    fn get_with_body_fails_before_any_write() {
        let mut client = connected();
        let request = Request {
            body: Some(b"nope".to_vec()),
            ..Request::get("/")
        };
        let err = client.get_safe(request).unwrap_err();
        assert!(matches!(err, Error::Client(ClientError::GetWithBody)));
        assert!(client.protocol().transport().written().is_empty());
    }

    #[test]
    fn post_without_body_fails() {
        let mut client = connected();
        let err = client.post_safe(Request::default()).unwrap_err();
        assert!(matches!(err, Error::Client(ClientError::PostWithoutBody)));
    }

    #[test]
    fn post_with_empty_body_fails() {
        let mut client = connected();
        let err = client
            .post_safe(Request::post("/", Vec::<u8>::new()))
            .unwrap_err();
        assert!(matches!(err, Error::Client(ClientError::PostWithoutBody)));
    }

    #[test]
    fn post_without_content_length_fails_before_any_write() {
        let mut client = connected();
        let err = client.post_safe(Request::post("/", "data")).unwrap_err();
        assert!(matches!(
            err,
            Error::Client(ClientError::PostWithoutContentLength)
        ));
        assert!(client.protocol().transport().written().is_empty());
    }

    #[test]
    fn post_with_content_length_goes_through() {
        let mut client = connected();
        client
            .protocol_mut()
            .transport_mut()
            .reply("HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n");

        let request = Request::post("/new", "data").header("Content-Length", "4");
        let response = client.post_safe(request).unwrap();
        assert_eq!(response.status_code, 201);

        const EXPECTED: &[u8] = b"POST /new HTTP/1.1\r\nContent-Length: 4\r\n\r\ndata";
        assert_eq!(client.protocol().transport().written(), EXPECTED);
    }

    #[test]
    fn content_length_name_match_is_case_insensitive() {
        let mut client = connected();
        client
            .protocol_mut()
            .transport_mut()
            .reply("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");

        let request = Request::post("/x", "hi").header("content-LENGTH", "2");
        client.post_safe(request).unwrap();
    }

    #[test]
    fn operation_stamps_the_method() {
        let mut client = connected();
        client
            .protocol_mut()
            .transport_mut()
            .reply("HTTP/1.1 204 No Content\r\n\r\n");

        let mut request = Request::get("/stamped");
        request.method = Method::Post;
        client.get_safe(request).unwrap();

        assert!(client
            .protocol()
            .transport()
            .written()
            .starts_with(b"GET /stamped"));
    }

    #[test]
    fn get_unsafe_returns_borrowed_views() {
        let mut client = connected();
        client
            .protocol_mut()
            .transport_mut()
            .reply("HTTP/1.1 200 OK\r\nContent-Length: 7\r\n\r\nsuccess");

        let response = client.get_unsafe(Request::get("/test")).unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, b"success");
    }
}
