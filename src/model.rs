use std::fmt;

/// Http method. The engine speaks GET and POST only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to send.
///
/// Headers go on the wire in insertion order, duplicates allowed. The
/// engine never adds headers of its own: a POST caller supplies the
/// `Content-Length` header themselves.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: Method::Get,
            path: "/".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn post(path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// Append a header. Chainable.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub(crate) fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

/// A response borrowing the protocol's receive buffer.
///
/// Every field is a view into the buffer that received it, so nothing is
/// copied. The borrow ties the response to the protocol instance: the next
/// request needs `&mut` access to the buffer, which means a live
/// `UnsafeResponse` must be dropped, or copied out with
/// [`UnsafeResponse::to_safe`], first. "Unsafe" is this engine's word for
/// zero-copy and lifetime-bound; no `unsafe` code is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsafeResponse<'a> {
    pub status_code: u16,
    pub status_message: &'a str,
    pub headers: Vec<(&'a str, &'a str)>,
    pub body: &'a [u8],
}

impl UnsafeResponse<'_> {
    /// Deep copy into a [`SafeResponse`] that outlives buffer reuse.
    pub fn to_safe(&self) -> SafeResponse {
        SafeResponse {
            status_code: self.status_code,
            status_message: self.status_message.to_string(),
            headers: self
                .headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            body: self.body.to_vec(),
        }
    }
}

/// A response owning all of its fields. Valid indefinitely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeResponse {
    pub status_code: u16,
    pub status_message: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}
