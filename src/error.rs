use std::io;

use thiserror::Error;

/// Faults in the socket layer.
///
/// Kept apart from [`ClientError`]: a transport fault means the bytes could
/// not be moved, a client fault means the bytes were wrong.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is already connected")]
    AlreadyConnected,

    #[error("transport is not connected")]
    NotConnected,

    /// Name resolution failed. Tcp only, unix sockets have no dns phase.
    #[error("dns lookup failed for '{host}': {source}")]
    Dns { host: String, source: io::Error },

    #[error("connect to '{target}' failed: {source}")]
    Connect { target: String, source: io::Error },

    #[error("socket write failed: {0}")]
    Write(#[source] io::Error),

    #[error("socket read failed: {0}")]
    Read(#[source] io::Error),

    /// The connection was torn down mid read (reset or abort). A graceful
    /// close is not an error, it is a read of zero bytes.
    #[error("connection closed while reading")]
    Closed,
}

/// Faults in request shape or response bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("get request must not have a body")]
    GetWithBody,

    #[error("post request must have a body")]
    PostWithoutBody,

    #[error("post request must have a content-length header")]
    PostWithoutContentLength,

    /// The stream ended without `\r\n\r\n` ever arriving.
    #[error("no header separator in response")]
    MissingHeaderSeparator,

    #[error("malformed status line")]
    BadStatusLine,

    #[error("status code is not a number")]
    BadStatusCode,

    #[error("content-length is not a number")]
    BadContentLength,

    /// The peer declared a content length and closed before sending it.
    #[error("connection closed with {received} of {expected} body bytes received")]
    ClosedBeforeContentLength { expected: usize, received: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Client(#[from] ClientError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
