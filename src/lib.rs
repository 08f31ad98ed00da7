//! Blocking http 1.1 client library.
//!
//! A minimal engine in three layers:
//!
//! * [`Transport`] — one blocking stream socket (tcp or unix domain).
//! * [`Http1Protocol`] — serializes requests, reads responses into a
//!   reusable buffer and parses them.
//! * [`Client`] — validates request shape, then delegates.
//!
//! Responses come in two flavors. A [`SafeResponse`] owns its fields and
//! is valid indefinitely. An [`UnsafeResponse`] borrows the protocol's
//! receive buffer with zero copies; the borrow must end before the next
//! request can start, which the borrow checker enforces.
//!
//! ```no_run
//! use perch::transport::tcp::TcpTransport;
//! use perch::{Client, Http1Protocol, Request};
//!
//! fn main() -> Result<(), perch::Error> {
//!     let mut client = Client::new(Http1Protocol::new(TcpTransport::new()));
//!     client.connect("127.0.0.1", 8080)?;
//!
//!     let response = client.get_safe(Request::get("/").header("Host", "localhost"))?;
//!     println!("{} {}", response.status_code, response.status_message);
//!
//!     client.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! Framing is `Content-Length` or connection close. There is no chunked
//! transfer encoding, no keep-alive policy, no redirect following, no
//! compression and no tls. Every operation blocks until the OS completes
//! it; there are no timeouts. One request is in flight per connection at
//! a time — callers wanting concurrency create one client per connection.

mod client;
mod error;
mod http1;
mod model;
mod parser;
mod recv;
pub mod transport;

pub use client::Client;
pub use error::{ClientError, Error, Result, TransportError};
pub use http1::Http1Protocol;
pub use model::{Method, Request, SafeResponse, UnsafeResponse};
pub use transport::Transport;
