//! Response read loop state machine.
//!
//! Accumulates socket reads into one growable buffer and decides when a
//! response is complete: either `Content-Length` bytes past the header
//! separator have arrived, or no length was declared and the peer closed
//! the connection. Keeping this free of any transport makes the boundary
//! conditions (split headers, split body, early close) testable on their
//! own.

use log::trace;

use crate::error::ClientError;
use crate::parser;

/// Read increment. The tail slice handed to `Transport::read_into` is at
/// least this large.
pub(crate) const CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecvState {
    /// Header separator not seen yet.
    AwaitingHeaders,
    /// Headers framed, waiting for enough body bytes.
    AwaitingBody,
    /// Response complete, ready to parse.
    Complete,
}

pub(crate) struct RecvBuffer {
    buf: Vec<u8>,
    /// Bytes of `buf` filled by reads. The rest is spare room.
    filled: usize,
    /// How far the separator scan has come, to avoid rescanning.
    scanned: usize,
    /// Offset just past `\r\n\r\n`, 0 until the separator is found.
    header_size: usize,
    content_length: Option<usize>,
    state: RecvState,
}

impl RecvBuffer {
    pub(crate) fn new() -> Self {
        Self {
            buf: Vec::new(),
            filled: 0,
            scanned: 0,
            header_size: 0,
            content_length: None,
            state: RecvState::AwaitingHeaders,
        }
    }

    /// Reset for the next response. Keeps the allocation.
    pub(crate) fn reset(&mut self) {
        self.filled = 0;
        self.scanned = 0;
        self.header_size = 0;
        self.content_length = None;
        self.state = RecvState::AwaitingHeaders;
    }

    /// Spare room to read the next chunk into.
    pub(crate) fn spare(&mut self) -> &mut [u8] {
        if self.buf.len() - self.filled < CHUNK {
            self.buf.resize(self.filled + CHUNK, 0);
        }
        &mut self.buf[self.filled..]
    }

    /// Account for `n` bytes read into the slice returned by [`Self::spare`].
    pub(crate) fn commit(&mut self, n: usize) -> Result<RecvState, ClientError> {
        self.filled += n;

        if self.state == RecvState::AwaitingHeaders {
            // The separator can straddle a read boundary, hence backing up
            // 3 bytes from where the previous scan stopped.
            let from = self.scanned.saturating_sub(3);
            if let Some(pos) = parser::find_separator(&self.buf[from..self.filled]) {
                self.header_size = from + pos + 4;
                self.content_length = parser::scan_content_length(&self.buf[..self.header_size])?;
                trace!(
                    "headers framed: {} bytes, content length {:?}",
                    self.header_size,
                    self.content_length
                );
                self.state = RecvState::AwaitingBody;
            }
            self.scanned = self.filled;
        }

        if self.state == RecvState::AwaitingBody {
            if let Some(length) = self.content_length {
                if self.filled >= self.header_size + length {
                    self.state = RecvState::Complete;
                }
            }
        }

        Ok(self.state)
    }

    /// The peer closed the connection (a read of zero bytes).
    pub(crate) fn peer_closed(&mut self) -> Result<RecvState, ClientError> {
        match self.state {
            RecvState::AwaitingHeaders => Err(ClientError::MissingHeaderSeparator),
            RecvState::AwaitingBody => {
                if let Some(expected) = self.content_length {
                    let received = self.filled - self.header_size;
                    if received < expected {
                        return Err(ClientError::ClosedBeforeContentLength { expected, received });
                    }
                }
                // No declared length: the close is what delimits the body.
                self.state = RecvState::Complete;
                Ok(self.state)
            }
            RecvState::Complete => Ok(RecvState::Complete),
        }
    }

    pub(crate) fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    pub(crate) fn header_size(&self) -> usize {
        self.header_size
    }

    pub(crate) fn content_length(&self) -> Option<usize> {
        self.content_length
    }
}
