//! Byte level response parsing.
//!
//! Pure functions over the receive buffer. The read loop uses
//! [`find_separator`] and [`scan_content_length`] to frame a response while
//! bytes are still arriving; [`parse_response`] runs once the response is
//! complete and returns views borrowing the buffer.

use std::str;

use crate::error::ClientError;
use crate::model::UnsafeResponse;

const SEPARATOR: &[u8] = b"\r\n\r\n";

/// Index of the first `\r\n\r\n`, if any.
pub(crate) fn find_separator(buf: &[u8]) -> Option<usize> {
    buf.windows(SEPARATOR.len()).position(|w| w == SEPARATOR)
}

pub(crate) fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Case-insensitive `Content-Length` lookup in a complete header block.
///
/// Walks header lines the same way [`parse_response`] does, so framing and
/// parsing cannot disagree about which headers exist. First match wins.
pub(crate) fn scan_content_length(head: &[u8]) -> Result<Option<usize>, ClientError> {
    let mut pos = match find_crlf(head) {
        Some(end) => end + 2, // skip the status line
        None => return Ok(None),
    };

    while pos < head.len() {
        let Some(end) = find_crlf(&head[pos..]) else {
            break;
        };
        let line = &head[pos..pos + end];
        if line.is_empty() {
            break;
        }
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            break;
        };
        if line[..colon].eq_ignore_ascii_case(b"content-length") {
            let value = str::from_utf8(&line[colon + 1..])
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .ok_or(ClientError::BadContentLength)?;
            return Ok(Some(value));
        }
        pos += end + 2;
    }

    Ok(None)
}

/// Parse a complete response into views over `buf`.
///
/// `buf` is the filled part of the receive buffer and `header_size` the
/// offset just past the header separator. A malformed status line is an
/// error; a malformed header line just ends header parsing. The body is
/// sliced to exactly `content_length` bytes when one is known, which is
/// also what leaves any excess bytes in the buffer ignored. Without a
/// content length the body runs to the end of the buffer (close
/// delimited).
pub(crate) fn parse_response(
    buf: &[u8],
    header_size: usize,
    content_length: Option<usize>,
) -> Result<UnsafeResponse<'_>, ClientError> {
    let head = &buf[..header_size];

    let line_end = find_crlf(head).ok_or(ClientError::BadStatusLine)?;
    let line = &head[..line_end];

    let first_space = line
        .iter()
        .position(|&b| b == b' ')
        .ok_or(ClientError::BadStatusLine)?;
    let second_space = line[first_space + 1..]
        .iter()
        .position(|&b| b == b' ')
        .map(|p| first_space + 1 + p)
        .ok_or(ClientError::BadStatusLine)?;

    let status_code = str::from_utf8(&line[first_space + 1..second_space])
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .ok_or(ClientError::BadStatusCode)?;
    let status_message =
        str::from_utf8(&line[second_space + 1..]).map_err(|_| ClientError::BadStatusLine)?;

    let mut headers = Vec::new();
    let mut pos = line_end + 2;
    while pos < header_size {
        let Some(end) = find_crlf(&head[pos..]) else {
            break;
        };
        let line = &head[pos..pos + end];
        if line.is_empty() {
            break;
        }
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            break;
        };
        let mut value = &line[colon + 1..];
        while let [b' ' | b'\t', rest @ ..] = value {
            value = rest;
        }
        let (Ok(name), Ok(value)) = (str::from_utf8(&line[..colon]), str::from_utf8(value)) else {
            break;
        };
        headers.push((name, value));
        pos += end + 2;
    }

    let body = match content_length {
        Some(length) => &buf[header_size..header_size + length],
        None => &buf[header_size..],
    };

    Ok(UnsafeResponse {
        status_code,
        status_message,
        headers,
        body,
    })
}
