//! Line protocol shared by the echo server and the interactive client.
//!
//! Messages are UTF-8 text terminated by `\n`. The exact line `close` ends a
//! session in either direction and is never echoed.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Port the server listens on and the client dials
pub const DEFAULT_PORT: u16 = 30333;

/// Host the client dials
pub const DEFAULT_HOST: &str = "localhost";

/// Address the server binds to
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Line that terminates a session
pub const SENTINEL: &str = "close";

/// Marker appended to every echoed line
pub const ACCEPTED_SUFFIX: &str = " - accepted";

const DELIMITER: u8 = b'\n';

/// A classified line received from the peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Ordinary payload
    Data(String),
    /// The session termination sentinel
    Close,
}

impl Frame {
    /// Classify a line with its terminator already removed.
    ///
    /// Matching is exact and case-sensitive: `"Close"` or `" close"` are data.
    pub fn classify(line: impl Into<String>) -> Self {
        let line = line.into();
        if line == SENTINEL {
            Frame::Close
        } else {
            Frame::Data(line)
        }
    }

    pub fn is_close(&self) -> bool {
        matches!(self, Frame::Close)
    }
}

/// Build the server's reply for a received line
pub fn accepted_reply(line: &str) -> String {
    let mut reply = String::with_capacity(line.len() + ACCEPTED_SUFFIX.len());
    reply.push_str(line);
    reply.push_str(ACCEPTED_SUFFIX);
    reply
}

/// Encode a line for the wire, appending the delimiter
pub fn encode_line(line: &str) -> Vec<u8> {
    let mut data = Vec::with_capacity(line.len() + 1);
    data.extend_from_slice(line.as_bytes());
    data.push(DELIMITER);
    data
}

/// Reads newline-delimited lines from a buffered async source
pub struct LineReader<R> {
    inner: R,
    buffer: Vec<u8>,
    bytes_read: u64,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(256),
            bytes_read: 0,
        }
    }

    /// Read the next line without its terminator.
    ///
    /// Returns `Ok(None)` once the source is exhausted. A trailing `\r` is
    /// dropped, and a final line without a terminator is still returned.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buffer.clear();
        let n = self.inner.read_until(DELIMITER, &mut self.buffer).await?;
        if n == 0 {
            return Ok(None);
        }
        self.bytes_read += n as u64;

        if self.buffer.last() == Some(&DELIMITER) {
            self.buffer.pop();
            if self.buffer.last() == Some(&b'\r') {
                self.buffer.pop();
            }
        }

        Ok(Some(String::from_utf8_lossy(&self.buffer).into_owned()))
    }

    /// Total bytes consumed, terminators included
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }
}
