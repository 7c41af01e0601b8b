use crate::core::protocol::{accepted_reply, encode_line, Frame, LineReader};
use crate::core::session::{SessionOutcome, SessionReport};
use crate::domain::error::EchoResult;
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// Server side of one accepted connection.
///
/// Echoes every line back with the accepted marker until the peer sends the
/// sentinel or closes the stream. Buffers live and die with the session.
pub struct ServerSession<S> {
    reader: LineReader<BufReader<S>>,
    bytes_sent: u64,
    lines_echoed: u64,
}

impl<S: AsyncRead + AsyncWrite + Unpin> ServerSession<S> {
    pub fn new(stream: S) -> Self {
        Self {
            reader: LineReader::new(BufReader::new(stream)),
            bytes_sent: 0,
            lines_echoed: 0,
        }
    }

    /// Run the echo loop, reporting received lines on `console`
    pub async fn run<W: Write>(self, console: &mut W) -> EchoResult<SessionReport> {
        self.run_until(console, std::future::pending()).await
    }

    /// Run the echo loop until the peer ends the session or `interrupt`
    /// resolves while waiting for the next line.
    ///
    /// An interrupted session keeps the counters gathered so far.
    pub async fn run_until<W, F>(
        mut self,
        console: &mut W,
        interrupt: F,
    ) -> EchoResult<SessionReport>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);

        let outcome = loop {
            let next = tokio::select! {
                next = self.reader.next_line() => next?,
                _ = &mut interrupt => {
                    debug!("Session interrupted");
                    break SessionOutcome::Interrupted;
                }
            };

            let line = match next {
                Some(line) => line,
                None => {
                    debug!("Peer closed the stream");
                    break SessionOutcome::PeerClosed;
                }
            };

            let line = match Frame::classify(line) {
                Frame::Close => {
                    debug!("Sentinel received");
                    break SessionOutcome::SentinelReceived;
                }
                Frame::Data(line) => line,
            };

            // One write per notice so concurrent sessions never split a line
            console.write_all(format!("Client sent: {}\n", line).as_bytes())?;
            console.flush()?;

            let data = encode_line(&accepted_reply(&line));
            let stream = self.reader.get_mut();
            stream.write_all(&data).await?;
            stream.flush().await?;

            self.bytes_sent += data.len() as u64;
            self.lines_echoed += 1;
            debug!("Echoed {} bytes", data.len());
        };

        Ok(SessionReport {
            outcome,
            lines_exchanged: self.lines_echoed,
            bytes_received: self.reader.bytes_read(),
            bytes_sent: self.bytes_sent,
        })
    }
}
