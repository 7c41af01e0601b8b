use crate::core::protocol::{encode_line, Frame, LineReader, SENTINEL};
use crate::core::session::{SessionOutcome, SessionReport};
use crate::domain::error::{EchoError, EchoResult};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

const PROMPT: &str = "> ";

/// Client side of the interactive exchange
pub struct ClientSession<S> {
    reader: LineReader<BufReader<S>>,
    bytes_sent: u64,
    replies: u64,
}

impl<S: AsyncRead + AsyncWrite + Unpin> ClientSession<S> {
    pub fn new(stream: S) -> Self {
        Self {
            reader: LineReader::new(BufReader::new(stream)),
            bytes_sent: 0,
            replies: 0,
        }
    }

    /// Forward lines from `input` to the server and print each reply.
    ///
    /// Exhausted input counts as typing the sentinel so the server is told
    /// the session is over.
    pub async fn run<I, W>(mut self, input: I, console: &mut W) -> EchoResult<SessionReport>
    where
        I: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut input = LineReader::new(input);

        loop {
            write!(console, "{}", PROMPT)?;
            console.flush()?;

            let line = match input.next_line().await? {
                Some(line) => line,
                None => {
                    info!("Input exhausted, closing session");
                    SENTINEL.to_string()
                }
            };

            let data = encode_line(&line);
            let stream = self.reader.get_mut();
            stream.write_all(&data).await?;
            stream.flush().await?;
            self.bytes_sent += data.len() as u64;
            debug!("Sent {} bytes", data.len());

            if Frame::classify(line).is_close() {
                break;
            }

            let reply = self
                .reader
                .next_line()
                .await?
                .ok_or(EchoError::ConnectionClosed)?;

            writeln!(console, "Server sent: {}", reply)?;
            self.replies += 1;
        }

        Ok(SessionReport {
            outcome: SessionOutcome::SentinelSent,
            lines_exchanged: self.replies,
            bytes_received: self.reader.bytes_read(),
            bytes_sent: self.bytes_sent,
        })
    }
}
