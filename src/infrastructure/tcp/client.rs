use crate::core::session::{ClientSession, SessionReport};
use crate::domain::error::{EchoError, EchoResult};
use std::io::Write;
use std::net::SocketAddr;
use tokio::io::AsyncBufRead;
use tokio::net::TcpStream;
use tracing::{info, warn};

/// Interactive client holding its single server connection
pub struct EchoClient {
    stream: TcpStream,
    peer_addr: Option<SocketAddr>,
}

impl EchoClient {
    pub async fn connect(host: &str, port: u16) -> EchoResult<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| EchoError::Connect {
                addr: format!("{}:{}", host, port),
                source,
            })?;

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let peer_addr = stream.peer_addr().ok();
        info!("TCP connection established to {}:{}", host, port);

        Ok(Self { stream, peer_addr })
    }

    pub fn get_peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Run the prompt loop; the connection is closed when this returns
    pub async fn run<I, W>(self, input: I, console: &mut W) -> EchoResult<SessionReport>
    where
        I: AsyncBufRead + Unpin,
        W: Write,
    {
        let report = ClientSession::new(self.stream).run(input, console).await?;

        writeln!(console, "Client closed connection.")?;
        info!(
            "TCP client closed after {} replies ({} bytes sent, {} bytes received)",
            report.lines_exchanged, report.bytes_sent, report.bytes_received
        );
        Ok(report)
    }
}
