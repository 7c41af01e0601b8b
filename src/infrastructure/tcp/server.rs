use crate::core::console::Console;
use crate::core::session::{ServerSession, SessionReport};
use crate::domain::error::{EchoError, EchoResult};
use serde::Serialize;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};

const ACCEPT_BACKOFF_BASE: Duration = Duration::from_millis(50);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// How many connections the server accepts before it stops listening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLimit {
    Limited(usize),
    Unlimited,
}

impl SessionLimit {
    /// Map a configured maximum, where 0 means no limit
    pub fn from_max_sessions(max_sessions: usize) -> Self {
        if max_sessions == 0 {
            SessionLimit::Unlimited
        } else {
            SessionLimit::Limited(max_sessions)
        }
    }

    fn allows(&self, accepted: usize) -> bool {
        match self {
            SessionLimit::Limited(max) => accepted < *max,
            SessionLimit::Unlimited => true,
        }
    }
}

impl Default for SessionLimit {
    fn default() -> Self {
        SessionLimit::Limited(1)
    }
}

/// Record of one served connection
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub peer_addr: SocketAddr,
    pub host: String,
    pub report: Option<SessionReport>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerReport {
    pub bind_addr: SocketAddr,
    pub sessions: Vec<SessionRecord>,
}

pub struct EchoServer {
    listener: TcpListener,
    bind_addr: SocketAddr,
    console: Console,
}

impl EchoServer {
    pub async fn bind(bind_addr: &str) -> EchoResult<Self> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|source| EchoError::Bind {
                addr: bind_addr.to_string(),
                source,
            })?;

        let actual_addr = listener.local_addr()?;
        info!("Echo server listening on {}", actual_addr);

        Ok(Self {
            listener,
            bind_addr: actual_addr,
            console: Console::stdout(),
        })
    }

    /// Send session notices to `console` instead of stdout
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn get_bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Accept connections until `limit` is reached or `shutdown` resolves.
    ///
    /// Each connection runs on its own task. Once accepting stops the
    /// listener is closed and running sessions are awaited. When `shutdown`
    /// resolves, before or after the limit is reached, every running session
    /// is interrupted at its next read and still reported.
    pub async fn serve<F>(self, limit: SessionLimit, shutdown: F) -> EchoResult<ServerReport>
    where
        F: Future<Output = ()>,
    {
        let EchoServer {
            listener,
            bind_addr,
            console,
        } = self;
        let (interrupt_tx, _) = watch::channel(false);
        let mut sessions = JoinSet::new();
        let mut accepted = 0usize;
        let mut accept_errors = 0u32;
        let mut shutdown_fired = false;
        tokio::pin!(shutdown);

        while limit.allows(accepted) {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            accepted += 1;
                            accept_errors = 0;
                            sessions.spawn(handle_connection(
                                stream,
                                addr,
                                console.clone(),
                                interrupt_tx.subscribe(),
                            ));
                        }
                        Err(e) => {
                            accept_errors = accept_errors.saturating_add(1);
                            let delay = accept_backoff(accept_errors);
                            error!("Failed to accept connection: {}, retrying in {:?}", e, delay);
                            tokio::time::sleep(delay).await;
                        }
                    }
                }

                _ = &mut shutdown => {
                    info!("Received shutdown signal, stopping server");
                    interrupt_tx.send_replace(true);
                    shutdown_fired = true;
                    break;
                }
            }
        }

        drop(listener);
        debug!("Listener on {} closed after {} connections", bind_addr, accepted);

        let mut report = ServerReport {
            bind_addr,
            sessions: Vec::with_capacity(accepted),
        };
        loop {
            tokio::select! {
                joined = sessions.join_next() => {
                    match joined {
                        Some(Ok(record)) => report.sessions.push(record),
                        Some(Err(e)) => warn!("Session task completed with error: {}", e),
                        None => break,
                    }
                }

                _ = &mut shutdown, if !shutdown_fired => {
                    info!("Received shutdown signal, interrupting {} running sessions", sessions.len());
                    interrupt_tx.send_replace(true);
                    shutdown_fired = true;
                }
            }
        }

        info!("Echo server stopped");
        Ok(report)
    }
}

/// Delay before retrying after `consecutive_errors` failed accepts in a row
fn accept_backoff(consecutive_errors: u32) -> Duration {
    let exponent = consecutive_errors.saturating_sub(1).min(8);
    (ACCEPT_BACKOFF_BASE * 2u32.pow(exponent)).min(ACCEPT_BACKOFF_MAX)
}

/// Resolves once the server raises the interrupt flag
async fn interrupted(mut interrupt: watch::Receiver<bool>) {
    let raised = interrupt.wait_for(|stop| *stop).await.is_ok();
    if !raised {
        // Sender gone without raising the flag
        std::future::pending::<()>().await;
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    console: Console,
    interrupt: watch::Receiver<bool>,
) -> SessionRecord {
    let session_id = uuid::Uuid::new_v4().simple().to_string();
    let span = info_span!("session", id = %session_id, peer = %addr);

    async move {
        let host = resolve_host_name(addr.ip()).await;
        notify(&console, &format!("Client: <{}> connected successfully!", host));
        info!("New client connected: {}", addr);

        let mut record = SessionRecord {
            session_id,
            peer_addr: addr,
            host,
            report: None,
            error: None,
        };

        let mut session_console = console.clone();
        match ServerSession::new(stream)
            .run_until(&mut session_console, interrupted(interrupt))
            .await
        {
            Ok(report) => {
                info!(
                    "Session ended ({}), {} lines echoed",
                    report.outcome, report.lines_exchanged
                );
                record.report = Some(report);
            }
            Err(e) => {
                error!("Session with {} failed: {:?}", addr, e);
                record.error = Some(e.to_string());
            }
        }

        notify(&console, "Client closed connection.");
        record
    }
    .instrument(span)
    .await
}

fn notify(console: &Console, text: &str) {
    if let Err(e) = console.line(text) {
        warn!("Failed to write to console: {}", e);
    }
}

/// Reverse-resolve a peer address, falling back to its textual form
pub async fn resolve_host_name(ip: IpAddr) -> String {
    match tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&ip)).await {
        Ok(Ok(host)) => host,
        Ok(Err(e)) => {
            debug!("Reverse lookup for {} failed: {}", ip, e);
            ip.to_string()
        }
        Err(e) => {
            warn!("Reverse lookup task failed: {}", e);
            ip.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::SessionOutcome;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpStream;

    #[test]
    fn test_session_limit_from_config() {
        assert_eq!(SessionLimit::from_max_sessions(0), SessionLimit::Unlimited);
        assert_eq!(SessionLimit::from_max_sessions(3), SessionLimit::Limited(3));
        assert_eq!(SessionLimit::default(), SessionLimit::Limited(1));
    }

    #[test]
    fn test_session_limit_allows() {
        let limit = SessionLimit::Limited(2);
        assert!(limit.allows(0));
        assert!(limit.allows(1));
        assert!(!limit.allows(2));
        assert!(SessionLimit::Unlimited.allows(usize::MAX));
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let server = EchoServer::bind("127.0.0.1:0").await.unwrap();
        assert_ne!(server.get_bind_addr().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let first = EchoServer::bind("127.0.0.1:0").await.unwrap();
        let addr = first.get_bind_addr().to_string();

        let second = EchoServer::bind(&addr).await;
        assert!(matches!(second, Err(EchoError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_single_session_then_exit() {
        let server = EchoServer::bind("127.0.0.1:0").await.unwrap();
        let addr = server.get_bind_addr();
        let handle = tokio::spawn(server.serve(SessionLimit::Limited(1), std::future::pending()));

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut stream = BufReader::new(stream);
        stream.write_all(b"ping\n").await.unwrap();

        let mut reply = String::new();
        stream.read_line(&mut reply).await.unwrap();
        assert_eq!(reply, "ping - accepted\n");

        stream.write_all(b"close\n").await.unwrap();

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.sessions.len(), 1);
        let session = report.sessions[0].report.as_ref().unwrap();
        assert_eq!(session.outcome, SessionOutcome::SentinelReceived);
        assert_eq!(session.lines_exchanged, 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_accepting() {
        let server = EchoServer::bind("127.0.0.1:0").await.unwrap();
        let report = server
            .serve(SessionLimit::Unlimited, async {})
            .await
            .unwrap();

        assert!(report.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_idle_session() {
        let server = EchoServer::bind("127.0.0.1:0").await.unwrap();
        let addr = server.get_bind_addr();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(SessionLimit::Limited(1), async {
            let _ = stop_rx.await;
        }));

        // The limit is reached once this connection is accepted
        let mut stream = BufReader::new(TcpStream::connect(addr).await.unwrap());
        stream.write_all(b"ping\n").await.unwrap();
        let mut reply = String::new();
        stream.read_line(&mut reply).await.unwrap();
        assert_eq!(reply, "ping - accepted\n");

        stop_tx.send(()).unwrap();
        let report = tokio::time::timeout(Duration::from_secs(3), handle)
            .await
            .expect("server kept waiting on an idle session")
            .unwrap()
            .unwrap();

        assert_eq!(report.sessions.len(), 1);
        let session = report.sessions[0].report.as_ref().unwrap();
        assert_eq!(session.outcome, SessionOutcome::Interrupted);
        assert_eq!(session.lines_exchanged, 1);

        // The server dropped its end of the connection
        let mut rest = String::new();
        assert_eq!(stream.read_line(&mut rest).await.unwrap(), 0);
    }

    #[test]
    fn test_accept_backoff_grows_and_caps() {
        assert_eq!(accept_backoff(1), Duration::from_millis(50));
        assert_eq!(accept_backoff(2), Duration::from_millis(100));
        assert_eq!(accept_backoff(4), Duration::from_millis(400));
        assert_eq!(accept_backoff(6), ACCEPT_BACKOFF_MAX);
        assert_eq!(accept_backoff(u32::MAX), ACCEPT_BACKOFF_MAX);
    }

    #[tokio::test]
    async fn test_interrupted_waits_for_flag() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(interrupted(rx));

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        tx.send_replace(true);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_resolve_loopback() {
        let host = resolve_host_name("127.0.0.1".parse().unwrap()).await;
        assert!(!host.is_empty());
    }
}
