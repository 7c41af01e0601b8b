//! echoline Library
//!
//! Line-oriented TCP echo protocol: a server that answers each line with
//! `<line> - accepted` and an interactive client that sends terminal input.
//! The line `close` ends a session.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::core::console::Console;
pub use crate::core::protocol::{Frame, ACCEPTED_SUFFIX, DEFAULT_HOST, DEFAULT_PORT, SENTINEL};
pub use crate::core::session::{ClientSession, ServerSession, SessionOutcome, SessionReport};
pub use domain::config::EchoConfig;
pub use domain::error::{EchoError, EchoResult};
pub use infrastructure::tcp::{EchoClient, EchoServer, ServerReport, SessionLimit};
