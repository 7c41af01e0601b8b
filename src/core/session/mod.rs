// Session module - Per-connection line exchange loops
pub mod client;
pub mod report;
pub mod server;

pub use client::ClientSession;
pub use report::{SessionOutcome, SessionReport};
pub use server::ServerSession;
