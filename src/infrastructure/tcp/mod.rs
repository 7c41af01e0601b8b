// TCP module - Echo server and interactive client endpoints
pub mod client;
pub mod server;

pub use client::EchoClient;
pub use server::{EchoServer, ServerReport, SessionLimit, SessionRecord};
