// Core module - Protocol and session logic
pub mod console;
pub mod protocol;
pub mod session;
