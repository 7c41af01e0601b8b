use thiserror::Error;

/// echoline unified error type
#[derive(Error, Debug)]
pub enum EchoError {
    #[error("Network error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Output error: {0}")]
    Output(String),
}

pub type EchoResult<T> = Result<T, EchoError>;
