use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connecting to {addr} timed out")]
    ConnectTimeout { addr: String },

    /// The RESP stream could not be encoded or decoded.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server answered with an error reply, e.g. `WRONGTYPE`.
    #[error("{command} failed: {message}")]
    Server { command: String, message: String },

    #[error("Unexpected reply to {command}: {reply}")]
    UnexpectedReply { command: String, reply: String },

    #[error("Connection closed by server")]
    ConnectionClosed,
}
