use std::io;

/// Errors raised while encoding or decoding FastCGI records
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Record content of {0} bytes exceeds the FastCGI limit of 65535 bytes")]
    ContentTooLong(usize),

    #[error("Name-value pair side of {0} bytes exceeds the FastCGI limit of 2^31 - 1 bytes")]
    PairTooLong(usize),

    #[error("Received malformed FastCGI record for type '{0}'")]
    MalformedRecordPayload(&'static str),

    #[error("Unsupported FastCGI protocol status: '{0}'")]
    UnsupportedProtocolStatus(u8),
}

/// The ways a single transport operation can fail
///
/// A successful operation is simply `Ok`.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Any socket-level failure other than an orderly close.
    #[error("transport io operation failed")]
    Io(#[from] io::Error),

    /// The peer closed the connection, or the socket was never opened.
    #[error("the connection is closed")]
    Closed,

    /// The operation did not complete before its deadline.
    #[error("the operation timed out")]
    Timeout,
}
