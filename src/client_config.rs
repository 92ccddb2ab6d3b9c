use crate::connection::Endpoint;
use crate::logger::Sink;
use std::sync::Arc;
use std::time::Duration;

/// How long a request may take, from the first byte written to the end of the response
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(300);

/// How long a single header, content or padding read may stall
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(4);

/// Shortest io timeout a [`ClientConfig`] accepts
pub const MIN_IO_TIMEOUT: Duration = Duration::from_millis(1);

/// What to do when a response arrives in several `STDOUT`/`STDERR` records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Each non-empty record's content replaces what came before. Only the last one is returned.
    #[default]
    Replace,
    /// Record contents are concatenated in arrival order.
    Append,
}

/// Configuration for a FastCGI [`Client`](crate::Client)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) endpoint: Endpoint,
    pub(crate) response_timeout: Duration,
    pub(crate) io_timeout: Duration,
    pub(crate) output_mode: OutputMode,
    pub(crate) sink: Sink,
}

impl ClientConfig {
    /// Creates the configuration of a client talking to the application at `endpoint`
    pub fn new(endpoint: impl Into<Endpoint>) -> Self {
        Self {
            endpoint: endpoint.into(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            io_timeout: DEFAULT_IO_TIMEOUT,
            output_mode: OutputMode::default(),
            sink: Sink::default(),
        }
    }

    /// Sets the default deadline of [`Client::send_request`](crate::Client::send_request)
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Sets how long any single read may wait for data.
    ///
    /// A read that times out is retried until the response deadline passes, so this bounds how
    /// late past its deadline a request can return. It is at least [`MIN_IO_TIMEOUT`]: a zero
    /// timeout would let a read wait forever.
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout.max(MIN_IO_TIMEOUT);
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Sends this client's diagnostics to `logger` instead of the process-wide `log` logger
    pub fn logger(mut self, logger: Arc<dyn log::Log>) -> Self {
        self.sink = Sink::new(logger);
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}
