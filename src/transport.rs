use crate::connection::{Connection, Endpoint};
use crate::error::TransportError;
use crate::logger::{diag, Sink};
use crate::reactor::ReactorHandle;
use std::io;
use std::time::{Duration, Instant};

/// A byte stream the [`Client`](crate::Client) can run FastCGI over
///
/// Implementations only ever see one caller at a time: the client serializes every operation
/// behind its own lock.
pub trait Transport {
    /// Connects to `endpoint`.
    fn open(&mut self, endpoint: &Endpoint) -> Result<(), TransportError>;

    /// Writes all of `bytes`, blocking until done.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Reads exactly `len` bytes.
    ///
    /// Gives up with [`TransportError::Timeout`] once `timeout` elapses. A zero `timeout` waits
    /// indefinitely.
    fn read(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>, TransportError>;

    /// Cancels anything in flight and closes the connection. Closing twice is a no-op.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// The socket transport
///
/// Sockets are serviced by a background reactor thread that lives as long as the transport.
/// Calls block the calling thread, never the reactor.
pub struct StreamTransport {
    reactor: ReactorHandle,
    open: bool,
    sink: Sink,
}

impl StreamTransport {
    /// Starts the reactor thread.
    pub fn new() -> Result<Self, io::Error> {
        Self::with_sink(Sink::default())
    }

    pub(crate) fn with_sink(sink: Sink) -> Result<Self, io::Error> {
        Ok(Self {
            reactor: ReactorHandle::start(sink.clone())?,
            open: false,
            sink,
        })
    }
}

impl Transport for StreamTransport {
    fn open(&mut self, endpoint: &Endpoint) -> Result<(), TransportError> {
        let connection = Connection::connect(endpoint).inspect_err(|err| {
            diag!(self.sink, Warn, error = err; "Unable to connect to {endpoint}");
        })?;

        self.reactor.attach(connection).inspect_err(|err| {
            diag!(self.sink, Warn, error = err; "Unable to register connection to {endpoint}");
        })?;

        self.open = true;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.open {
            diag!(self.sink, Warn, "Unable to write, socket closed");
            return Err(TransportError::Closed);
        }

        self.reactor.write(bytes.to_vec()).inspect_err(|err| {
            diag!(self.sink, Warn, error = err; "Write error");
        })
    }

    fn read(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }

        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);
        self.reactor.read(len, deadline)
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }

        if let Err(err) = self.reactor.detach() {
            diag!(self.sink, Warn, error = err; "Failed to close connection");
        }
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
