use crate::client_config::{ClientConfig, OutputMode};
use crate::error::TransportError;
use crate::logger::diag;
use crate::record::{EndRequest, Header, RecordType, FCGI_VERSION, HEADER_LEN};
use crate::request::{encode_request, new_request_id};
use crate::response::Response;
use crate::transport::{StreamTransport, Transport};
use std::io;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A FastCGI client bound to one application endpoint
///
/// The client keeps a single connection open across requests. Every public method takes the
/// same lock, so requests from several threads are sent one after the other, never interleaved.
pub struct Client<T = StreamTransport> {
    config: ClientConfig,
    transport: Mutex<T>,
}

// One record read off the wire, padding already discarded
#[derive(Debug)]
struct Incoming {
    header: Header,
    content: Vec<u8>,
}

impl Client<StreamTransport> {
    /// Creates a client and starts its reactor thread.
    ///
    /// No connection is made until [`Client::open_connection`] is called.
    pub fn new(config: ClientConfig) -> Result<Self, io::Error> {
        let transport = StreamTransport::with_sink(config.sink.clone())?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client running over a custom transport
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport: Mutex::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens the connection to the application.
    ///
    /// Does nothing if the connection is already open.
    pub fn open_connection(&self) -> bool {
        let mut transport = self.lock();

        if transport.is_open() {
            diag!(self.config.sink, Info, "Connection to {} already open", self.config.endpoint);
            return true;
        }

        match transport.open(&self.config.endpoint) {
            Ok(()) => true,
            Err(err) => {
                diag!(self.config.sink, Warn, error = err; "Failed to open connection to {}", self.config.endpoint);
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_open()
    }

    /// Sends a responder request and waits for its response, for at most the configured response
    /// timeout.
    ///
    /// Parameters with an empty name or an empty value are not sent.
    pub fn send_request<N, V>(&self, params: &[(N, V)], body: impl AsRef<[u8]>) -> Response
    where
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.send_request_with_timeout(params, body, self.config.response_timeout)
    }

    /// Sends a responder request and waits at most `timeout` for its response.
    ///
    /// The wait can overrun `timeout` by up to one io timeout.
    pub fn send_request_with_timeout<N, V>(
        &self,
        params: &[(N, V)],
        body: impl AsRef<[u8]>,
        timeout: Duration,
    ) -> Response
    where
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut transport = self.lock();

        if !transport.is_open() {
            diag!(self.config.sink, Warn, "Connection not opened yet");
            return Response::failed();
        }

        let request_id = new_request_id();
        let request = match encode_request(request_id, params, body.as_ref()) {
            Ok(request) => request,
            Err(err) => {
                diag!(self.config.sink, Error, error = err; "Failed to encode request {request_id}");
                return Response::failed();
            }
        };

        if let Err(err) = transport.write(&request) {
            diag!(self.config.sink, Warn, error = err; "Failed to send request {request_id}");
            return Response::failed();
        }

        self.await_response(&mut *transport, request_id, timeout)
    }

    /// Closes the connection. Closing a closed connection is a no-op.
    pub fn close_connection(&self) {
        self.lock().close();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, T> {
        // A panic while holding the lock leaves nothing half-updated that a later call could
        // trip over.
        self.transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // Reads records until the application ends `request_id`, or until `timeout` has passed.
    //
    // A failed read does not abort the request: a stalled application gets until the deadline to
    // resume. Records belonging to other requests are consumed and dropped.
    fn await_response(&self, transport: &mut T, request_id: u16, timeout: Duration) -> Response {
        let deadline = Instant::now() + timeout;
        let mut response = Response::failed();
        let mut closed = false;

        loop {
            match self.read_record(transport) {
                // Every read fails the same way once the peer is gone
                Err(TransportError::Closed) if closed => {}
                Err(err) => {
                    closed = matches!(err, TransportError::Closed);
                    diag!(self.config.sink, Warn, error = err; "Failed to receive FastCGI record");
                }
                Ok(record) if record.header.request_id != request_id => {
                    diag!(
                        self.config.sink,
                        Debug,
                        "Skipping {:?} record for request {}, expected {request_id}",
                        record.header.record_type,
                        record.header.request_id
                    );
                }
                Ok(record) => match record.header.record_type {
                    RecordType::Stdout => {
                        self.collect(&mut response, record.content);
                        response.success = true;
                    }
                    RecordType::Stderr => {
                        diag!(
                            self.config.sink,
                            Warn,
                            "Application wrote to stderr: {}",
                            String::from_utf8_lossy(&record.content)
                        );
                        self.collect(&mut response, record.content);
                    }
                    RecordType::EndRequest => {
                        match EndRequest::from_record_bytes(&record.content) {
                            Ok(end) => response.end_request = Some(end),
                            Err(err) => {
                                diag!(self.config.sink, Warn, error = err; "Ignoring malformed end of request {request_id}");
                            }
                        }
                        return response;
                    }
                    other => {
                        diag!(self.config.sink, Debug, "Ignoring {other:?} record for request {request_id}");
                    }
                },
            }

            if Instant::now() > deadline {
                diag!(self.config.sink, Warn, "Request {request_id} timed out");
                // Without the end of the request, whatever arrived may be incomplete
                response.success = false;
                return response;
            }
        }
    }

    // An empty record only closes its stream, it never clears what was received before it.
    fn collect(&self, response: &mut Response, content: Vec<u8>) {
        if content.is_empty() {
            return;
        }
        match self.config.output_mode {
            OutputMode::Replace => response.content = content,
            OutputMode::Append => response.content.extend(content),
        }
    }

    // Header, content and padding are each a separate read with their own io timeout.
    fn read_record(&self, transport: &mut T) -> Result<Incoming, TransportError> {
        let io_timeout = self.config.io_timeout;

        let bytes = transport.read(HEADER_LEN, io_timeout)?;
        let bytes: [u8; HEADER_LEN] = bytes
            .try_into()
            .map_err(|_| io::Error::from(io::ErrorKind::InvalidData))?;
        let header = Header::decode(&bytes);

        if header.version != FCGI_VERSION {
            diag!(self.config.sink, Warn, "Received record with unexpected version {}", header.version);
        }

        let content = match header.content_length {
            0 => vec![],
            len => transport
                .read(len as usize, io_timeout)
                .inspect_err(|err| diag!(self.config.sink, Debug, error = err; "Failed to read record content"))?,
        };

        if header.padding_length > 0 {
            transport
                .read(header.padding_length as usize, io_timeout)
                .inspect_err(|err| diag!(self.config.sink, Debug, error = err; "Failed to read record padding"))?;
        }

        Ok(Incoming { header, content })
    }
}
