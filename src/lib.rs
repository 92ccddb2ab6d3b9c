//! A blocking [FastCGI](https://www.mit.edu/~yandros/doc/specs/fcgi-spec.html) client.
//!
//! It talks to a FastCGI application server (php-fpm, a `vintage` server, ...) directly, without
//! an HTTP server in between.
//!
//! Using this crate is straightforward:
//!
//! ```no_run
//! use gramophone::{Client, ClientConfig, Endpoint};
//!
//! let endpoint = Endpoint::resolve("127.0.0.1:9000").unwrap();
//! let client = Client::new(ClientConfig::new(endpoint)).unwrap();
//!
//! if client.open_connection() {
//!     let params = [("REQUEST_METHOD", "GET"), ("SCRIPT_FILENAME", "/var/www/index.php")];
//!     let response = client.send_request(&params, "");
//!
//!     if response.is_success() {
//!         println!("{}", response.content_lossy());
//!     }
//!     client.close_connection();
//! }
//! ```
//!
//! Calls block the calling thread. Underneath, each [`Client`] owns a reactor thread that
//! services its socket with non-blocking I/O. That is what makes it possible to give up on a read
//! that takes too long, something a plain blocking socket can't do on its own terms.
//!
//! Two timeouts bound a request:
//! - Every individual read (a record header, its content, its padding) may stall for at most the
//!   io timeout, 4 seconds by default. A read that stalls is not fatal: the client just tries to
//!   read the next record.
//! - The whole exchange is bounded by the response timeout, 300 seconds by default. When it
//!   passes before the application ends the request, the request fails.
//!
//! Both are set through [`ClientConfig`].
//!
//! # Terminology:
//!
//! - FastCGI client: The program that initiates a FastCGI connection. That's us.
//! - FastCGI server/application server: A program that listens on a socket, and responds to
//!   requests from a FastCGI client.
//! - Record: The unit of the FastCGI wire protocol. A header, some content, some padding.
//! - Request id: The 16-bit number tying records to one request. This crate draws a random 15-bit
//!   id for each request.
//!
//! # Deviations from FastCGI 1.0
//!
//! - Only the Responder role is supported.
//! - The client never sends `FCGI_GET_VALUES`, and never multiplexes requests on a connection:
//!   a [`Client`] has one request in flight at most.
//! - By default, each non-empty `FCGI_STDOUT`/`FCGI_STDERR` record of a response replaces the
//!   content of the previous one instead of being appended to it. See [`OutputMode`].
//! - Records are sent without padding.

mod client;
mod client_config;
mod completion;
mod connection;
mod error;
pub mod logger;
mod reactor;
pub mod record;
mod request;
mod response;
mod transport;

pub use client::Client;
pub use client_config::{ClientConfig, OutputMode, DEFAULT_IO_TIMEOUT, DEFAULT_RESPONSE_TIMEOUT,
    MIN_IO_TIMEOUT,
};
pub use connection::Endpoint;
pub use error::{Error, TransportError};
pub use response::Response;
pub use transport::{StreamTransport, Transport};
