use mio::event::Source;
use mio::net::{TcpStream, UnixStream};
use mio::{Interest, Registry, Token};
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Where a FastCGI application listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl Endpoint {
    /// Resolves a host/port pair, keeping the first address found
    pub fn resolve<A: std::net::ToSocketAddrs>(addr: A) -> Result<Self, io::Error> {
        let address = addr
            .to_socket_addrs()?
            .next()
            .ok_or(io::Error::from(io::ErrorKind::InvalidInput))?;
        Ok(Self::Tcp(address))
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(value: SocketAddr) -> Self {
        Endpoint::Tcp(value)
    }
}

impl From<PathBuf> for Endpoint {
    fn from(value: PathBuf) -> Self {
        Endpoint::Unix(value)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "{addr}"),
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// A non-blocking socket owned by the reactor thread
#[derive(Debug)]
pub(crate) enum Connection {
    Tcp(TcpStream),
    UnixSocket(UnixStream),
}

impl Connection {
    /// Connects synchronously, then switches the socket to non-blocking mode for the reactor.
    pub(crate) fn connect(endpoint: &Endpoint) -> Result<Self, io::Error> {
        match endpoint {
            Endpoint::Tcp(addr) => {
                let stream = std::net::TcpStream::connect(addr)?;
                stream.set_nodelay(true)?;
                stream.set_nonblocking(true)?;
                Ok(Connection::Tcp(TcpStream::from_std(stream)))
            }
            Endpoint::Unix(path) => {
                let stream = std::os::unix::net::UnixStream::connect(path)?;
                stream.set_nonblocking(true)?;
                Ok(Connection::UnixSocket(UnixStream::from_std(stream)))
            }
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Connection::Tcp(w) => w.write(buf),
            Connection::UnixSocket(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Connection::Tcp(w) => w.flush(),
            Connection::UnixSocket(w) => w.flush(),
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Connection::Tcp(r) => r.read(buf),
            Connection::UnixSocket(r) => r.read(buf),
        }
    }
}

impl Source for Connection {
    fn register(
        &mut self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> io::Result<()> {
        match self {
            Connection::Tcp(s) => s.register(registry, token, interests),
            Connection::UnixSocket(s) => s.register(registry, token, interests),
        }
    }

    fn reregister(
        &mut self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> io::Result<()> {
        match self {
            Connection::Tcp(s) => s.reregister(registry, token, interests),
            Connection::UnixSocket(s) => s.reregister(registry, token, interests),
        }
    }

    fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        match self {
            Connection::Tcp(s) => s.deregister(registry),
            Connection::UnixSocket(s) => s.deregister(registry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolving_keeps_the_first_address() {
        let endpoint = Endpoint::resolve("127.0.0.1:9000").unwrap();
        assert_eq!(endpoint, Endpoint::Tcp("127.0.0.1:9000".parse().unwrap()));
        assert_eq!(endpoint.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn unix_endpoints_display_their_path() {
        let endpoint = Endpoint::from(PathBuf::from("/run/php/fpm.sock"));
        assert_eq!(endpoint.to_string(), "unix:/run/php/fpm.sock");
    }

    #[test]
    fn refused_connections_fail() {
        // Bind then drop, so nothing is listening on the port
        let address = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        assert!(Connection::connect(&Endpoint::Tcp(address)).is_err());
    }
}
