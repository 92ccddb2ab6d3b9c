use crate::error::Error;

/// An indication of the completion status of a FastCGI request
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProtocolStatus {
    /// Normal end of request.
    RequestComplete,
    /// The application refused a concurrent request on a connection it does not multiplex.
    MultiplexingUnsupported,
    /// The application ran out of some resource, e.g. database connections.
    Overloaded,
    /// The application does not know the role asked for in `FCGI_BEGIN_REQUEST`.
    UnknownRole,
}

impl ProtocolStatus {
    pub fn id(&self) -> u8 {
        match self {
            Self::RequestComplete => 0,
            Self::MultiplexingUnsupported => 1,
            Self::Overloaded => 2,
            Self::UnknownRole => 3,
        }
    }

    pub(super) fn from_record_byte(byte: u8) -> Result<Self, Error> {
        let status = match byte {
            0 => Self::RequestComplete,
            1 => Self::MultiplexingUnsupported,
            2 => Self::Overloaded,
            3 => Self::UnknownRole,
            _ => return Err(Error::UnsupportedProtocolStatus(byte)),
        };

        Ok(status)
    }
}
