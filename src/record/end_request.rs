use super::protocol_status::ProtocolStatus;
use crate::error::Error;

/// The body of a FastCGI `FCGI_END_REQUEST` record
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EndRequest {
    app_status: u32,
    protocol_status: ProtocolStatus,
}

impl EndRequest {
    pub fn new(app_status: u32, protocol_status: ProtocolStatus) -> Self {
        Self {
            app_status,
            protocol_status,
        }
    }

    pub fn from_record_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let [s3, s2, s1, s0, status, ..]: [u8; 8] = bytes
            .try_into()
            .map_err(|_| Error::MalformedRecordPayload("EndRequest"))?;

        Ok(Self {
            app_status: u32::from_be_bytes([s3, s2, s1, s0]),
            protocol_status: ProtocolStatus::from_record_byte(status)?,
        })
    }

    pub fn to_record_bytes(&self) -> [u8; 8] {
        let [s3, s2, s1, s0] = self.app_status.to_be_bytes();
        [s3, s2, s1, s0, self.protocol_status.id(), 0, 0, 0]
    }

    /// The exit status the application reported
    pub fn app_status(&self) -> u32 {
        self.app_status
    }

    pub fn protocol_status(&self) -> ProtocolStatus {
        self.protocol_status
    }
}
