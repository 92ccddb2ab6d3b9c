use super::{RecordType, FCGI_VERSION, HEADER_LEN};

/// The fixed-size prefix of every FastCGI record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Not validated on decode. Callers decide what a mismatch means.
    pub version: u8,
    pub record_type: RecordType,
    pub request_id: u16,
    pub content_length: u16,
    pub padding_length: u8,
}

impl Header {
    /// Creates an unpadded header for the current protocol version
    pub fn new(record_type: RecordType, request_id: u16, content_length: u16) -> Self {
        Self {
            version: FCGI_VERSION,
            record_type,
            request_id,
            content_length,
            padding_length: 0,
        }
    }

    pub fn decode(bytes: &[u8; HEADER_LEN]) -> Self {
        let [version, type_id, req_id_1, req_id_0, length_1, length_0, padding_length, _] = *bytes;

        Self {
            version,
            record_type: RecordType::from_id(type_id),
            request_id: u16::from_be_bytes([req_id_1, req_id_0]),
            content_length: u16::from_be_bytes([length_1, length_0]),
            padding_length,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let [req_id_1, req_id_0] = self.request_id.to_be_bytes();
        let [length_1, length_0] = self.content_length.to_be_bytes();
        [
            self.version,
            self.record_type.id(),
            req_id_1,
            req_id_0,
            length_1,
            length_0,
            self.padding_length,
            0,
        ]
    }

    /// Bytes that follow the header on the wire: content, then padding
    pub fn body_len(&self) -> usize {
        self.content_length as usize + self.padding_length as usize
    }
}
