//! The FastCGI record codec
//!
//! Everything in here is pure: functions turn values into bytes and bytes into values, and never
//! touch a socket.
//!
//! Every record on the wire is an 8-byte header followed by `content_length` bytes of content and
//! `padding_length` bytes of padding:
//!
//! ```text
//! version(1) type(1) requestIdHi(1) requestIdLo(1) contentLenHi(1) contentLenLo(1) paddingLen(1) reserved(1)
//! ```
mod begin_request;
mod end_request;
mod header;
mod pairs;
mod protocol_status;
mod role;

use crate::error::Error;
pub use begin_request::BeginRequest;
pub use end_request::EndRequest;
pub use header::Header;
pub use pairs::{encode_name_value, MAX_PAIR_LEN};
pub use protocol_status::ProtocolStatus;
pub use role::Role;

/// The only protocol version this crate speaks
pub const FCGI_VERSION: u8 = 1;

/// Length of every record header
pub const HEADER_LEN: usize = 8;

/// The most content a single record can carry
pub const MAX_CONTENT_LEN: usize = u16::MAX as usize;

pub const FCGI_BEGIN_REQUEST: u8 = 1;
pub const FCGI_ABORT_REQUEST: u8 = 2;
pub const FCGI_END_REQUEST: u8 = 3;
pub const FCGI_PARAMS: u8 = 4;
pub const FCGI_STDIN: u8 = 5;
pub const FCGI_STDOUT: u8 = 6;
pub const FCGI_STDERR: u8 = 7;
pub const FCGI_DATA: u8 = 8;
pub const FCGI_GET_VALUES: u8 = 9;
pub const FCGI_GET_VALUES_RESULT: u8 = 10;
pub const FCGI_UNKNOWN_TYPE: u8 = 11;

/// The type of a FastCGI record
///
/// Type bytes outside of the range defined by the protocol are kept as [`RecordType::Other`] so
/// that a record of unexpected type can still be consumed off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    BeginRequest,
    AbortRequest,
    EndRequest,
    Params,
    Stdin,
    Stdout,
    Stderr,
    Data,
    GetValues,
    GetValuesResult,
    UnknownType,
    Other(u8),
}

impl RecordType {
    pub fn id(&self) -> u8 {
        match self {
            Self::BeginRequest => FCGI_BEGIN_REQUEST,
            Self::AbortRequest => FCGI_ABORT_REQUEST,
            Self::EndRequest => FCGI_END_REQUEST,
            Self::Params => FCGI_PARAMS,
            Self::Stdin => FCGI_STDIN,
            Self::Stdout => FCGI_STDOUT,
            Self::Stderr => FCGI_STDERR,
            Self::Data => FCGI_DATA,
            Self::GetValues => FCGI_GET_VALUES,
            Self::GetValuesResult => FCGI_GET_VALUES_RESULT,
            Self::UnknownType => FCGI_UNKNOWN_TYPE,
            Self::Other(id) => *id,
        }
    }

    pub fn from_id(id: u8) -> Self {
        match id {
            FCGI_BEGIN_REQUEST => Self::BeginRequest,
            FCGI_ABORT_REQUEST => Self::AbortRequest,
            FCGI_END_REQUEST => Self::EndRequest,
            FCGI_PARAMS => Self::Params,
            FCGI_STDIN => Self::Stdin,
            FCGI_STDOUT => Self::Stdout,
            FCGI_STDERR => Self::Stderr,
            FCGI_DATA => Self::Data,
            FCGI_GET_VALUES => Self::GetValues,
            FCGI_GET_VALUES_RESULT => Self::GetValuesResult,
            FCGI_UNKNOWN_TYPE => Self::UnknownType,
            other => Self::Other(other),
        }
    }
}

/// Frames `content` into a single record of type `record_type`
///
/// The header always declares zero padding.
///
/// # Errors
///
/// Returns [`Error::ContentTooLong`] if `content` does not fit in one record.
pub fn encode_record(
    record_type: RecordType,
    content: &[u8],
    request_id: u16,
) -> Result<Vec<u8>, Error> {
    let content_length =
        u16::try_from(content.len()).map_err(|_| Error::ContentTooLong(content.len()))?;

    let header = Header::new(record_type, request_id, content_length);

    let mut record = Vec::with_capacity(HEADER_LEN + content.len());
    record.extend_from_slice(&header.encode());
    record.extend_from_slice(content);
    Ok(record)
}

/// Frames `content` into as many records as needed, then appends the empty record that ends the
/// stream.
///
/// Empty `content` produces only the terminating record.
pub fn encode_stream(record_type: RecordType, content: &[u8], request_id: u16) -> Vec<u8> {
    let mut stream = Vec::with_capacity(content.len() + HEADER_LEN * 2);

    for chunk in content.chunks(MAX_CONTENT_LEN) {
        stream.extend_from_slice(&Header::new(record_type, request_id, chunk.len() as u16).encode());
        stream.extend_from_slice(chunk);
    }

    stream.extend_from_slice(&Header::new(record_type, request_id, 0).encode());
    stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn type_ids_round_trip() {
        for id in 0..=u8::MAX {
            assert_eq!(RecordType::from_id(id).id(), id);
        }
        assert_eq!(RecordType::from_id(6), RecordType::Stdout);
        assert_eq!(RecordType::from_id(42), RecordType::Other(42));
    }

    #[test]
    fn header_survives_encoding() {
        let cases = [
            (RecordType::Stdout, vec![], 0),
            (RecordType::Params, b"abc".to_vec(), 1),
            (RecordType::Stdin, vec![7; 300], 0x7FFF),
            (RecordType::EndRequest, vec![0; MAX_CONTENT_LEN], u16::MAX),
        ];

        for (record_type, content, request_id) in cases {
            let bytes = encode_record(record_type, &content, request_id).unwrap();
            assert_eq!(bytes.len(), HEADER_LEN + content.len());

            let header = Header::decode(&bytes[..HEADER_LEN].try_into().unwrap());
            assert_eq!(header.version, FCGI_VERSION);
            assert_eq!(header.record_type, record_type);
            assert_eq!(header.request_id, request_id);
            assert_eq!(header.content_length as usize, content.len());
            assert_eq!(header.padding_length, 0);
            assert_eq!(&bytes[HEADER_LEN..], &content[..]);
        }
    }

    #[test]
    fn header_layout_is_big_endian() {
        let bytes = encode_record(RecordType::Stdin, &[0xAA; 0x0102], 0x1234).unwrap();
        assert_eq!(&bytes[..HEADER_LEN], &[1, 5, 0x12, 0x34, 0x01, 0x02, 0, 0]);
    }

    #[test]
    fn oversized_content_is_rejected() {
        let content = vec![0u8; MAX_CONTENT_LEN + 1];
        assert_matches!(
            encode_record(RecordType::Stdin, &content, 1),
            Err(Error::ContentTooLong(65536))
        );
    }

    #[test]
    fn streams_end_with_an_empty_record() {
        let stream = encode_stream(RecordType::Params, b"", 9);
        assert_eq!(stream, [1, 4, 0, 9, 0, 0, 0, 0]);

        let stream = encode_stream(RecordType::Stdin, b"hi", 9);
        assert_eq!(
            stream,
            [1, 5, 0, 9, 0, 2, 0, 0, b'h', b'i', 1, 5, 0, 9, 0, 0, 0, 0]
        );
    }

    #[test]
    fn long_streams_are_chunked() {
        let content = vec![3u8; MAX_CONTENT_LEN + 10];
        let stream = encode_stream(RecordType::Stdin, &content, 2);

        let first = Header::decode(&stream[..8].try_into().unwrap());
        assert_eq!(first.content_length as usize, MAX_CONTENT_LEN);

        let offset = HEADER_LEN + MAX_CONTENT_LEN;
        let second = Header::decode(&stream[offset..offset + 8].try_into().unwrap());
        assert_eq!(second.content_length, 10);

        let offset = offset + HEADER_LEN + 10;
        let last = Header::decode(&stream[offset..offset + 8].try_into().unwrap());
        assert_eq!(last.content_length, 0);
        assert_eq!(stream.len(), offset + HEADER_LEN);
    }
}
