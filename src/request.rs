use crate::record::{encode_name_value, encode_record, encode_stream, BeginRequest, RecordType};
use crate::error::Error;

/// Draws a fresh request id. Ids stay within 15 bits.
pub(crate) fn new_request_id() -> u16 {
    fastrand::u16(..) & 0x7FFF
}

/// Serializes a complete responder request.
///
/// In wire order: `BEGIN_REQUEST`, the `PARAMS` stream, the `STDIN` stream. Each stream is
/// terminated by an empty record of its type, and every record carries `request_id`.
pub(crate) fn encode_request<N, V>(
    request_id: u16,
    params: &[(N, V)],
    body: &[u8],
) -> Result<Vec<u8>, Error>
where
    N: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let begin = BeginRequest::responder().to_record_bytes();
    let mut request = encode_record(RecordType::BeginRequest, &begin, request_id)?;

    let mut pairs = vec![];
    for (name, value) in params {
        pairs.extend(encode_name_value(name.as_ref(), value.as_ref())?);
    }

    request.extend(encode_stream(RecordType::Params, &pairs, request_id));
    request.extend(encode_stream(RecordType::Stdin, body, request_id));
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Header, HEADER_LEN, MAX_CONTENT_LEN};

    // Splits a serialized request back into (header, content) pairs
    fn split(mut bytes: &[u8]) -> Vec<(Header, Vec<u8>)> {
        let mut records = vec![];
        while !bytes.is_empty() {
            let header = Header::decode(&bytes[..HEADER_LEN].try_into().unwrap());
            let end = HEADER_LEN + header.body_len();
            records.push((header, bytes[HEADER_LEN..end].to_vec()));
            bytes = &bytes[end..];
        }
        records
    }

    fn types(records: &[(Header, Vec<u8>)]) -> Vec<(RecordType, usize)> {
        records
            .iter()
            .map(|(h, c)| (h.record_type, c.len()))
            .collect()
    }

    #[test]
    fn ids_fit_in_fifteen_bits() {
        for _ in 0..1000 {
            assert!(new_request_id() <= 0x7FFF);
        }
    }

    #[test]
    fn full_request_layout() {
        let params = [("REQUEST_METHOD", "GET"), ("REQUEST_URI", "/login")];
        let records = split(&encode_request(77, &params, b"<html/>").unwrap());

        assert_eq!(
            types(&records),
            vec![
                (RecordType::BeginRequest, 8),
                (RecordType::Params, 2 + 14 + 3 + 2 + 11 + 6),
                (RecordType::Params, 0),
                (RecordType::Stdin, 7),
                (RecordType::Stdin, 0),
            ]
        );
        assert!(records.iter().all(|(h, _)| h.request_id == 77));
        assert!(records.iter().all(|(h, _)| h.padding_length == 0));
        assert_eq!(records[0].1, [0, 1, 1, 0, 0, 0, 0, 0]);
        assert_eq!(&records[1].1[..2], &[14, 3]);
        assert_eq!(records[3].1, b"<html/>");
    }

    #[test]
    fn empty_request_still_has_end_markers() {
        let params: [(&str, &str); 0] = [];
        let records = split(&encode_request(1, &params, b"").unwrap());
        assert_eq!(
            types(&records),
            vec![
                (RecordType::BeginRequest, 8),
                (RecordType::Params, 0),
                (RecordType::Stdin, 0),
            ]
        );
    }

    #[test]
    fn params_with_empty_sides_disappear() {
        let params = [("EMPTY", ""), ("", "nameless")];
        let records = split(&encode_request(3, &params, b"x").unwrap());
        assert_eq!(
            types(&records),
            vec![
                (RecordType::BeginRequest, 8),
                (RecordType::Params, 0),
                (RecordType::Stdin, 1),
                (RecordType::Stdin, 0),
            ]
        );
    }

    #[test]
    fn exactly_one_end_marker_per_stream() {
        let body = vec![b'b'; MAX_CONTENT_LEN * 2 + 1];
        let params = [("A", "1")];
        let records = split(&encode_request(5, &params, &body).unwrap());

        let empty_params = records
            .iter()
            .filter(|(h, c)| h.record_type == RecordType::Params && c.is_empty())
            .count();
        let empty_stdin = records
            .iter()
            .filter(|(h, c)| h.record_type == RecordType::Stdin && c.is_empty())
            .count();
        assert_eq!(empty_params, 1);
        assert_eq!(empty_stdin, 1);

        // The body is chunked, and the terminator comes last
        let stdin = records
            .iter()
            .filter(|(h, _)| h.record_type == RecordType::Stdin)
            .map(|(_, c)| c.len())
            .collect::<Vec<_>>();
        assert_eq!(stdin, vec![MAX_CONTENT_LEN, MAX_CONTENT_LEN, 1, 0]);
    }

    #[test]
    fn accepts_owned_params() {
        let params = vec![(b"CONTENT_LENGTH".to_vec(), b"5".to_vec())];
        let request = encode_request(9, &params, b"hello").unwrap();
        let records = split(&request);
        assert_eq!(records[1].1, b"\x0e\x01CONTENT_LENGTH5");
    }
}
