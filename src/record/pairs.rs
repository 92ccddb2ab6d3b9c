use crate::error::Error;

/// Longest name or value a pair can carry: the four-byte length encoding keeps 31 bits.
pub const MAX_PAIR_LEN: usize = 0x7FFF_FFFF;

// FastCGI transmits a name-value pair as the length of the name, followed by the length of the
// value, followed by the name, followed by the value. Lengths of 127 bytes and less can be
// encoded in one byte, while longer lengths are always encoded in four bytes.
//
// The high-order bit of the first byte of a length indicates the length's encoding. A high-order
// zero implies a one-byte encoding, a one a four-byte encoding.
fn write_pair_len(len: usize, out: &mut Vec<u8>) -> Result<(), Error> {
    if len > MAX_PAIR_LEN {
        return Err(Error::PairTooLong(len));
    }

    if len > 127 {
        let mut len_bytes = (len as u32).to_be_bytes();
        len_bytes[0] |= 0b1000_0000;
        out.extend_from_slice(&len_bytes);
    } else {
        out.push(len as u8);
    }
    Ok(())
}

/// Encodes one `PARAMS` name-value pair
///
/// Pairs with an empty name or an empty value are dropped: the result is then empty. Fails with
/// [`Error::PairTooLong`] when a side is longer than [`MAX_PAIR_LEN`].
pub fn encode_name_value(name: &[u8], value: &[u8]) -> Result<Vec<u8>, Error> {
    if name.is_empty() || value.is_empty() {
        return Ok(vec![]);
    }

    let mut out = Vec::with_capacity(8 + name.len() + value.len());
    write_pair_len(name.len(), &mut out)?;
    write_pair_len(value.len(), &mut out)?;
    out.extend_from_slice(name);
    out.extend_from_slice(value);
    Ok(out)
}
