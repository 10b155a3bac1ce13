// ABOUTME: Splits encoded text into concatenated SMS parts behind a User Data Header
// ABOUTME: Also parses the concatenation header back out of inbound short messages

use crate::codec::CodecError;
use crate::text::Encoding;
use bytes::{BufMut, Bytes, BytesMut};

/// Octets available to one short_message
pub const MAX_SINGLE_PAYLOAD: usize = 140;

/// UDH length octet + 16-bit concatenation IE (id, length, ref, total, index)
pub const UDH_LENGTH: usize = 7;

/// Parts are numbered with one octet
pub const MAX_PARTS: usize = 255;

const IEI_CONCAT_8BIT: u8 = 0x00;
const IEI_CONCAT_16BIT: u8 = 0x08;

/// Position of one part inside a concatenated message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concat {
    pub reference: u16,
    pub total: u8,
    /// 1-based
    pub index: u8,
}

/// Split `encoded` into short_message payloads.
///
/// A payload that fits in one PDU is returned as is, without a header.
/// Otherwise each part carries a 7 octet UDH and at most 133 octets of text
/// (132 for UCS2, which never splits a code unit or a surrogate pair). Raw
/// parts end on a UTF-8 character boundary when one lies within the last
/// three octets.
pub fn split(encoded: &[u8], encoding: Encoding, reference: u16) -> Result<Vec<Bytes>, CodecError> {
    if encoded.len() <= MAX_SINGLE_PAYLOAD {
        return Ok(vec![Bytes::copy_from_slice(encoded)]);
    }

    let unit = encoding.unit();
    let capacity = (MAX_SINGLE_PAYLOAD - UDH_LENGTH) / unit * unit;

    let mut chunks = Vec::new();
    let mut rest = encoded;
    while !rest.is_empty() {
        let mut end = capacity.min(rest.len());
        if end < rest.len() {
            match encoding {
                Encoding::Ucs2 if ends_in_high_surrogate(&rest[..end]) => end -= 2,
                Encoding::Raw => end = utf8_boundary(rest, end),
                _ => {}
            }
        }
        let (chunk, tail) = rest.split_at(end);
        chunks.push(chunk);
        rest = tail;
    }

    if chunks.len() > MAX_PARTS {
        return Err(CodecError::FieldValidation {
            field: "short_message",
            reason: format!("{} parts needed, maximum is {}", chunks.len(), MAX_PARTS),
        });
    }

    let total = chunks.len() as u8;
    Ok(chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut part = BytesMut::with_capacity(UDH_LENGTH + chunk.len());
            part.put_slice(&[UDH_LENGTH as u8 - 1, IEI_CONCAT_16BIT, 0x04]);
            part.put_u16(reference);
            part.put_u8(total);
            part.put_u8(i as u8 + 1);
            part.put_slice(chunk);
            part.freeze()
        })
        .collect())
}

/// The nearest index at or below `end` that does not fall inside a UTF-8
/// sequence, or `end` itself when the octets are not UTF-8 there.
fn utf8_boundary(octets: &[u8], end: usize) -> usize {
    (end.saturating_sub(3)..=end)
        .rev()
        .find(|&i| i > 0 && octets[i] & 0xC0 != 0x80)
        .unwrap_or(end)
}

fn ends_in_high_surrogate(chunk: &[u8]) -> bool {
    match chunk {
        [.., hi, _] => (0xD8..=0xDB).contains(hi),
        _ => false,
    }
}

/// Reads the concatenation element from a short_message that starts with a
/// UDH, returning it with the text that follows the header.
///
/// Both the 8-bit and 16-bit reference forms are understood. `None` when
/// the header is malformed or carries no concatenation element.
pub fn parse_udh(short_message: &[u8]) -> Option<(Concat, &[u8])> {
    let (&udh_len, rest) = short_message.split_first()?;
    let udh_len = udh_len as usize;
    if rest.len() < udh_len {
        return None;
    }
    let (mut elements, payload) = rest.split_at(udh_len);

    let mut concat = None;
    while let [iei, len, tail @ ..] = elements {
        let len = *len as usize;
        if tail.len() < len {
            return None;
        }
        let (data, next) = tail.split_at(len);
        concat = match (*iei, data) {
            (IEI_CONCAT_8BIT, [reference, total, index]) => Some(Concat {
                reference: *reference as u16,
                total: *total,
                index: *index,
            }),
            (IEI_CONCAT_16BIT, [hi, lo, total, index]) => Some(Concat {
                reference: u16::from_be_bytes([*hi, *lo]),
                total: *total,
                index: *index,
            }),
            _ => concat,
        };
        elements = next;
    }

    concat.map(|concat| (concat, payload))
}
