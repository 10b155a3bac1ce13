//! SMPP v3.4 framing
//!
//! Every PDU starts with a 4 octet big-endian command_length that counts the
//! whole PDU. `check` finds frame boundaries in a read buffer without
//! decoding anything; `Frame::decode` does the rest once a full frame is
//! buffered.

pub use crate::codec::{CodecError, Frame, PduRegistry};

use crate::codec::{PduHeader, MAX_PDU_SIZE};
use thiserror::Error;

/// Outcome of looking for a frame boundary
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Not enough data is buffered to hold a complete frame
    #[error("Incomplete frame")]
    Incomplete,

    /// The length prefix can not describe a valid PDU. The stream has lost
    /// framing and can not be recovered.
    #[error("Invalid command_length {0}")]
    InvalidLength(u32),
}

/// Returns the length of the first frame in `buf` once all of it is
/// buffered.
pub fn check(buf: &[u8]) -> Result<usize, Error> {
    if buf.len() < 4 {
        return Err(Error::Incomplete);
    }

    let length = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if length < PduHeader::SIZE as u32 || length > MAX_PDU_SIZE {
        return Err(Error::InvalidLength(length));
    }

    if buf.len() < length as usize {
        return Err(Error::Incomplete);
    }
    Ok(length as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_length_prefix() {
        assert_eq!(check(&[0x00, 0x00]), Err(Error::Incomplete));
    }

    #[test]
    fn waits_for_whole_frame() {
        let mut buf = vec![0x00, 0x00, 0x00, 0x11];
        buf.extend_from_slice(&[0u8; 12]);
        assert_eq!(check(&buf), Err(Error::Incomplete));
        buf.push(0);
        assert_eq!(check(&buf), Ok(17));
    }

    #[test]
    fn only_first_frame_is_measured() {
        let mut buf = vec![0x00, 0x00, 0x00, 0x10];
        buf.extend_from_slice(&[0u8; 12]);
        buf.extend_from_slice(&[0x00, 0x00, 0x00]);
        assert_eq!(check(&buf), Ok(16));
    }

    #[test]
    fn rejects_impossible_lengths() {
        assert_eq!(
            check(&[0x00, 0x00, 0x00, 0x04]),
            Err(Error::InvalidLength(4))
        );
        assert_eq!(
            check(&[0x7F, 0xFF, 0xFF, 0xFF]),
            Err(Error::InvalidLength(0x7FFF_FFFF))
        );
    }
}
