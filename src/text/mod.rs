// ABOUTME: Message text with its encoding, and the long-message segmentation built on it
// ABOUTME: Decoding concatenated parts back together is left to the receiver

mod encoding;
pub mod segment;

pub use encoding::Encoding;
pub use segment::{parse_udh, split, Concat, MAX_SINGLE_PAYLOAD, UDH_LENGTH};

use crate::codec::CodecError;
use crate::datatypes::DataCoding;
use bytes::Bytes;

/// A message body and the encoding it will be sent in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Text {
    content: String,
    encoding: Encoding,
}

impl Text {
    pub fn new(content: impl Into<String>, encoding: Encoding) -> Self {
        Self {
            content: content.into(),
            encoding,
        }
    }

    pub fn raw(content: impl Into<String>) -> Self {
        Self::new(content, Encoding::Raw)
    }

    pub fn latin1(content: impl Into<String>) -> Self {
        Self::new(content, Encoding::Latin1)
    }

    pub fn ucs2(content: impl Into<String>) -> Self {
        Self::new(content, Encoding::Ucs2)
    }

    /// Rebuild text from received octets
    pub fn decode(octets: &[u8], encoding: Encoding) -> Self {
        Self::new(encoding.decode(octets), encoding)
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn data_coding(&self) -> DataCoding {
        self.encoding.data_coding()
    }

    /// Octets to place in short_message
    pub fn encode(&self) -> Bytes {
        self.encoding.encode(&self.content)
    }

    /// Encoded parts, see [`segment::split`]
    pub fn split(&self, reference: u16) -> Result<Vec<Bytes>, CodecError> {
        split(&self.encode(), self.encoding, reference)
    }
}

impl From<&str> for Text {
    fn from(content: &str) -> Self {
        Text::raw(content)
    }
}
