// ABOUTME: Character encodings a message body can be sent in, and their data_coding values
// ABOUTME: Converts between Rust strings and the octets placed in short_message

use crate::datatypes::DataCoding;
use bytes::Bytes;

/// How message text is turned into short_message octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Octets passed through unchanged under the SMSC default alphabet
    #[default]
    Raw,
    /// ISO-8859-1; characters above U+00FF become `?`
    Latin1,
    /// UTF-16BE. Characters outside the BMP use two code units.
    Ucs2,
}

impl Encoding {
    /// The data_coding octet announcing this encoding
    pub fn data_coding(&self) -> DataCoding {
        match self {
            Encoding::Raw => DataCoding::SmscDefault,
            Encoding::Latin1 => DataCoding::Latin1,
            Encoding::Ucs2 => DataCoding::Ucs2,
        }
    }

    /// The encoding matching an inbound data_coding, if it is one we decode
    pub fn from_data_coding(data_coding: DataCoding) -> Option<Self> {
        match data_coding {
            DataCoding::SmscDefault | DataCoding::Ascii | DataCoding::Binary => {
                Some(Encoding::Raw)
            }
            DataCoding::Latin1 => Some(Encoding::Latin1),
            DataCoding::Ucs2 => Some(Encoding::Ucs2),
            _ => None,
        }
    }

    /// Size of the smallest unit a segment boundary may fall on
    pub(crate) fn unit(&self) -> usize {
        match self {
            Encoding::Ucs2 => 2,
            _ => 1,
        }
    }

    pub fn encode(&self, text: &str) -> Bytes {
        match self {
            Encoding::Raw => Bytes::copy_from_slice(text.as_bytes()),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect::<Vec<u8>>()
                .into(),
            Encoding::Ucs2 => text
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect::<Vec<u8>>()
                .into(),
        }
    }

    /// Decode octets back to text. Invalid sequences become U+FFFD.
    pub fn decode(&self, octets: &[u8]) -> String {
        match self {
            Encoding::Raw => String::from_utf8_lossy(octets).into_owned(),
            Encoding::Latin1 => octets.iter().map(|&b| char::from(b)).collect(),
            Encoding::Ucs2 => {
                let units: Vec<u16> = octets
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }
}
