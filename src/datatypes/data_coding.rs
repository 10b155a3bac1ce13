// ABOUTME: Strongly-typed SMPP data_coding scheme carried by submit_sm, submit_multi and deliver_sm
// ABOUTME: Unrecognised values are preserved as Custom so inbound messages never fail on coding alone

use std::fmt;

/// Data coding scheme of the short_message octets
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataCoding {
    /// SMSC Default Alphabet (typically GSM 7-bit)
    #[default]
    SmscDefault,
    /// IA5 (CCITT T.50)/ASCII encoding
    Ascii,
    /// 8-bit binary data (no encoding)
    Binary,
    /// Latin-1 (ISO-8859-1) character set
    Latin1,
    /// Cyrillic (ISO-8859-5) character set
    Cyrillic,
    /// Latin/Hebrew (ISO-8859-8) character set
    LatinHebrew,
    /// UCS-2 (ISO/IEC-10646) Unicode encoding
    Ucs2,
    /// Custom/reserved data coding value
    Custom(u8),
}

impl DataCoding {
    /// Creates a DataCoding from a raw u8 value
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => DataCoding::SmscDefault,
            0x01 => DataCoding::Ascii,
            0x02 | 0x04 => DataCoding::Binary,
            0x03 => DataCoding::Latin1,
            0x06 => DataCoding::Cyrillic,
            0x07 => DataCoding::LatinHebrew,
            0x08 => DataCoding::Ucs2,
            _ => DataCoding::Custom(value),
        }
    }

    /// Returns the raw u8 value for wire protocol
    pub fn to_byte(&self) -> u8 {
        match self {
            DataCoding::SmscDefault => 0x00,
            DataCoding::Ascii => 0x01,
            DataCoding::Binary => 0x02,
            DataCoding::Latin1 => 0x03,
            DataCoding::Cyrillic => 0x06,
            DataCoding::LatinHebrew => 0x07,
            DataCoding::Ucs2 => 0x08,
            DataCoding::Custom(value) => *value,
        }
    }

    /// Returns true if this encoding uses 16-bit code units
    pub fn is_unicode(&self) -> bool {
        matches!(self, DataCoding::Ucs2)
    }
}

impl fmt::Debug for DataCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataCoding::Custom(value) => write!(f, "DataCoding::Custom({value:#04x})"),
            other => write!(f, "DataCoding::{other}"),
        }
    }
}

impl fmt::Display for DataCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataCoding::SmscDefault => "SmscDefault",
            DataCoding::Ascii => "Ascii",
            DataCoding::Binary => "Binary",
            DataCoding::Latin1 => "Latin1",
            DataCoding::Cyrillic => "Cyrillic",
            DataCoding::LatinHebrew => "LatinHebrew",
            DataCoding::Ucs2 => "Ucs2",
            DataCoding::Custom(_) => "Custom",
        };
        f.write_str(name)
    }
}

impl From<u8> for DataCoding {
    fn from(value: u8) -> Self {
        DataCoding::from_byte(value)
    }
}

impl From<DataCoding> for u8 {
    fn from(value: DataCoding) -> Self {
        value.to_byte()
    }
}
