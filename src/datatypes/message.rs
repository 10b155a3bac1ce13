// ABOUTME: Field groups shared by submit_sm, submit_multi and deliver_sm
// ABOUTME: Address is one TON/NPI/address triple; MessageParams is everything from esm_class onwards

use crate::codec::{
    decode_cstring, decode_enum, decode_octets, decode_u8, encode_cstring, CodecError,
};
use crate::datatypes::tlv::{decode_tlvs, encode_tlvs, find_tlv, Tlv};
use crate::datatypes::{DataCoding, NumericPlanIndicator, PriorityFlag, TypeOfNumber};
use crate::macros::builder_setters;
use bytes::{BufMut, Bytes, BytesMut};
use std::io::Cursor;

pub const MAX_SERVICE_TYPE_LENGTH: usize = 6;
pub const MAX_ADDRESS_LENGTH: usize = 21;
pub const MAX_TIME_LENGTH: usize = 17;
pub const MAX_SHORT_MESSAGE_LENGTH: usize = 254;

/// esm_class bit announcing a User Data Header at the start of short_message
pub const ESM_CLASS_UDHI: u8 = 0x40;

/// An SME address with its type of number and numbering plan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Address {
    pub ton: TypeOfNumber,
    pub npi: NumericPlanIndicator,
    pub addr: String,
}

impl Address {
    pub fn new(ton: TypeOfNumber, npi: NumericPlanIndicator, addr: impl Into<String>) -> Self {
        Self {
            ton,
            npi,
            addr: addr.into(),
        }
    }

    pub fn encode(&self, buf: &mut BytesMut, field: &'static str) -> Result<(), CodecError> {
        buf.put_u8(self.ton as u8);
        buf.put_u8(self.npi as u8);
        encode_cstring(buf, &self.addr, MAX_ADDRESS_LENGTH, field)
    }

    pub fn decode(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<Self, CodecError> {
        Ok(Address {
            ton: decode_enum(buf, "addr_ton")?,
            npi: decode_enum(buf, "addr_npi")?,
            addr: decode_cstring(buf, MAX_ADDRESS_LENGTH, field)?,
        })
    }
}

impl From<&str> for Address {
    fn from(addr: &str) -> Self {
        Address {
            addr: addr.to_string(),
            ..Default::default()
        }
    }
}

/// Message attributes and payload, esm_class through the trailing TLVs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageParams {
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority_flag: PriorityFlag,
    /// Absolute or relative SMPP time; empty for immediate delivery
    pub schedule_delivery_time: String,
    /// Absolute or relative SMPP time; empty for the SMSC default
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: DataCoding,
    pub sm_default_msg_id: u8,
    /// Up to 254 octets, sent behind an sm_length prefix
    pub short_message: Bytes,
    pub tlvs: Vec<Tlv>,
}

impl MessageParams {
    pub fn new(short_message: impl Into<Bytes>) -> Self {
        Self {
            short_message: short_message.into(),
            ..Default::default()
        }
    }

    builder_setters! {
        esm_class: u8,
        protocol_id: u8,
        priority_flag: PriorityFlag,
        schedule_delivery_time: String,
        validity_period: String,
        registered_delivery: u8,
        data_coding: DataCoding,
        tlvs: Vec<Tlv>,
    }

    /// True when short_message starts with a User Data Header
    pub fn has_udh(&self) -> bool {
        self.esm_class & ESM_CLASS_UDHI != 0
    }

    pub fn tlv(&self, tag: u16) -> Option<&Tlv> {
        find_tlv(&self.tlvs, tag)
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self.short_message.len() > MAX_SHORT_MESSAGE_LENGTH {
            return Err(CodecError::FieldValidation {
                field: "short_message",
                reason: format!(
                    "{} octets exceeds maximum of {}",
                    self.short_message.len(),
                    MAX_SHORT_MESSAGE_LENGTH
                ),
            });
        }

        buf.put_u8(self.esm_class);
        buf.put_u8(self.protocol_id);
        buf.put_u8(self.priority_flag as u8);
        encode_cstring(
            buf,
            &self.schedule_delivery_time,
            MAX_TIME_LENGTH,
            "schedule_delivery_time",
        )?;
        encode_cstring(buf, &self.validity_period, MAX_TIME_LENGTH, "validity_period")?;
        buf.put_u8(self.registered_delivery);
        buf.put_u8(self.replace_if_present_flag);
        buf.put_u8(self.data_coding.to_byte());
        buf.put_u8(self.sm_default_msg_id);
        buf.put_u8(self.short_message.len() as u8);
        buf.put_slice(&self.short_message);
        encode_tlvs(buf, &self.tlvs)
    }

    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let esm_class = decode_u8(buf)?;
        let protocol_id = decode_u8(buf)?;
        let priority_flag = decode_enum(buf, "priority_flag")?;
        let schedule_delivery_time =
            decode_cstring(buf, MAX_TIME_LENGTH, "schedule_delivery_time")?;
        let validity_period = decode_cstring(buf, MAX_TIME_LENGTH, "validity_period")?;
        let registered_delivery = decode_u8(buf)?;
        let replace_if_present_flag = decode_u8(buf)?;
        let data_coding = DataCoding::from_byte(decode_u8(buf)?);
        let sm_default_msg_id = decode_u8(buf)?;
        let sm_length = decode_u8(buf)? as usize;
        let short_message = decode_octets(buf, sm_length).map_err(|_| {
            CodecError::FieldValidation {
                field: "short_message",
                reason: format!("sm_length {sm_length} runs past the end of the PDU"),
            }
        })?;
        let tlvs = decode_tlvs(buf)?;

        Ok(MessageParams {
            esm_class,
            protocol_id,
            priority_flag,
            schedule_delivery_time,
            validity_period,
            registered_delivery,
            replace_if_present_flag,
            data_coding,
            sm_default_msg_id,
            short_message,
            tlvs,
        })
    }
}

pub(crate) fn encode_service_type(buf: &mut BytesMut, value: &str) -> Result<(), CodecError> {
    encode_cstring(buf, value, MAX_SERVICE_TYPE_LENGTH, "service_type")
}

pub(crate) fn decode_service_type(buf: &mut Cursor<&[u8]>) -> Result<String, CodecError> {
    decode_cstring(buf, MAX_SERVICE_TYPE_LENGTH, "service_type")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::tlv::tags;

    #[test]
    fn params_layout_with_tlv() {
        let params = MessageParams::new(&b"hi"[..])
            .data_coding(DataCoding::Ucs2)
            .tlvs(vec![Tlv::from_u16(tags::USER_MESSAGE_REFERENCE, 7)]);

        let mut buf = BytesMut::new();
        params.encode(&mut buf).unwrap();

        assert_eq!(
            buf.as_ref(),
            &[
                0x00, 0x00, 0x00, // esm_class, protocol_id, priority_flag
                0x00, 0x00, // empty schedule and validity
                0x00, 0x00, 0x08, 0x00, // registered, replace, data_coding, default id
                0x02, b'h', b'i', // sm_length + short_message
                0x02, 0x04, 0x00, 0x02, 0x00, 0x07, // user_message_reference TLV
            ]
        );

        let mut cursor = Cursor::new(buf.as_ref());
        let decoded = MessageParams::decode(&mut cursor).unwrap();
        assert_eq!(decoded, params);
        assert_eq!(
            decoded
                .tlv(tags::USER_MESSAGE_REFERENCE)
                .and_then(|tlv| tlv.as_u16()),
            Some(7)
        );
    }

    #[test]
    fn short_message_over_254_octets_is_rejected() {
        let params = MessageParams::new(vec![b'x'; 255]);
        let mut buf = BytesMut::new();
        assert!(matches!(
            params.encode(&mut buf),
            Err(CodecError::FieldValidation {
                field: "short_message",
                ..
            })
        ));
    }

    #[test]
    fn sm_length_past_end_is_a_field_error() {
        let data: &[u8] = &[0, 0, 0, 0, 0, 0, 0, 0, 0, 10, b'a'];
        let mut cursor = Cursor::new(data);
        assert!(matches!(
            MessageParams::decode(&mut cursor),
            Err(CodecError::FieldValidation {
                field: "short_message",
                ..
            })
        ));
    }

    #[test]
    fn udhi_flag() {
        assert!(MessageParams::new(Bytes::new()).esm_class(ESM_CLASS_UDHI).has_udh());
        assert!(!MessageParams::new(Bytes::new()).has_udh());
    }
}
