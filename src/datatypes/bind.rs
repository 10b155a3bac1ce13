// ABOUTME: bind_transmitter, bind_receiver and bind_transceiver requests plus their responses
// ABOUTME: All three requests share BindBody; responses carry the SMSC system_id

use crate::codec::{decode_cstring, decode_enum, encode_cstring, CodecError};
use crate::datatypes::tlv::Tlv;
use crate::datatypes::{
    CommandId, CommandStatus, InterfaceVersion, NumericPlanIndicator, TypeOfNumber,
};
use crate::macros::impl_bind_pdu;
use bytes::{BufMut, BytesMut};
use std::io::Cursor;

// Field limits, terminator included
pub const MAX_SYSTEM_ID_LENGTH: usize = 16;
pub const MAX_PASSWORD_LENGTH: usize = 9;
pub const MAX_SYSTEM_TYPE_LENGTH: usize = 13;
pub const MAX_ADDRESS_RANGE_LENGTH: usize = 41;

/// Mandatory body shared by every bind request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindBody {
    /// Identifies the ESME requesting to bind
    pub system_id: String,
    pub password: String,
    /// Categorises the ESME, e.g. "VMS"; empty when not applicable
    pub system_type: String,
    pub interface_version: InterfaceVersion,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,
    /// Range of SME addresses served by this ESME when bound as a receiver
    pub address_range: String,
}

impl BindBody {
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        encode_cstring(buf, &self.system_id, MAX_SYSTEM_ID_LENGTH, "system_id")?;
        encode_cstring(buf, &self.password, MAX_PASSWORD_LENGTH, "password")?;
        encode_cstring(buf, &self.system_type, MAX_SYSTEM_TYPE_LENGTH, "system_type")?;
        buf.put_u8(self.interface_version as u8);
        buf.put_u8(self.addr_ton as u8);
        buf.put_u8(self.addr_npi as u8);
        encode_cstring(
            buf,
            &self.address_range,
            MAX_ADDRESS_RANGE_LENGTH,
            "address_range",
        )
    }

    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Ok(BindBody {
            system_id: decode_cstring(buf, MAX_SYSTEM_ID_LENGTH, "system_id")?,
            password: decode_cstring(buf, MAX_PASSWORD_LENGTH, "password")?,
            system_type: decode_cstring(buf, MAX_SYSTEM_TYPE_LENGTH, "system_type")?,
            interface_version: decode_enum(buf, "interface_version")?,
            addr_ton: decode_enum(buf, "addr_ton")?,
            addr_npi: decode_enum(buf, "addr_npi")?,
            address_range: decode_cstring(buf, MAX_ADDRESS_RANGE_LENGTH, "address_range")?,
        })
    }
}

/// Binds the ESME as a transmitter: it may submit but will not receive deliver_sm.
#[derive(Clone, Debug, PartialEq)]
pub struct BindTransmitter {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub body: BindBody,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BindTransmitterResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    /// Identifies the SMSC to the ESME
    pub system_id: String,
    pub sc_interface_version: Option<Tlv>,
}

/// Binds the ESME as a receiver of deliver_sm only.
#[derive(Clone, Debug, PartialEq)]
pub struct BindReceiver {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub body: BindBody,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BindReceiverResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub system_id: String,
    pub sc_interface_version: Option<Tlv>,
}

/// Binds the ESME for traffic in both directions.
#[derive(Clone, Debug, PartialEq)]
pub struct BindTransceiver {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub body: BindBody,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BindTransceiverResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub system_id: String,
    pub sc_interface_version: Option<Tlv>,
}

impl_bind_pdu!(
    BindTransmitter,
    CommandId::BindTransmitter,
    BindTransmitterResponse,
    CommandId::BindTransmitterResp
);
impl_bind_pdu!(
    BindReceiver,
    CommandId::BindReceiver,
    BindReceiverResponse,
    CommandId::BindReceiverResp
);
impl_bind_pdu!(
    BindTransceiver,
    CommandId::BindTransceiver,
    BindTransceiverResponse,
    CommandId::BindTransceiverResp
);
