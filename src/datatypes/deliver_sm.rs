// ABOUTME: deliver_sm and deliver_sm_resp, SMSC-initiated delivery of messages and receipts
// ABOUTME: Same body layout as submit_sm; the response message_id is always empty

use crate::codec::{decode_cstring, encode_cstring, CodecError, Decodable, Encodable, PduHeader};
use crate::datatypes::message::{decode_service_type, encode_service_type, Address, MessageParams};
use crate::datatypes::submit_sm::MAX_MESSAGE_ID_LENGTH;
use crate::datatypes::{CommandId, CommandStatus};
use bytes::{Buf, BytesMut};
use std::io::Cursor;

/// Mobile originated message or delivery receipt routed to the ESME.
///
/// A delivery receipt is flagged in `params.esm_class` (bit 2) and usually
/// carries receipted_message_id and message_state TLVs.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub service_type: String,
    pub source: Address,
    pub destination: Address,
    pub params: MessageParams,
}

impl DeliverSm {
    pub fn new(source: Address, destination: Address, params: MessageParams) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number: 0,
            service_type: String::new(),
            source,
            destination,
            params,
        }
    }

    /// True when esm_class marks this as an SMSC delivery receipt
    pub fn is_delivery_receipt(&self) -> bool {
        self.params.esm_class & 0x3C == 0x04
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl DeliverSmResponse {
    pub fn new(sequence_number: u32) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
        }
    }
}

impl Encodable for DeliverSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let start = PduHeader::begin(
            buf,
            CommandId::DeliverSm,
            self.command_status,
            self.sequence_number,
        );
        encode_service_type(buf, &self.service_type)?;
        self.source.encode(buf, "source_addr")?;
        self.destination.encode(buf, "destination_addr")?;
        self.params.encode(buf)?;
        PduHeader::finish(buf, start)
    }
}

impl Decodable for DeliverSm {
    fn command_id() -> CommandId {
        CommandId::DeliverSm
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        Ok(DeliverSm {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            service_type: decode_service_type(buf)?,
            source: Address::decode(buf, "source_addr")?,
            destination: Address::decode(buf, "destination_addr")?,
            params: MessageParams::decode(buf)?,
        })
    }
}

impl Encodable for DeliverSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let start = PduHeader::begin(
            buf,
            CommandId::DeliverSmResp,
            self.command_status,
            self.sequence_number,
        );
        // message_id is unused and set to NULL
        encode_cstring(buf, "", MAX_MESSAGE_ID_LENGTH, "message_id")?;
        PduHeader::finish(buf, start)
    }
}

impl Decodable for DeliverSmResponse {
    fn command_id() -> CommandId {
        CommandId::DeliverSmResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        if buf.has_remaining() {
            decode_cstring(buf, MAX_MESSAGE_ID_LENGTH, "message_id")?;
        }
        Ok(DeliverSmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
        })
    }
}
