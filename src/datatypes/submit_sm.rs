// ABOUTME: submit_sm and submit_sm_resp, the single-destination message submission pair
// ABOUTME: The response carries the SMSC-assigned message_id used later by query_sm

use crate::codec::{
    decode_cstring, encode_cstring, CodecError, Decodable, Encodable, PduHeader,
};
use crate::datatypes::message::{decode_service_type, encode_service_type, Address, MessageParams};
use crate::datatypes::{CommandId, CommandStatus};
use bytes::{Buf, BytesMut};
use std::io::Cursor;

pub const MAX_MESSAGE_ID_LENGTH: usize = 65;

/// This operation is used by an ESME to submit a short message to the SMSC for onward transmission
/// to a specified short message entity (SME).
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    /// SMS application service; empty for the SMSC default
    pub service_type: String,
    pub source: Address,
    pub destination: Address,
    pub params: MessageParams,
}

impl SubmitSm {
    /// A submit_sm with sequence 0, to be stamped when it enters the window
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
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    /// SMSC message reference; empty when the submission was rejected
    pub message_id: String,
}

impl SubmitSmResponse {
    pub fn new(sequence_number: u32, message_id: impl Into<String>) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            message_id: message_id.into(),
        }
    }

    pub fn error(sequence_number: u32, status: CommandStatus) -> Self {
        Self {
            command_status: status,
            sequence_number,
            message_id: String::new(),
        }
    }
}

impl Encodable for SubmitSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let start = PduHeader::begin(
            buf,
            CommandId::SubmitSm,
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

impl Decodable for SubmitSm {
    fn command_id() -> CommandId {
        CommandId::SubmitSm
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        Ok(SubmitSm {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            service_type: decode_service_type(buf)?,
            source: Address::decode(buf, "source_addr")?,
            destination: Address::decode(buf, "destination_addr")?,
            params: MessageParams::decode(buf)?,
        })
    }
}

impl Encodable for SubmitSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let start = PduHeader::begin(
            buf,
            CommandId::SubmitSmResp,
            self.command_status,
            self.sequence_number,
        );
        // Rejections go out header-only
        if self.command_status.is_ok() {
            encode_cstring(buf, &self.message_id, MAX_MESSAGE_ID_LENGTH, "message_id")?;
        }
        PduHeader::finish(buf, start)
    }
}

impl Decodable for SubmitSmResponse {
    fn command_id() -> CommandId {
        CommandId::SubmitSmResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        let message_id = if buf.has_remaining() {
            decode_cstring(buf, MAX_MESSAGE_ID_LENGTH, "message_id")?
        } else {
            String::new()
        };
        Ok(SubmitSmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
        })
    }
}
