// ABOUTME: query_sm and query_sm_resp, used to ask the SMSC for the state of a submitted message
// ABOUTME: message_state is kept as the raw octet; MessageState gives it a name

use crate::codec::{
    decode_cstring, decode_u8, encode_cstring, CodecError, Decodable, Encodable, PduHeader,
};
use crate::datatypes::message::{Address, MAX_TIME_LENGTH};
use crate::datatypes::submit_sm::MAX_MESSAGE_ID_LENGTH;
use crate::datatypes::{CommandId, CommandStatus, MessageState};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// Queries the state of a previously submitted message.
///
/// `source` must match the source address given at submission time.
#[derive(Clone, Debug, PartialEq)]
pub struct QuerySm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
    pub source: Address,
}

impl QuerySm {
    pub fn new(message_id: impl Into<String>, source: Address) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number: 0,
            message_id: message_id.into(),
            source,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct QuerySmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
    /// When the message reached its final state; empty while still pending
    pub final_date: String,
    pub message_state: u8,
    /// Network specific failure code, 0 when not applicable
    pub error_code: u8,
}

impl QuerySmResponse {
    pub fn new(sequence_number: u32, message_id: impl Into<String>, state: MessageState) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            message_id: message_id.into(),
            final_date: String::new(),
            message_state: state as u8,
            error_code: 0,
        }
    }

    pub fn state_name(&self) -> &'static str {
        MessageState::name_of(self.message_state)
    }
}

impl Encodable for QuerySm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let start = PduHeader::begin(
            buf,
            CommandId::QuerySm,
            self.command_status,
            self.sequence_number,
        );
        encode_cstring(buf, &self.message_id, MAX_MESSAGE_ID_LENGTH, "message_id")?;
        self.source.encode(buf, "source_addr")?;
        PduHeader::finish(buf, start)
    }
}

impl Decodable for QuerySm {
    fn command_id() -> CommandId {
        CommandId::QuerySm
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        Ok(QuerySm {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id: decode_cstring(buf, MAX_MESSAGE_ID_LENGTH, "message_id")?,
            source: Address::decode(buf, "source_addr")?,
        })
    }
}

impl Encodable for QuerySmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let start = PduHeader::begin(
            buf,
            CommandId::QuerySmResp,
            self.command_status,
            self.sequence_number,
        );
        encode_cstring(buf, &self.message_id, MAX_MESSAGE_ID_LENGTH, "message_id")?;
        encode_cstring(buf, &self.final_date, MAX_TIME_LENGTH, "final_date")?;
        buf.put_u8(self.message_state);
        buf.put_u8(self.error_code);
        PduHeader::finish(buf, start)
    }
}

impl Decodable for QuerySmResponse {
    fn command_id() -> CommandId {
        CommandId::QuerySmResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let mut resp = QuerySmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id: String::new(),
            final_date: String::new(),
            message_state: 0,
            error_code: 0,
        };
        if !buf.has_remaining() {
            return Ok(resp);
        }

        resp.message_id = decode_cstring(buf, MAX_MESSAGE_ID_LENGTH, "message_id")?;
        resp.final_date = decode_cstring(buf, MAX_TIME_LENGTH, "final_date")?;
        resp.message_state = decode_u8(buf)?;
        resp.error_code = decode_u8(buf)?;
        Ok(resp)
    }
}
