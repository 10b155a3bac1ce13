// ABOUTME: submit_multi and submit_multi_resp, one message to a list of SMEs and distribution lists
// ABOUTME: The response lists every destination the SMSC could not accept

use crate::codec::{
    decode_cstring, decode_u32, decode_u8, encode_cstring, CodecError, Decodable, Encodable,
    PduHeader,
};
use crate::datatypes::message::{
    decode_service_type, encode_service_type, Address, MessageParams, MAX_ADDRESS_LENGTH,
};
use crate::datatypes::submit_sm::MAX_MESSAGE_ID_LENGTH;
use crate::datatypes::{CommandId, CommandStatus};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

pub const MAX_DESTINATIONS: usize = 255;
pub const MAX_DL_NAME_LENGTH: usize = 21;

const DEST_FLAG_SME: u8 = 0x01;
const DEST_FLAG_DISTRIBUTION_LIST: u8 = 0x02;

/// One entry of the dest_address list, tagged on the wire by dest_flag.
#[derive(Clone, Debug, PartialEq)]
pub enum DestinationAddress {
    Sme(Address),
    DistributionList(String),
}

impl DestinationAddress {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        match self {
            DestinationAddress::Sme(address) => {
                buf.put_u8(DEST_FLAG_SME);
                address.encode(buf, "destination_addr")
            }
            DestinationAddress::DistributionList(name) => {
                buf.put_u8(DEST_FLAG_DISTRIBUTION_LIST);
                encode_cstring(buf, name, MAX_DL_NAME_LENGTH, "dl_name")
            }
        }
    }

    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        match decode_u8(buf)? {
            DEST_FLAG_SME => Ok(DestinationAddress::Sme(Address::decode(
                buf,
                "destination_addr",
            )?)),
            DEST_FLAG_DISTRIBUTION_LIST => Ok(DestinationAddress::DistributionList(
                decode_cstring(buf, MAX_DL_NAME_LENGTH, "dl_name")?,
            )),
            flag => Err(CodecError::FieldValidation {
                field: "dest_flag",
                reason: format!("unknown destination flag {flag:#04x}"),
            }),
        }
    }
}

/// A destination the SMSC rejected, with the reason.
#[derive(Clone, Debug, PartialEq)]
pub struct UnsuccessSme {
    pub address: Address,
    pub error_status_code: CommandStatus,
}

impl UnsuccessSme {
    pub fn new(address: Address, error_status_code: CommandStatus) -> Self {
        Self {
            address,
            error_status_code,
        }
    }
}

/// Submits one short message to up to 255 SMEs and distribution lists.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitMulti {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub service_type: String,
    pub source: Address,
    pub destinations: Vec<DestinationAddress>,
    pub params: MessageParams,
}

impl SubmitMulti {
    pub fn new(
        source: Address,
        destinations: Vec<DestinationAddress>,
        params: MessageParams,
    ) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number: 0,
            service_type: String::new(),
            source,
            destinations,
            params,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubmitMultiResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
    pub unsuccess_smes: Vec<UnsuccessSme>,
}

impl SubmitMultiResponse {
    pub fn new(
        sequence_number: u32,
        message_id: impl Into<String>,
        unsuccess_smes: Vec<UnsuccessSme>,
    ) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            message_id: message_id.into(),
            unsuccess_smes,
        }
    }
}

impl Encodable for SubmitMulti {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self.destinations.is_empty() || self.destinations.len() > MAX_DESTINATIONS {
            return Err(CodecError::FieldValidation {
                field: "number_of_dests",
                reason: format!(
                    "{} destinations, must be 1-{}",
                    self.destinations.len(),
                    MAX_DESTINATIONS
                ),
            });
        }

        let start = PduHeader::begin(
            buf,
            CommandId::SubmitMulti,
            self.command_status,
            self.sequence_number,
        );
        encode_service_type(buf, &self.service_type)?;
        self.source.encode(buf, "source_addr")?;
        buf.put_u8(self.destinations.len() as u8);
        for destination in &self.destinations {
            destination.encode(buf)?;
        }
        self.params.encode(buf)?;
        PduHeader::finish(buf, start)
    }
}

impl Decodable for SubmitMulti {
    fn command_id() -> CommandId {
        CommandId::SubmitMulti
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        let service_type = decode_service_type(buf)?;
        let source = Address::decode(buf, "source_addr")?;
        let count = decode_u8(buf)?;
        let destinations = (0..count)
            .map(|_| DestinationAddress::decode(buf))
            .collect::<Result<Vec<_>, _>>()?;
        let params = MessageParams::decode(buf)?;

        Ok(SubmitMulti {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            service_type,
            source,
            destinations,
            params,
        })
    }
}

impl Encodable for SubmitMultiResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self.unsuccess_smes.len() > MAX_DESTINATIONS {
            return Err(CodecError::FieldValidation {
                field: "no_unsuccess",
                reason: format!("{} entries", self.unsuccess_smes.len()),
            });
        }

        let start = PduHeader::begin(
            buf,
            CommandId::SubmitMultiResp,
            self.command_status,
            self.sequence_number,
        );
        encode_cstring(buf, &self.message_id, MAX_MESSAGE_ID_LENGTH, "message_id")?;
        buf.put_u8(self.unsuccess_smes.len() as u8);
        for sme in &self.unsuccess_smes {
            buf.put_u8(sme.address.ton as u8);
            buf.put_u8(sme.address.npi as u8);
            encode_cstring(buf, &sme.address.addr, MAX_ADDRESS_LENGTH, "destination_addr")?;
            buf.put_u32(sme.error_status_code.code());
        }
        PduHeader::finish(buf, start)
    }
}

impl Decodable for SubmitMultiResponse {
    fn command_id() -> CommandId {
        CommandId::SubmitMultiResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let mut resp = SubmitMultiResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id: String::new(),
            unsuccess_smes: Vec::new(),
        };
        if !buf.has_remaining() {
            return Ok(resp);
        }

        resp.message_id = decode_cstring(buf, MAX_MESSAGE_ID_LENGTH, "message_id")?;
        let count = decode_u8(buf)?;
        for _ in 0..count {
            let address = Address::decode(buf, "destination_addr")?;
            let error_status_code = CommandStatus::from(decode_u32(buf)?);
            resp.unsuccess_smes
                .push(UnsuccessSme::new(address, error_status_code));
        }
        Ok(resp)
    }
}
