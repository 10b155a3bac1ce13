// SMPP v3.4 Codec - Separates parsing/encoding logic from domain models
//
// Every PDU implements Encodable/Decodable. `Frame` is the sum of all PDUs the
// client understands and `PduRegistry` maps a decoded header to the decoder
// for its body.

use crate::datatypes::{
    BindReceiver, BindReceiverResponse, BindTransceiver, BindTransceiverResponse,
    BindTransmitter, BindTransmitterResponse, CommandId, CommandStatus, DeliverSm,
    DeliverSmResponse, EnquireLink, EnquireLinkResponse, GenericNack, QuerySm, QuerySmResponse,
    SubmitMulti, SubmitMultiResponse, SubmitSm, SubmitSmResponse, Unbind, UnbindResponse,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::OnceLock;
use thiserror::Error;

/// Maximum allowed PDU size to prevent memory exhaustion attacks
pub const MAX_PDU_SIZE: u32 = 65536; // 64KB

/// SMPP v3.4 PDU Header (16 bytes, common to all PDUs)
#[derive(Debug, Clone, PartialEq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Decode PDU header from buffer with validation
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = buf.get_u32();
        let command_id_raw = buf.get_u32();
        let command_status = CommandStatus::from(buf.get_u32());
        let sequence_number = buf.get_u32();

        // Validate PDU size constraints
        if !(Self::SIZE as u32..=MAX_PDU_SIZE).contains(&command_length) {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: Self::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        let command_id = CommandId::try_from(command_id_raw).map_err(|_| {
            CodecError::InvalidCommandId {
                command_id: command_id_raw,
                sequence_number,
            }
        })?;

        // Requests must carry command_status = 0. Sequence 0 is accepted because
        // a generic_nack for an unreadable request legitimately uses it.
        if !command_id.is_response() && !command_status.is_ok() {
            return Err(CodecError::InvalidRequestStatus {
                command_id,
                command_status,
            });
        }

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    /// Encode PDU header to buffer
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id as u32);
        buf.put_u32(self.command_status.code());
        buf.put_u32(self.sequence_number);
        Ok(())
    }

    /// Writes a header with a placeholder length, patched by `finish_pdu`
    pub fn begin(
        buf: &mut BytesMut,
        command_id: CommandId,
        command_status: CommandStatus,
        sequence_number: u32,
    ) -> usize {
        let start = buf.len();
        buf.put_u32(0);
        buf.put_u32(command_id as u32);
        buf.put_u32(command_status.code());
        buf.put_u32(sequence_number);
        start
    }

    /// Patches command_length for the PDU that started at `start`
    pub fn finish(buf: &mut BytesMut, start: usize) -> Result<(), CodecError> {
        let length = (buf.len() - start) as u32;
        if length > MAX_PDU_SIZE {
            return Err(CodecError::InvalidPduLength {
                length,
                min: Self::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }
        buf[start..start + 4].copy_from_slice(&length.to_be_bytes());
        Ok(())
    }
}

/// Trait for types that can be encoded to bytes
pub trait Encodable {
    /// Encode this PDU, header included, to the buffer
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Calculate the encoded size without keeping the encoding
    fn encoded_size(&self) -> usize {
        let mut buf = BytesMut::new();
        self.encode(&mut buf).map(|_| buf.len()).unwrap_or(0)
    }

    /// Encode into a fresh buffer and return the frozen frame
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(64);
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Trait for types that can be decoded from bytes
pub trait Decodable: Sized {
    /// Decode this PDU from the buffer after header
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;

    /// Return the expected command_id for this PDU type
    fn command_id() -> CommandId;

    /// Validate the header is appropriate for this PDU type
    fn validate_header(header: &PduHeader) -> Result<(), CodecError> {
        if header.command_id != Self::command_id() {
            return Err(CodecError::UnexpectedCommandId {
                expected: Self::command_id(),
                actual: header.command_id,
            });
        }
        Ok(())
    }
}

/// Codec errors with detailed context for debugging
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Incomplete PDU: need more data")]
    Incomplete,

    #[error("Invalid command_id: {command_id:#x} (sequence {sequence_number})")]
    InvalidCommandId { command_id: u32, sequence_number: u32 },

    #[error("Invalid PDU length: {length}, must be {min}-{max}")]
    InvalidPduLength { length: u32, min: u32, max: u32 },

    #[error("Declared command_length {declared} does not match {actual} octets read")]
    LengthMismatch { declared: u32, actual: usize },

    #[error("Request PDU {command_id:?} has non-zero status: {command_status}")]
    InvalidRequestStatus {
        command_id: CommandId,
        command_status: CommandStatus,
    },

    #[error("Unexpected command_id: expected {expected:?}, got {actual:?}")]
    UnexpectedCommandId {
        expected: CommandId,
        actual: CommandId,
    },

    #[error("Field '{field}' validation failed: {reason}")]
    FieldValidation { field: &'static str, reason: String },

    #[error("TLV parsing error: {0}")]
    TlvError(String),

    #[error("UTF-8 decoding error in field '{field}': {source}")]
    Utf8Error {
        field: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl CodecError {
    /// Convert codec errors to the command_status an SMSC would answer with
    pub fn to_command_status(&self) -> CommandStatus {
        match self {
            CodecError::InvalidPduLength { .. } | CodecError::LengthMismatch { .. } => {
                CommandStatus::InvalidCommandLength
            }
            CodecError::InvalidCommandId { .. } => CommandStatus::InvalidCommandId,
            CodecError::FieldValidation { field, .. } => match *field {
                "source_addr" => CommandStatus::InvalidSourceAddress,
                "destination_addr" => CommandStatus::InvalidDestinationAddress,
                "short_message" => CommandStatus::InvalidMsgLength,
                _ => CommandStatus::SystemError,
            },
            CodecError::TlvError(_) => CommandStatus::ErrorInOptionalPartOfPduBody,
            _ => CommandStatus::SystemError,
        }
    }
}

/// Decode a variable length C-Octet string of at most `max_len` octets,
/// terminator included.
///
/// The terminator must appear before the end of the PDU body.
pub fn decode_cstring(
    buf: &mut Cursor<&[u8]>,
    max_len: usize,
    field_name: &'static str,
) -> Result<String, CodecError> {
    let start = buf.position() as usize;
    let available = &buf.get_ref()[start..];

    let end = available
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| CodecError::FieldValidation {
            field: field_name,
            reason: "missing NUL terminator before end of PDU".to_string(),
        })?;

    if end + 1 > max_len {
        return Err(CodecError::FieldValidation {
            field: field_name,
            reason: format!("{} octets exceeds maximum of {}", end + 1, max_len),
        });
    }

    let value = available[..end].to_vec();
    buf.advance(end + 1);

    String::from_utf8(value).map_err(|e| CodecError::Utf8Error {
        field: field_name,
        source: e,
    })
}

/// Decode a single byte
pub fn decode_u8(buf: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u8())
}

/// Decode a single byte into one of the num_enum field types
pub fn decode_enum<T: TryFrom<u8>>(
    buf: &mut Cursor<&[u8]>,
    field_name: &'static str,
) -> Result<T, CodecError> {
    let raw = decode_u8(buf)?;
    T::try_from(raw).map_err(|_| CodecError::FieldValidation {
        field: field_name,
        reason: format!("unsupported value {raw:#04x}"),
    })
}

/// Decode a 16-bit big-endian integer
pub fn decode_u16(buf: &mut Cursor<&[u8]>) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u16())
}

/// Decode a 32-bit big-endian integer
pub fn decode_u32(buf: &mut Cursor<&[u8]>) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u32())
}

/// Decode `len` raw octets
pub fn decode_octets(buf: &mut Cursor<&[u8]>, len: usize) -> Result<Bytes, CodecError> {
    if buf.remaining() < len {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.copy_to_bytes(len))
}

/// Peek at next 4 bytes without advancing cursor (for command_length)
pub fn peek_u32(buf: &mut Cursor<&[u8]>) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::Incomplete);
    }

    let pos = buf.position();
    let value = buf.get_u32();
    buf.set_position(pos);
    Ok(value)
}

/// Encode a C-Octet string. `max_len` counts the terminator.
pub fn encode_cstring(
    buf: &mut BytesMut,
    value: &str,
    max_len: usize,
    field_name: &'static str,
) -> Result<(), CodecError> {
    let bytes = value.as_bytes();

    if bytes.contains(&0) {
        return Err(CodecError::FieldValidation {
            field: field_name,
            reason: "embedded NUL octet".to_string(),
        });
    }
    if bytes.len() + 1 > max_len {
        return Err(CodecError::FieldValidation {
            field: field_name,
            reason: format!("{} octets exceeds maximum of {}", bytes.len() + 1, max_len),
        });
    }

    buf.put_slice(bytes);
    buf.put_u8(0);
    Ok(())
}

/// Encode a single byte
pub fn encode_u8(buf: &mut BytesMut, value: u8) {
    buf.put_u8(value);
}

/// Encode a 16-bit big-endian integer
pub fn encode_u16(buf: &mut BytesMut, value: u16) {
    buf.put_u16(value);
}

/// Encode a 32-bit big-endian integer
pub fn encode_u32(buf: &mut BytesMut, value: u32) {
    buf.put_u32(value);
}

/// Generic frame type that can hold any supported PDU
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    // Keep-alive PDUs
    EnquireLink(EnquireLink),
    EnquireLinkResp(EnquireLinkResponse),

    // Session management PDUs
    Unbind(Unbind),
    UnbindResp(UnbindResponse),
    BindTransmitter(BindTransmitter),
    BindTransmitterResp(BindTransmitterResponse),
    BindReceiver(BindReceiver),
    BindReceiverResp(BindReceiverResponse),
    BindTransceiver(BindTransceiver),
    BindTransceiverResp(BindTransceiverResponse),

    // Message PDUs
    SubmitSm(Box<SubmitSm>),
    SubmitSmResp(SubmitSmResponse),
    SubmitMulti(Box<SubmitMulti>),
    SubmitMultiResp(SubmitMultiResponse),
    QuerySm(QuerySm),
    QuerySmResp(QuerySmResponse),
    DeliverSm(Box<DeliverSm>),
    DeliverSmResp(DeliverSmResponse),

    GenericNack(GenericNack),
}

/// Expands `$body` once per frame variant with `$pdu` bound to the inner PDU
macro_rules! each_frame {
    ($frame:expr, $pdu:ident => $body:expr) => {
        match $frame {
            Frame::EnquireLink($pdu) => $body,
            Frame::EnquireLinkResp($pdu) => $body,
            Frame::Unbind($pdu) => $body,
            Frame::UnbindResp($pdu) => $body,
            Frame::BindTransmitter($pdu) => $body,
            Frame::BindTransmitterResp($pdu) => $body,
            Frame::BindReceiver($pdu) => $body,
            Frame::BindReceiverResp($pdu) => $body,
            Frame::BindTransceiver($pdu) => $body,
            Frame::BindTransceiverResp($pdu) => $body,
            Frame::SubmitSm($pdu) => $body,
            Frame::SubmitSmResp($pdu) => $body,
            Frame::SubmitMulti($pdu) => $body,
            Frame::SubmitMultiResp($pdu) => $body,
            Frame::QuerySm($pdu) => $body,
            Frame::QuerySmResp($pdu) => $body,
            Frame::DeliverSm($pdu) => $body,
            Frame::DeliverSmResp($pdu) => $body,
            Frame::GenericNack($pdu) => $body,
        }
    };
}

impl Frame {
    /// Get the command_id for this frame
    pub fn command_id(&self) -> CommandId {
        match self {
            Frame::EnquireLink(_) => CommandId::EnquireLink,
            Frame::EnquireLinkResp(_) => CommandId::EnquireLinkResp,
            Frame::Unbind(_) => CommandId::Unbind,
            Frame::UnbindResp(_) => CommandId::UnbindResp,
            Frame::BindTransmitter(_) => CommandId::BindTransmitter,
            Frame::BindTransmitterResp(_) => CommandId::BindTransmitterResp,
            Frame::BindReceiver(_) => CommandId::BindReceiver,
            Frame::BindReceiverResp(_) => CommandId::BindReceiverResp,
            Frame::BindTransceiver(_) => CommandId::BindTransceiver,
            Frame::BindTransceiverResp(_) => CommandId::BindTransceiverResp,
            Frame::SubmitSm(_) => CommandId::SubmitSm,
            Frame::SubmitSmResp(_) => CommandId::SubmitSmResp,
            Frame::SubmitMulti(_) => CommandId::SubmitMulti,
            Frame::SubmitMultiResp(_) => CommandId::SubmitMultiResp,
            Frame::QuerySm(_) => CommandId::QuerySm,
            Frame::QuerySmResp(_) => CommandId::QuerySmResp,
            Frame::DeliverSm(_) => CommandId::DeliverSm,
            Frame::DeliverSmResp(_) => CommandId::DeliverSmResp,
            Frame::GenericNack(_) => CommandId::GenericNack,
        }
    }

    /// Get the sequence number for this frame
    pub fn sequence_number(&self) -> u32 {
        each_frame!(self, pdu => pdu.sequence_number)
    }

    /// Stamp the sequence number assigned by the window
    pub fn set_sequence_number(&mut self, sequence_number: u32) {
        each_frame!(self, pdu => pdu.sequence_number = sequence_number)
    }

    /// Get the command_status carried in the header
    pub fn command_status(&self) -> CommandStatus {
        each_frame!(self, pdu => pdu.command_status)
    }

    /// Check if this frame is a response PDU
    pub fn is_response(&self) -> bool {
        self.command_id().is_response()
    }

    /// Encode the complete frame, header included
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        each_frame!(self, pdu => pdu.encode(buf))
    }

    pub fn to_bytes(&self) -> Result<Bytes, CodecError> {
        each_frame!(self, pdu => pdu.to_bytes())
    }

    /// Decode exactly one frame from `bytes`.
    ///
    /// `bytes` must hold the whole PDU and nothing else: the length prefix
    /// followed by `length - 4` further octets.
    pub fn decode(bytes: &[u8]) -> Result<Frame, CodecError> {
        let mut cursor = Cursor::new(bytes);
        let declared = peek_u32(&mut cursor)?;
        if declared as usize != bytes.len() {
            return Err(CodecError::LengthMismatch {
                declared,
                actual: bytes.len(),
            });
        }

        let header = PduHeader::decode(&mut cursor)?;
        let mut body = Cursor::new(&bytes[PduHeader::SIZE..]);
        PduRegistry::shared().decode_pdu(header, &mut body)
    }
}

/// Registry of PDU decoders for extensible parsing
type DecoderFn = Box<dyn Fn(PduHeader, &mut Cursor<&[u8]>) -> Result<Frame, CodecError> + Send + Sync>;

pub struct PduRegistry {
    decoders: HashMap<CommandId, DecoderFn>,
}

impl PduRegistry {
    /// Create a new registry with every supported PDU registered
    pub fn new() -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
        };

        // Header-only PDUs
        registry.register_pdu::<EnquireLink, _>(Frame::EnquireLink);
        registry.register_pdu::<EnquireLinkResponse, _>(Frame::EnquireLinkResp);
        registry.register_pdu::<Unbind, _>(Frame::Unbind);
        registry.register_pdu::<UnbindResponse, _>(Frame::UnbindResp);
        registry.register_pdu::<GenericNack, _>(Frame::GenericNack);

        // Bind PDUs
        registry.register_pdu::<BindTransmitter, _>(Frame::BindTransmitter);
        registry.register_pdu::<BindTransmitterResponse, _>(Frame::BindTransmitterResp);
        registry.register_pdu::<BindReceiver, _>(Frame::BindReceiver);
        registry.register_pdu::<BindReceiverResponse, _>(Frame::BindReceiverResp);
        registry.register_pdu::<BindTransceiver, _>(Frame::BindTransceiver);
        registry.register_pdu::<BindTransceiverResponse, _>(Frame::BindTransceiverResp);

        // Message PDUs (boxed for large structs)
        registry.register_pdu::<SubmitSm, _>(|pdu| Frame::SubmitSm(Box::new(pdu)));
        registry.register_pdu::<SubmitSmResponse, _>(Frame::SubmitSmResp);
        registry.register_pdu::<SubmitMulti, _>(|pdu| Frame::SubmitMulti(Box::new(pdu)));
        registry.register_pdu::<SubmitMultiResponse, _>(Frame::SubmitMultiResp);
        registry.register_pdu::<DeliverSm, _>(|pdu| Frame::DeliverSm(Box::new(pdu)));
        registry.register_pdu::<DeliverSmResponse, _>(Frame::DeliverSmResp);

        // Query PDUs
        registry.register_pdu::<QuerySm, _>(Frame::QuerySm);
        registry.register_pdu::<QuerySmResponse, _>(Frame::QuerySmResp);

        registry
    }

    /// Process-wide registry used by `Frame::decode`
    pub fn shared() -> &'static PduRegistry {
        static REGISTRY: OnceLock<PduRegistry> = OnceLock::new();
        REGISTRY.get_or_init(PduRegistry::new)
    }

    fn register_pdu<T, F>(&mut self, frame_constructor: F)
    where
        T: Decodable + 'static,
        F: Fn(T) -> Frame + Send + Sync + 'static,
    {
        let command_id = T::command_id();
        let decoder = Box::new(move |header: PduHeader, buf: &mut Cursor<&[u8]>| {
            let pdu = T::decode(header, buf)?;
            Ok(frame_constructor(pdu))
        });
        self.decoders.insert(command_id, decoder);
    }

    /// Decode a PDU given its header and body
    pub fn decode_pdu(
        &self,
        header: PduHeader,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Frame, CodecError> {
        match self.decoders.get(&header.command_id) {
            Some(decoder) => decoder(header, buf),
            None => Err(CodecError::InvalidCommandId {
                command_id: header.command_id as u32,
                sequence_number: header.sequence_number,
            }),
        }
    }

    #[cfg(test)]
    fn is_registered(&self, command_id: CommandId) -> bool {
        self.decoders.contains_key(&command_id)
    }

    #[cfg(test)]
    fn registered_commands(&self) -> Vec<CommandId> {
        self.decoders.keys().copied().collect()
    }
}

impl Default for PduRegistry {
    fn default() -> Self {
        Self::new()
    }
}
