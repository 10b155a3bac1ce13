// ABOUTME: This module provides macros to reduce boilerplate in SMPP PDU implementations
// ABOUTME: Includes macros for header-only PDUs, the bind family, TLV encoding, and builder setters

/// Implements Encodable/Decodable for a PDU that is only the 16 octet header.
///
/// A body on such a PDU is rejected so a misframed peer is noticed early.
macro_rules! impl_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        impl $crate::codec::Decodable for $pdu_type {
            fn command_id() -> $crate::datatypes::CommandId {
                $command_id
            }

            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use bytes::Buf;

                Self::validate_header(&header)?;

                if buf.has_remaining() {
                    return Err($crate::codec::CodecError::FieldValidation {
                        field: concat!(stringify!($pdu_type), "_body"),
                        reason: concat!(stringify!($pdu_type), " PDU should have no body")
                            .to_string(),
                    });
                }

                Ok($pdu_type {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                })
            }
        }

        impl $crate::codec::Encodable for $pdu_type {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                let header = $crate::codec::PduHeader {
                    command_length: $crate::codec::PduHeader::SIZE as u32,
                    command_id: $command_id,
                    command_status: self.command_status,
                    sequence_number: self.sequence_number,
                };
                header.encode(buf)
            }

            fn encoded_size(&self) -> usize {
                $crate::codec::PduHeader::SIZE
            }
        }
    };
}

/// Generates `new` and `error` constructors for header-only PDUs
macro_rules! impl_header_only_constructors {
    ($pdu_type:ident) => {
        impl $pdu_type {
            /// Create a new PDU with Ok status
            pub fn new(sequence_number: u32) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                }
            }

            /// Create a PDU with error status
            pub fn error(sequence_number: u32, status: $crate::datatypes::CommandStatus) -> Self {
                Self {
                    command_status: status,
                    sequence_number,
                }
            }
        }
    };
}

/// Codec implementation plus constructors for header-only PDUs
macro_rules! impl_complete_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        $crate::macros::impl_header_only_pdu!($pdu_type, $command_id);
        $crate::macros::impl_header_only_constructors!($pdu_type);
    };
}

/// Encodes each optional TLV field that is present
macro_rules! encode_optional_tlvs {
    ($self_expr:expr, $buf_expr:expr, $($field:ident),* $(,)?) => {
        $(
            if let Some(ref tlv) = $self_expr.$field {
                tlv.encode($buf_expr)?;
            }
        )*
    };
}

/// Fluent setters for builder structs
macro_rules! builder_setters {
    ($($field:ident: $type:ty),* $(,)?) => {
        $(
            pub fn $field(mut self, $field: $type) -> Self {
                self.$field = $field;
                self
            }
        )*
    };
}

/// The three bind requests share one body layout and differ only in
/// command_id. Each response carries the SMSC system_id and an optional
/// sc_interface_version TLV.
macro_rules! impl_bind_pdu {
    ($request:ident, $request_id:expr, $response:ident, $response_id:expr) => {
        impl $crate::codec::Decodable for $request {
            fn command_id() -> $crate::datatypes::CommandId {
                $request_id
            }

            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                Self::validate_header(&header)?;
                let body = $crate::datatypes::bind::BindBody::decode(buf)?;
                Ok($request {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                    body,
                })
            }
        }

        impl $crate::codec::Encodable for $request {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                let start = $crate::codec::PduHeader::begin(
                    buf,
                    $request_id,
                    self.command_status,
                    self.sequence_number,
                );
                self.body.encode(buf)?;
                $crate::codec::PduHeader::finish(buf, start)
            }
        }

        impl $request {
            pub fn new(sequence_number: u32, body: $crate::datatypes::bind::BindBody) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                    body,
                }
            }
        }

        impl $crate::codec::Decodable for $response {
            fn command_id() -> $crate::datatypes::CommandId {
                $response_id
            }

            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use bytes::Buf;

                Self::validate_header(&header)?;

                // A rejected bind may come back as a bare header
                if !buf.has_remaining() {
                    return Ok($response {
                        command_status: header.command_status,
                        sequence_number: header.sequence_number,
                        system_id: String::new(),
                        sc_interface_version: None,
                    });
                }

                let system_id = $crate::codec::decode_cstring(
                    buf,
                    $crate::datatypes::bind::MAX_SYSTEM_ID_LENGTH,
                    "system_id",
                )?;
                let sc_interface_version = $crate::datatypes::tlv::decode_tlvs(buf)?
                    .into_iter()
                    .find(|tlv| tlv.tag == $crate::datatypes::tlv::tags::SC_INTERFACE_VERSION);

                Ok($response {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                    system_id,
                    sc_interface_version,
                })
            }
        }

        impl $crate::codec::Encodable for $response {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                let start = $crate::codec::PduHeader::begin(
                    buf,
                    $response_id,
                    self.command_status,
                    self.sequence_number,
                );
                $crate::codec::encode_cstring(
                    buf,
                    &self.system_id,
                    $crate::datatypes::bind::MAX_SYSTEM_ID_LENGTH,
                    "system_id",
                )?;
                $crate::macros::encode_optional_tlvs!(self, buf, sc_interface_version);
                $crate::codec::PduHeader::finish(buf, start)
            }
        }

        impl $response {
            pub fn new(sequence_number: u32, system_id: impl Into<String>) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                    system_id: system_id.into(),
                    sc_interface_version: None,
                }
            }

            pub fn error(sequence_number: u32, status: $crate::datatypes::CommandStatus) -> Self {
                Self {
                    command_status: status,
                    sequence_number,
                    system_id: String::new(),
                    sc_interface_version: None,
                }
            }
        }
    };
}

// Make macros available to the rest of the crate
pub(crate) use {
    builder_setters, encode_optional_tlvs, impl_bind_pdu, impl_complete_header_only_pdu,
    impl_header_only_constructors, impl_header_only_pdu,
};
