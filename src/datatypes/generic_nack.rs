// ABOUTME: generic_nack, the header-only negative acknowledgement for unreadable or unknown PDUs
// ABOUTME: Its sequence number is the offending request's, or 0 when that could not be read

use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_complete_header_only_pdu;

/// GenericNack is used to acknowledge the receipt of a PDU when the receiving
/// entity cannot process the PDU due to errors such as invalid command_id,
/// invalid command_status, or other format errors.
#[derive(Clone, Debug, PartialEq)]
pub struct GenericNack {
    /// The reason for the generic_nack
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl_complete_header_only_pdu!(GenericNack, CommandId::GenericNack);

impl GenericNack {
    /// Creates a GenericNack for an invalid command ID error
    pub fn invalid_command_id(sequence_number: u32) -> Self {
        Self::error(sequence_number, CommandStatus::InvalidCommandId)
    }

    /// Creates a GenericNack for a system error
    pub fn system_error(sequence_number: u32) -> Self {
        Self::error(sequence_number, CommandStatus::SystemError)
    }
}
