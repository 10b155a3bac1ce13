// ABOUTME: SMPP message_state values reported by query_sm_resp and delivery receipts
// ABOUTME: Provides the canonical upper-case state names callers compare against

use num_enum::TryFromPrimitive;
use std::fmt;

#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageState {
    Enroute = 1,
    Delivered = 2,
    Expired = 3,
    Deleted = 4,
    Undeliverable = 5,
    Accepted = 6,
    Unknown = 7,
    Rejected = 8,
}

impl MessageState {
    /// The state name as used in SMPP documentation and delivery receipts
    pub fn name(&self) -> &'static str {
        match self {
            MessageState::Enroute => "ENROUTE",
            MessageState::Delivered => "DELIVERED",
            MessageState::Expired => "EXPIRED",
            MessageState::Deleted => "DELETED",
            MessageState::Undeliverable => "UNDELIVERABLE",
            MessageState::Accepted => "ACCEPTED",
            MessageState::Unknown => "UNKNOWN",
            MessageState::Rejected => "REJECTED",
        }
    }

    /// Maps a raw state code to its name. Out of range codes map to `UNKNOWN`.
    pub fn name_of(code: u8) -> &'static str {
        MessageState::try_from(code)
            .unwrap_or(MessageState::Unknown)
            .name()
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
