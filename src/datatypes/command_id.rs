// ABOUTME: Defines the SMPP v3.4 command_id values for the PDU set this client speaks
// ABOUTME: Response ids carry the high bit so requests and responses can be told apart on the wire

use num_enum::TryFromPrimitive;

#[derive(TryFromPrimitive)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandId {
    GenericNack = 0x8000_0000,
    BindReceiver = 0x0000_0001,
    BindReceiverResp = 0x8000_0001,
    BindTransmitter = 0x0000_0002,
    BindTransmitterResp = 0x8000_0002,
    QuerySm = 0x0000_0003,
    QuerySmResp = 0x8000_0003,
    SubmitSm = 0x0000_0004,
    SubmitSmResp = 0x8000_0004,
    DeliverSm = 0x0000_0005,
    DeliverSmResp = 0x8000_0005,
    Unbind = 0x0000_0006,
    UnbindResp = 0x8000_0006,
    BindTransceiver = 0x0000_0009,
    BindTransceiverResp = 0x8000_0009,
    EnquireLink = 0x0000_0015,
    EnquireLinkResp = 0x8000_0015,
    SubmitMulti = 0x0000_0021,
    SubmitMultiResp = 0x8000_0021,
    // replace_sm, cancel_sm, outbind, data_sm and alert_notification are not
    // part of the supported set and decode as InvalidCommandId.
}

impl CommandId {
    /// Check if this command_id represents a response PDU
    pub fn is_response(&self) -> bool {
        (*self as u32) & 0x8000_0000 != 0
    }

    /// The response id paired with a request id, if the request expects one
    pub fn response_id(&self) -> Option<CommandId> {
        if self.is_response() {
            return None;
        }
        CommandId::try_from((*self as u32) | 0x8000_0000).ok()
    }
}
