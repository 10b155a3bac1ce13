// ABOUTME: SMPP command_status codes carried in every PDU header and in submit_multi_resp entries
// ABOUTME: Codes outside the standard table are preserved verbatim so vendor errors reach the caller

use std::fmt;

/// The command_status field of an SMPP message response indicates the success
/// or failure of an SMPP request. It is relevant only in the SMPP response
/// message and should be set to NULL in SMPP request messages. The SMPP Error
/// status codes are returned by the SMSC in the command_status field of the
/// SMPP message header and in the error_status_code field of a
/// submit_multi_resp message.
///
/// Vendor specific and reserved values decode to [`CommandStatus::Other`]
/// rather than failing, since an SMSC is free to return them.
macro_rules! command_status_table {
    ($( $(#[$doc:meta])* $name:ident = $code:expr, )*) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum CommandStatus {
            $( $(#[$doc])* $name, )*
            /// Reserved or SMSC vendor specific code
            Other(u32),
        }

        impl CommandStatus {
            /// Numeric value as carried on the wire
            pub fn code(&self) -> u32 {
                match self {
                    $( CommandStatus::$name => $code, )*
                    CommandStatus::Other(code) => *code,
                }
            }
        }

        impl From<u32> for CommandStatus {
            fn from(code: u32) -> Self {
                match code {
                    $( $code => CommandStatus::$name, )*
                    other => CommandStatus::Other(other),
                }
            }
        }
    };
}

command_status_table! {
    /// No Error
    Ok = 0x0000_0000,
    /// Message Length is invalid
    InvalidMsgLength = 0x0000_0001,
    /// Command Length is invalid
    InvalidCommandLength = 0x0000_0002,
    /// Invalid Command ID
    InvalidCommandId = 0x0000_0003,
    /// Incorrect BIND Status for given command
    IncorrectBindStatus = 0x0000_0004,
    /// ESME Already in Bound State
    AlreadyBoundState = 0x0000_0005,
    /// Invalid Priority Flag
    InvalidPriorityFlag = 0x0000_0006,
    /// Invalid Registered Delivery Flag
    InvalidRegisteredDeliveryFlag = 0x0000_0007,
    /// System Error
    SystemError = 0x0000_0008,
    /// Invalid Source Address
    InvalidSourceAddress = 0x0000_000A,
    /// Invalid Dest Addr
    InvalidDestinationAddress = 0x0000_000B,
    /// Message ID is invalid
    InvalidMessageId = 0x0000_000C,
    /// Bind Failed
    BindFailed = 0x0000_000D,
    /// Invalid Password
    InvalidPassword = 0x0000_000E,
    /// Invalid System ID
    InvalidSystemId = 0x0000_000F,
    /// Cancel SM Failed
    CancelSmFailed = 0x0000_0011,
    /// Replace SM Failed
    ReplaceSmFailed = 0x0000_0013,
    /// Message Queue Full
    MessageQueueFull = 0x0000_0014,
    /// Invalid Service Type
    InvalidServiceType = 0x0000_0015,
    /// Invalid number of destinations
    InvalidNumberOfDestinations = 0x0000_0033,
    /// Invalid Distribution List name
    InvalidDistributionListName = 0x0000_0034,
    /// Destination flag is invalid (submit_multi)
    InvalidDestinationFlag = 0x0000_0040,
    /// Invalid 'submit with replace' request
    InvalidSubmitWithReplaceRequest = 0x0000_0042,
    /// Invalid esm_class field data
    InvalidEsmClassFieldData = 0x0000_0043,
    /// Cannot Submit to Distribution List
    CannotSubmitToDistributionList = 0x0000_0044,
    /// submit_sm or submit_multi failed
    SubmitFailed = 0x0000_0045,
    /// Invalid Source address TON
    InvalidSourceAddressTon = 0x0000_0048,
    /// Invalid Source address NPI
    InvalidSourceAddressNpi = 0x0000_0049,
    /// Invalid Destination address TON
    InvalidDestinationAddressTon = 0x0000_0050,
    /// Invalid Destination address NPI
    InvalidDestinationAddressNpi = 0x0000_0051,
    /// Invalid system_type field
    InvalidSystemTypeField = 0x0000_0053,
    /// Invalid replace_if_present flag
    InvalidReplaceIfPresentFlag = 0x0000_0054,
    /// Invalid number of messages
    InvalidNumberOfMessages = 0x0000_0055,
    /// Throttling error (ESME has exceeded allowed message limits)
    ThrottlingError = 0x0000_0058,
    /// Invalid Scheduled Delivery Time
    InvalidScheduledDeliveryTime = 0x0000_0061,
    /// Invalid message validity period (Expiry time)
    InvalidExpiryTime = 0x0000_0062,
    /// Predefined Message Invalid or Not Found
    InvalidPredefinedMessageId = 0x0000_0063,
    /// ESME Receiver Temporary App Error Code
    ReceiverTemporaryAppError = 0x0000_0064,
    /// ESME Receiver Permanent App Error Code
    ReceiverPermanentAppError = 0x0000_0065,
    /// ESME Receiver Reject Message Error Code
    ReceiverRejectMessageError = 0x0000_0066,
    /// query_sm request failed
    QuerySmRequestFailed = 0x0000_0067,
    /// Error in the optional part of the PDU Body.
    ErrorInOptionalPartOfPduBody = 0x0000_00C0,
    /// Optional Parameter not allowed
    OptionalParameterNotAllowed = 0x0000_00C1,
    /// Invalid Parameter Length.
    InvalidParameterLength = 0x0000_00C2,
    /// Expected Optional Parameter missing
    ExpectedOptionalParameterMissing = 0x0000_00C3,
    /// Invalid Optional Parameter Value
    InvalidOptionalParameterValue = 0x0000_00C4,
    /// Delivery Failure (used for data_sm_resp)
    DeliveryFailed = 0x0000_00FE,
    /// Unknown Error
    UnknownError = 0x0000_00FF,
}

impl CommandStatus {
    pub fn is_ok(&self) -> bool {
        *self == CommandStatus::Ok
    }
}

impl Default for CommandStatus {
    fn default() -> Self {
        CommandStatus::Ok
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Other(code) => write!(f, "status {code:#010x}"),
            known => write!(f, "{known:?} ({:#010x})", known.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_roundtrip() {
        assert_eq!(CommandStatus::from(0x0E), CommandStatus::InvalidPassword);
        assert_eq!(CommandStatus::ThrottlingError.code(), 0x58);
        assert!(CommandStatus::from(0).is_ok());
    }

    #[test]
    fn vendor_codes_are_preserved() {
        let status = CommandStatus::from(0x0000_0401);
        assert_eq!(status, CommandStatus::Other(0x401));
        assert_eq!(status.code(), 0x401);
        assert_eq!(status.to_string(), "status 0x00000401");
    }
}
