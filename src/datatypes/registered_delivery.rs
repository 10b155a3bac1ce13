use num_enum::TryFromPrimitive;

/// SMSC delivery receipt request carried in registered_delivery (bits 0-1).
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RegisteredDelivery {
    /// No SMSC delivery receipt requested
    #[default]
    NoDeliveryReceipt = 0x00,
    /// Receipt requested on final delivery outcome, success or failure
    FinalDeliveryReceipt = 0x01,
    /// Receipt requested only when delivery fails
    FailureDeliveryReceipt = 0x02,
}
