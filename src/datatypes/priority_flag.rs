// ABOUTME: Defines SMPP v3.4 priority_flag field values for submit_sm, submit_multi and deliver_sm
// ABOUTME: Levels 4-255 are reserved and rejected on decode

use num_enum::TryFromPrimitive;

/// Priority level the SMSC should apply when scheduling the message.
///
/// Network mapping is SMSC-specific; level 0 is the normal, non-priority
/// level and the default for every outbound message.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PriorityFlag {
    #[default]
    Level0 = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
}
