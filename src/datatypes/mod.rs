// ABOUTME: SMPP v3.4 field types and the PDU structs this client encodes and decodes
// ABOUTME: Each PDU module implements the Encodable/Decodable codec traits

pub mod bind;
mod command_id;
mod command_status;
mod data_coding;
pub mod deliver_sm;
pub mod enquire_link;
pub mod generic_nack;
mod interface_version;
pub mod message;
mod message_state;
mod numeric_plan_indicator;
mod priority_flag;
pub mod query_sm;
mod registered_delivery;
pub mod submit_multi;
pub mod submit_sm;
pub mod tlv;
mod type_of_number;
pub mod unbind;
mod validity;

pub use bind::{
    BindBody, BindReceiver, BindReceiverResponse, BindTransceiver, BindTransceiverResponse,
    BindTransmitter, BindTransmitterResponse,
};
pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use data_coding::DataCoding;
pub use deliver_sm::{DeliverSm, DeliverSmResponse};
pub use enquire_link::{EnquireLink, EnquireLinkResponse};
pub use generic_nack::GenericNack;
pub use interface_version::InterfaceVersion;
pub use message::{Address, MessageParams, ESM_CLASS_UDHI};
pub use message_state::MessageState;
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use priority_flag::PriorityFlag;
pub use query_sm::{QuerySm, QuerySmResponse};
pub use registered_delivery::RegisteredDelivery;
pub use submit_multi::{DestinationAddress, SubmitMulti, SubmitMultiResponse, UnsuccessSme};
pub use submit_sm::{SubmitSm, SubmitSmResponse};
pub use tlv::Tlv;
pub use type_of_number::TypeOfNumber;
pub use unbind::{Unbind, UnbindResponse};
pub use validity::relative_time;
