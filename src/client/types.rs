// ABOUTME: Supporting types for SMPP session operations including credentials, messages and results
// ABOUTME: Translates the caller-facing ShortMessage into PDU field groups and wraps responses

use crate::client::error::SmppError;
use crate::codec::Frame;
use crate::datatypes::{
    relative_time, Address, BindBody, DestinationAddress, InterfaceVersion, MessageParams,
    NumericPlanIndicator, PriorityFlag, RegisteredDelivery, Tlv, TypeOfNumber, UnsuccessSme,
};
use crate::text::Text;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// SMPP bind operation credentials
///
/// Contains authentication information and bind type for establishing
/// SMPP sessions with the SMSC.
#[derive(Debug, Clone)]
pub struct BindCredentials {
    /// System identifier for authentication
    pub system_id: String,
    /// Password for authentication
    pub password: String,
    /// System type (optional, defaults to empty string)
    pub system_type: Option<String>,
    /// Type of bind operation to perform
    pub bind_type: BindType,
    /// SMPP interface version to use
    pub interface_version: InterfaceVersion,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,
    /// Addresses served by this ESME, used by receivers
    pub address_range: String,
}

impl BindCredentials {
    pub fn new(
        bind_type: BindType,
        system_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            system_id: system_id.into(),
            password: password.into(),
            system_type: None,
            bind_type,
            interface_version: InterfaceVersion::SmppV34,
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: String::new(),
        }
    }

    /// Create new bind credentials for transmitter session
    pub fn transmitter(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(BindType::Transmitter, system_id, password)
    }

    /// Create new bind credentials for receiver session
    pub fn receiver(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(BindType::Receiver, system_id, password)
    }

    /// Create new bind credentials for transceiver session
    pub fn transceiver(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(BindType::Transceiver, system_id, password)
    }

    /// Set system type
    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = Some(system_type.into());
        self
    }

    /// Set SMPP interface version
    pub fn with_version(mut self, interface_version: InterfaceVersion) -> Self {
        self.interface_version = interface_version;
        self
    }

    pub fn with_address_range(
        mut self,
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
        address_range: impl Into<String>,
    ) -> Self {
        self.addr_ton = ton;
        self.addr_npi = npi;
        self.address_range = address_range.into();
        self
    }

    pub(crate) fn bind_body(&self) -> BindBody {
        BindBody {
            system_id: self.system_id.clone(),
            password: self.password.clone(),
            system_type: self.system_type.clone().unwrap_or_default(),
            interface_version: self.interface_version,
            addr_ton: self.addr_ton,
            addr_npi: self.addr_npi,
            address_range: self.address_range.clone(),
        }
    }
}

/// Type of SMPP bind operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindType {
    /// Bind as transmitter (can send submit_sm)
    Transmitter,
    /// Bind as receiver (can receive deliver_sm)
    Receiver,
    /// Bind as transceiver (both transmitter and receiver capabilities)
    Transceiver,
}

impl BindType {
    /// Whether this role may submit and query messages
    pub fn can_transmit(&self) -> bool {
        !matches!(self, BindType::Receiver)
    }
}

/// Where the session is in its lifecycle. `Disconnected` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Unbound,
    Connecting,
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionStatus::Unbound => "Unbound",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
        };
        f.write_str(name)
    }
}

/// A status transition, with the error that caused it when there was one.
#[derive(Debug, Clone)]
pub struct ConnectionEvent {
    pub status: ConnectionStatus,
    pub error: Option<Arc<SmppError>>,
}

impl ConnectionEvent {
    pub(crate) fn new(status: ConnectionStatus) -> Self {
        Self {
            status,
            error: None,
        }
    }

    pub(crate) fn failed(error: SmppError) -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            error: Some(Arc::new(error)),
        }
    }
}

/// A message to submit.
///
/// Sent as submit_sm to `dst`, or as submit_multi when `dst_list` or
/// `dl_list` is non-empty.
#[derive(Debug, Clone, Default)]
pub struct ShortMessage {
    pub src: String,
    pub dst: String,
    /// Additional SME destinations, forcing submit_multi
    pub dst_list: Vec<String>,
    /// Distribution list names, forcing submit_multi
    pub dl_list: Vec<String>,
    pub text: Text,
    /// Relative validity period; `None` leaves it to the SMSC
    pub validity: Option<Duration>,
    pub register: RegisteredDelivery,
    pub service_type: String,
    pub source_ton: TypeOfNumber,
    pub source_npi: NumericPlanIndicator,
    pub dest_ton: TypeOfNumber,
    pub dest_npi: NumericPlanIndicator,
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority: PriorityFlag,
    pub schedule_delivery_time: String,
    pub replace_if_present: bool,
    pub sm_default_msg_id: u8,
    pub tlvs: Vec<Tlv>,
}

impl ShortMessage {
    pub fn new(src: impl Into<String>, dst: impl Into<String>, text: impl Into<Text>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_dst_list(mut self, dst_list: Vec<String>) -> Self {
        self.dst_list = dst_list;
        self
    }

    pub fn with_dl_list(mut self, dl_list: Vec<String>) -> Self {
        self.dl_list = dl_list;
        self
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = Some(validity);
        self
    }

    pub fn with_delivery_receipt(mut self) -> Self {
        self.register = RegisteredDelivery::FinalDeliveryReceipt;
        self
    }

    pub fn with_source_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.source_ton = ton;
        self.source_npi = npi;
        self
    }

    pub fn with_dest_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.dest_ton = ton;
        self.dest_npi = npi;
        self
    }

    pub fn with_priority(mut self, priority: PriorityFlag) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = service_type.into();
        self
    }

    pub fn with_tlv(mut self, tlv: Tlv) -> Self {
        self.tlvs.push(tlv);
        self
    }

    pub(crate) fn is_multi(&self) -> bool {
        !self.dst_list.is_empty() || !self.dl_list.is_empty()
    }

    pub(crate) fn source(&self) -> Address {
        Address::new(self.source_ton, self.source_npi, self.src.as_str())
    }

    pub(crate) fn destination(&self) -> Address {
        Address::new(self.dest_ton, self.dest_npi, self.dst.as_str())
    }

    /// `dst` (when set), then `dst_list`, then the distribution lists
    pub(crate) fn destinations(&self) -> Vec<DestinationAddress> {
        let smes = std::iter::once(&self.dst)
            .filter(|dst| !dst.is_empty())
            .chain(self.dst_list.iter())
            .map(|addr| {
                DestinationAddress::Sme(Address::new(self.dest_ton, self.dest_npi, addr.as_str()))
            });
        let lists = self
            .dl_list
            .iter()
            .map(|name| DestinationAddress::DistributionList(name.clone()));
        smes.chain(lists).collect()
    }

    /// Message attributes for one PDU carrying `short_message`
    pub(crate) fn params(&self, short_message: Bytes, esm_class: u8) -> MessageParams {
        MessageParams {
            esm_class,
            protocol_id: self.protocol_id,
            priority_flag: self.priority,
            schedule_delivery_time: self.schedule_delivery_time.clone(),
            validity_period: self.validity.map(relative_time).unwrap_or_default(),
            registered_delivery: self.register as u8,
            replace_if_present_flag: self.replace_if_present as u8,
            data_coding: self.text.data_coding(),
            sm_default_msg_id: self.sm_default_msg_id,
            short_message,
            tlvs: self.tlvs.clone(),
        }
    }
}

/// Outcome of a submit_sm or submit_multi.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitResult {
    resp: Frame,
}

impl SubmitResult {
    pub(crate) fn new(resp: Frame) -> Self {
        Self { resp }
    }

    /// Message id assigned by the SMSC
    pub fn resp_id(&self) -> &str {
        match &self.resp {
            Frame::SubmitSmResp(resp) => &resp.message_id,
            Frame::SubmitMultiResp(resp) => &resp.message_id,
            _ => "",
        }
    }

    /// The raw response PDU
    pub fn resp(&self) -> &Frame {
        &self.resp
    }

    /// Number of rejected destinations; `None` for submit_sm
    pub fn num_unsuccess(&self) -> Option<usize> {
        self.unsuccess_smes().map(<[UnsuccessSme]>::len)
    }

    /// Rejected destinations with their error codes; `None` for submit_sm
    pub fn unsuccess_smes(&self) -> Option<&[UnsuccessSme]> {
        match &self.resp {
            Frame::SubmitMultiResp(resp) => Some(&resp.unsuccess_smes),
            _ => None,
        }
    }
}

/// State of a previously submitted message as reported by query_sm_resp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub message_id: String,
    /// SMPP state name, e.g. `DELIVERED`
    pub state: &'static str,
    pub final_date: String,
    pub error_code: u8,
}
