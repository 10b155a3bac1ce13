//! SMPP v3.4 client session engine.
//!
//! Layers, leaves first:
//!
//! * [`codec`] and [`datatypes`] - PDU wire format
//! * [`text`] - message encodings and long message segmentation
//! * [`connection`] - framed reads and serialised writes over one stream
//! * [`window`] - sequence numbers and request/response correlation
//! * [`client`] - the [`Session`] built on all of the above
//!
//! # Examples
//!
//! ```rust,no_run
//! use smpp_session::{BindCredentials, ConnectionStatus, Session, SessionConfig, ShortMessage};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new(
//!         "localhost:2775",
//!         BindCredentials::transmitter("system_id", "password"),
//!     )
//!     .with_window_size(20)
//!     .with_rate_limiter(std::sync::Arc::new(smpp_session::ratelimit::per_second(50)));
//!
//!     let session = Session::new(config);
//!     let event = session.bind().wait().await;
//!     if event.status != ConnectionStatus::Connected {
//!         return Err(format!("bind failed: {:?}", event.error).into());
//!     }
//!
//!     let sms = ShortMessage::new("1234567890", "0987654321", "Hello, World!")
//!         .with_validity(Duration::from_secs(3600))
//!         .with_delivery_receipt();
//!     let result = session.submit(&sms).await?;
//!     println!("Message ID: {}", result.resp_id());
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod connection;
pub mod datatypes;
pub mod frame;
pub(crate) mod macros;
pub mod ratelimit;
pub mod text;
pub mod window;


// Re-export codec types for direct access
pub use codec::{CodecError, Decodable, Encodable, Frame, PduHeader, PduRegistry};

// Re-export the main client API for easy access
pub use client::{
    BindCredentials, BindHandle, BindType, ConnectionEvent, ConnectionStatus, InboundHandler,
    QueryResult, Session, SessionConfig, ShortMessage, SmppError, SmppResult, SubmitResult,
};
pub use ratelimit::RateLimiter;
pub use text::{Encoding, Text};
