// ABOUTME: SMPP client session module: configuration, session engine, keep-alive and result types
// ABOUTME: Exports everything an application needs to bind, submit, query and receive

//! SMPP Client Module
//!
//! A [`Session`] owns one connection to an SMSC and multiplexes every
//! operation over it:
//!
//! * **Asynchronous bind** - [`Session::bind`] returns at once; the
//!   [`BindHandle`] reports the outcome and later status changes
//! * **Windowed requests** - many tasks may submit concurrently, bounded by the
//!   configured window size
//! * **Long messages** - [`Session::submit_long`] segments text and returns one
//!   result per part, in order
//! * **Keep-alive** - periodic enquire_link, failures end the session
//! * **Inbound PDUs** - deliver_sm and other unsolicited PDUs reach an
//!   [`InboundHandler`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smpp_session::client::{BindCredentials, ConnectionStatus, Session, SessionConfig, ShortMessage};
//! use smpp_session::text::Text;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new(SessionConfig::new(
//!     "localhost:2775",
//!     BindCredentials::transceiver("system_id", "password"),
//! ));
//!
//! if session.bind().wait().await.status != ConnectionStatus::Connected {
//!     return Err("bind failed".into());
//! }
//!
//! let message = ShortMessage::new("123456789", "987654321", Text::ucs2("Hello ✓"));
//! for part in session.submit_long(&message).await? {
//!     println!("accepted as {}", part.resp_id());
//! }
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod keepalive;
pub mod session;
pub mod traits;
pub mod types;

// Re-export the main types for easy access
pub use builder::SessionConfig;
pub use error::{SmppError, SmppResult};
pub use keepalive::{KeepAliveConfig, KeepAliveManager, KeepAliveStatus};
pub use session::{BindHandle, Session};
pub use traits::{channel_handler, InboundHandler};
pub use types::{
    BindCredentials, BindType, ConnectionEvent, ConnectionStatus, QueryResult, ShortMessage,
    SubmitResult,
};
