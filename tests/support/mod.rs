// ABOUTME: In-process mock SMSC for session integration tests
// ABOUTME: Each inbound PDU is handed to a per-test handler on its own task

#![allow(dead_code)]

use smpp_session::client::{BindCredentials, KeepAliveConfig, SessionConfig};
use smpp_session::connection::Connection;
use smpp_session::datatypes::{
    BindReceiverResponse, BindTransceiverResponse, BindTransmitterResponse,
    EnquireLinkResponse, MessageState, QuerySmResponse, SubmitMultiResponse, SubmitSmResponse,
    UnbindResponse,
};
use smpp_session::Frame;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// A listening SMSC. Stops accepting when dropped.
pub struct MockSmsc {
    addr: String,
    task: JoinHandle<()>,
}

impl MockSmsc {
    /// Listen on an ephemeral port and call `handler(conn, pdu)` for every
    /// PDU received on any accepted connection.
    pub async fn start<H, Fut>(handler: H) -> MockSmsc
    where
        H: Fn(Arc<Connection>, Frame) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handler = Arc::new(handler);

        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                tokio::spawn(async move {
                    let (conn, mut reader) = Connection::from_stream(stream);
                    let conn = Arc::new(conn);
                    while let Ok(pdu) = reader.read_frame().await {
                        tokio::spawn(handler(conn.clone(), pdu));
                    }
                });
            }
        });

        MockSmsc { addr, task }
    }

    /// Like [`MockSmsc::start`], but the handler writes octets itself, so it
    /// can send PDUs no encoder would produce.
    pub async fn start_raw<H, Fut>(handler: H) -> MockSmsc
    where
        H: Fn(Wire, Frame) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handler = Arc::new(handler);

        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                tokio::spawn(async move {
                    let (mut reader, writer) = stream.into_split();
                    let wire = Wire(Arc::new(Mutex::new(writer)));
                    loop {
                        let mut length = [0u8; 4];
                        if reader.read_exact(&mut length).await.is_err() {
                            break;
                        }
                        let mut bytes = length.to_vec();
                        bytes.resize(u32::from_be_bytes(length) as usize, 0);
                        if reader.read_exact(&mut bytes[4..]).await.is_err() {
                            break;
                        }
                        let pdu = Frame::decode(&bytes).unwrap();
                        tokio::spawn(handler(wire.clone(), pdu));
                    }
                });
            }
        });

        MockSmsc { addr, task }
    }

    /// An SMSC answering every request with [`respond`]
    pub async fn echo() -> MockSmsc {
        Self::start(echo).await
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Drop for MockSmsc {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The canned successful response to a request. Message ids are "foobar";
/// query_sm reports the queried id as DELIVERED.
pub fn respond(pdu: &Frame) -> Option<Frame> {
    let seq = pdu.sequence_number();
    let resp = match pdu {
        Frame::BindTransmitter(_) => {
            Frame::BindTransmitterResp(BindTransmitterResponse::new(seq, "mock"))
        }
        Frame::BindReceiver(_) => Frame::BindReceiverResp(BindReceiverResponse::new(seq, "mock")),
        Frame::BindTransceiver(_) => {
            Frame::BindTransceiverResp(BindTransceiverResponse::new(seq, "mock"))
        }
        Frame::SubmitSm(_) => Frame::SubmitSmResp(SubmitSmResponse::new(seq, "foobar")),
        Frame::SubmitMulti(_) => {
            Frame::SubmitMultiResp(SubmitMultiResponse::new(seq, "foobar", Vec::new()))
        }
        Frame::QuerySm(query) => Frame::QuerySmResp(QuerySmResponse::new(
            seq,
            query.message_id.clone(),
            MessageState::Delivered,
        )),
        Frame::EnquireLink(_) => Frame::EnquireLinkResp(EnquireLinkResponse::new(seq)),
        Frame::Unbind(_) => Frame::UnbindResp(UnbindResponse::new(seq)),
        _ => return None,
    };
    Some(resp)
}

/// Handler writing [`respond`]'s answer, if any
pub async fn echo(conn: Arc<Connection>, pdu: Frame) {
    if let Some(resp) = respond(&pdu) {
        let _ = conn.write_frame(&resp).await;
    }
}

/// Transceiver config for `addr` with keep-alive off
pub fn config(addr: &str) -> SessionConfig {
    SessionConfig::new(addr, BindCredentials::transceiver("client", "secret"))
        .with_keep_alive(KeepAliveConfig::disabled())
        .with_response_timeout(Duration::from_secs(1))
}

/// Write half of a raw mock connection
#[derive(Clone)]
pub struct Wire(Arc<Mutex<OwnedWriteHalf>>);

impl Wire {
    pub async fn send(&self, bytes: &[u8]) {
        let _ = self.0.lock().await.write_all(bytes).await;
    }

    pub async fn send_frame(&self, frame: &Frame) {
        self.send(&frame.to_bytes().unwrap()).await;
    }
}

/// A 16 octet header announcing `length` octets in total
pub fn header(length: u32, command_id: u32, sequence_number: u32) -> Vec<u8> {
    [length, command_id, 0, sequence_number]
        .iter()
        .flat_map(|field| field.to_be_bytes())
        .collect()
}
