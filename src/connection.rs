// ABOUTME: Provides TCP connection management for SMPP v3.4 protocol communication
// ABOUTME: Splits a stream into a buffered FrameReader and a shareable, flush-per-frame writer

use crate::codec::{CodecError, Frame, PduHeader};
use crate::frame;
use bytes::{Buf, BytesMut};
use std::future::Future;
use std::io::{self, Cursor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, trace};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Errors surfaced by the transport layer.
///
/// Everything except `Decode` means the byte stream is unusable and the
/// session has to end. A `Decode` error consumed exactly one frame and
/// framing is intact.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection closed")]
    Closed,

    #[error("connection reset by peer in the middle of a frame")]
    Reset,

    #[error("invalid command_length {0}, framing lost")]
    InvalidLength(u32),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The frame could not be encoded; nothing was written
    #[error("failed to encode frame: {0}")]
    Encode(#[source] CodecError),

    /// A complete frame arrived but its body did not decode. `header` is set
    /// when the 16 header octets themselves were readable.
    #[error("failed to decode frame: {source}")]
    Decode {
        header: Option<PduHeader>,
        #[source]
        source: CodecError,
    },
}

impl ConnectionError {
    /// True when the stream can no longer be used
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ConnectionError::Decode { .. } | ConnectionError::Encode(_)
        )
    }
}

/// Read half of an SMPP connection.
///
/// Buffers incoming octets and hands out one decoded frame at a time. Any
/// data remaining after a frame is kept for the next call.
pub struct FrameReader {
    stream: BoxedReader,

    // The buffer for reading frames.
    buffer: BytesMut,
}

impl FrameReader {
    fn new(stream: BoxedReader) -> Self {
        Self {
            stream,
            // 4KB holds most SMPP traffic; long messages grow the buffer
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read a single `Frame` from the underlying stream.
    ///
    /// A clean end of stream between frames is `ConnectionError::Closed`;
    /// end of stream inside a frame is `ConnectionError::Reset`.
    pub async fn read_frame(&mut self) -> Result<Frame, ConnectionError> {
        loop {
            if let Some(frame) = self.parse_frame()? {
                return Ok(frame);
            }

            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                return Err(if self.buffer.is_empty() {
                    ConnectionError::Closed
                } else {
                    ConnectionError::Reset
                });
            }
        }
    }

    /// Tries to take one frame from the buffer. `Ok(None)` means more data is
    /// needed.
    fn parse_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        let len = match frame::check(&self.buffer) {
            Ok(len) => len,
            Err(frame::Error::Incomplete) => return Ok(None),
            Err(frame::Error::InvalidLength(length)) => {
                return Err(ConnectionError::InvalidLength(length));
            }
        };

        // The frame is consumed whether or not it decodes
        let bytes = self.buffer.split_to(len).freeze();
        trace!(len, "frame received");

        match Frame::decode(&bytes) {
            Ok(frame) => Ok(Some(frame)),
            Err(source) => {
                let header = PduHeader::decode(&mut Cursor::new(&bytes[..])).ok();
                Err(ConnectionError::Decode { header, source })
            }
        }
    }

    /// Reads frames until the stream becomes unusable, handing each frame,
    /// or each non-fatal decode failure, to `on_frame` in arrival order.
    ///
    /// Returns the error that ended the loop. It is returned exactly once;
    /// the reader should be dropped afterwards.
    pub async fn receive_loop<F, Fut>(&mut self, mut on_frame: F) -> ConnectionError
    where
        F: FnMut(Result<Frame, ConnectionError>) -> Fut,
        Fut: Future<Output = ()>,
    {
        loop {
            match self.read_frame().await {
                Ok(frame) => on_frame(Ok(frame)).await,
                Err(e) if !e.is_fatal() => on_frame(Err(e)).await,
                Err(e) => return e,
            }
        }
    }

    /// Octets buffered but not yet returned as frames
    pub fn buffered(&self) -> usize {
        self.buffer.remaining()
    }
}

/// Write half of an SMPP connection.
///
/// Shared between every task that sends PDUs. Writes are serialised and each
/// frame is flushed before the lock is released, so frames never interleave.
pub struct Connection {
    writer: Mutex<BufWriter<BoxedWriter>>,
    closed: AtomicBool,
}

impl Connection {
    /// Dial `addr`, failing if the TCP handshake takes longer than
    /// `connect_timeout`.
    pub async fn dial(
        addr: &str,
        connect_timeout: Duration,
    ) -> Result<(Connection, FrameReader), ConnectionError> {
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {addr} timed out after {connect_timeout:?}"),
                )
            })??;
        stream.set_nodelay(true)?;
        debug!(addr, "tcp connection established");
        Ok(Self::from_stream(stream))
    }

    /// Wrap any byte stream, e.g. an in-memory duplex in tests.
    pub fn from_stream<S>(stream: S) -> (Connection, FrameReader)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let writer: BoxedWriter = Box::new(write_half);
        let connection = Connection {
            writer: Mutex::new(BufWriter::new(writer)),
            closed: AtomicBool::new(false),
        };
        (connection, FrameReader::new(Box::new(read_half)))
    }

    /// Encode and write one frame, then flush it to the socket.
    pub async fn write_frame(&self, frame: &Frame) -> Result<(), ConnectionError> {
        let bytes = frame.to_bytes().map_err(ConnectionError::Encode)?;

        let mut writer = self.writer.lock().await;
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }
        writer.write_all(&bytes).await?;
        writer.flush().await?;
        trace!(
            command_id = ?frame.command_id(),
            sequence_number = frame.sequence_number(),
            len = bytes.len(),
            "frame sent"
        );
        Ok(())
    }

    /// Shut down the write side. Later writes fail with `Closed`. Safe to
    /// call more than once.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            debug!(error = %e, "error shutting down connection");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
