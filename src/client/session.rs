// ABOUTME: SMPP session engine driving bind, keep-alive, inbound PDUs and submissions over one window
// ABOUTME: One read-loop task owns the socket read half; callers wait on their own window slot

use crate::client::builder::SessionConfig;
use crate::client::error::{SmppError, SmppResult};
use crate::client::keepalive::KeepAliveManager;
use crate::client::types::{
    BindType, ConnectionEvent, ConnectionStatus, QueryResult, ShortMessage, SubmitResult,
};
use crate::codec::{CodecError, Frame};
use crate::connection::{Connection, ConnectionError, FrameReader};
use crate::datatypes::{
    Address, BindReceiver, BindTransceiver, BindTransmitter, CommandId, CommandStatus,
    DeliverSmResponse, EnquireLink, EnquireLinkResponse, GenericNack, NumericPlanIndicator,
    QuerySm, SubmitMulti, SubmitSm, TypeOfNumber, Unbind, UnbindResponse, ESM_CLASS_UDHI,
};
use crate::window::Window;
use bytes::Bytes;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

/// A client session with one SMSC.
///
/// Cloning is cheap and every clone drives the same session. The background
/// tasks stop when [`Session::close`] is called or the last clone is dropped.
///
/// ```rust,no_run
/// use smpp_session::client::{BindCredentials, Session, SessionConfig, ShortMessage};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SessionConfig::new(
///     "localhost:2775",
///     BindCredentials::transmitter("system_id", "password"),
/// );
/// let session = Session::new(config);
///
/// let event = session.bind().wait().await;
/// if let Some(error) = event.error {
///     return Err(error.to_string().into());
/// }
///
/// let result = session
///     .submit(&ShortMessage::new("1234", "5678", "Hello, World!"))
///     .await?;
/// println!("message id: {}", result.resp_id());
///
/// session.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
    _guard: Arc<DropGuard>,
}

struct Inner {
    config: SessionConfig,
    status: watch::Sender<ConnectionEvent>,
    connection: OnceLock<Arc<Connection>>,
    window: OnceLock<Arc<Window>>,
    cancel: CancellationToken,
    started: AtomicBool,
    closing: AtomicBool,
    reference: AtomicU16,
}

/// Observes the outcome of [`Session::bind`] and later status changes.
pub struct BindHandle {
    events: watch::Receiver<ConnectionEvent>,
}

impl BindHandle {
    /// Wait until the handshake has concluded, successfully or not.
    ///
    /// Returns immediately when it already has. Safe to call repeatedly.
    pub async fn wait(&mut self) -> ConnectionEvent {
        let concluded = |event: &ConnectionEvent| {
            !matches!(
                event.status,
                ConnectionStatus::Unbound | ConnectionStatus::Connecting
            )
        };
        if let Ok(event) = self.events.wait_for(concluded).await {
            return event.clone();
        }
        self.events.borrow().clone()
    }

    /// The latest event
    pub fn status(&self) -> ConnectionEvent {
        self.events.borrow().clone()
    }

    /// Wait for the next transition. `None` once the session is gone.
    pub async fn changed(&mut self) -> Option<ConnectionEvent> {
        self.events.changed().await.ok()?;
        Some(self.events.borrow_and_update().clone())
    }
}

impl Session {
    /// Create a session. Nothing touches the network until [`Session::bind`].
    pub fn new(config: SessionConfig) -> Self {
        let (status, _) = watch::channel(ConnectionEvent::new(ConnectionStatus::Unbound));
        let cancel = CancellationToken::new();
        let guard = cancel.clone().drop_guard();
        Self {
            inner: Arc::new(Inner {
                config,
                status,
                connection: OnceLock::new(),
                window: OnceLock::new(),
                cancel,
                started: AtomicBool::new(false),
                closing: AtomicBool::new(false),
                reference: AtomicU16::new(1),
            }),
            _guard: Arc::new(guard),
        }
    }

    /// Start the connect and bind handshake in the background.
    ///
    /// Calling this again returns a handle on the same session state and
    /// never dials twice. Must be called from within a Tokio runtime.
    pub fn bind(&self) -> BindHandle {
        let handle = BindHandle {
            events: self.inner.status.subscribe(),
        };
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return handle;
        }
        if self
            .inner
            .advance(ConnectionEvent::new(ConnectionStatus::Connecting))
        {
            tokio::spawn(self.inner.clone().run());
        }
        handle
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.status.borrow().status
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Requests currently awaiting a response
    pub fn pending(&self) -> usize {
        self.inner.window.get().map_or(0, |window| window.pending())
    }

    /// Submit one message as submit_sm, or as submit_multi when it carries a
    /// destination list or distribution lists.
    ///
    /// The text must fit a single PDU; use [`Session::submit_long`] for
    /// bodies that need segmenting.
    pub async fn submit(&self, sm: &ShortMessage) -> SmppResult<SubmitResult> {
        self.submit_with_timeout(sm, self.inner.config.response_timeout)
            .await
    }

    /// [`Session::submit`] with its own deadline in place of the session's
    /// response timeout. The deadline bounds the rate limiter wait and the
    /// response wait.
    pub async fn submit_with_timeout(
        &self,
        sm: &ShortMessage,
        timeout: Duration,
    ) -> SmppResult<SubmitResult> {
        self.submit_part(sm, sm.text.encode(), sm.esm_class, timeout, Admission::Immediate)
            .await
    }

    /// Submit a message of any length, split into concatenated parts when it
    /// does not fit one PDU.
    ///
    /// Parts are submitted concurrently, never more at once than the window
    /// size, and results come back in part order. A part that finds the
    /// window full waits for a slot within its deadline. The first failure
    /// is returned; parts already accepted by the SMSC are not recalled.
    pub async fn submit_long(&self, sm: &ShortMessage) -> SmppResult<Vec<SubmitResult>> {
        self.submit_long_with_timeout(sm, self.inner.config.response_timeout)
            .await
    }

    /// [`Session::submit_long`] with a deadline per part
    pub async fn submit_long_with_timeout(
        &self,
        sm: &ShortMessage,
        timeout: Duration,
    ) -> SmppResult<Vec<SubmitResult>> {
        let window = self.inner.ready()?;

        let reference = self.inner.next_reference();
        let mut parts = sm
            .text
            .split(reference)
            .map_err(|e| SmppError::InvalidData(e.to_string()))?;

        if parts.len() == 1 {
            let part = parts.remove(0);
            let result = self
                .submit_part(sm, part, sm.esm_class, timeout, Admission::Immediate)
                .await?;
            return Ok(vec![result]);
        }

        let count = parts.len();
        debug!(parts = count, reference, "submitting segmented message");

        let esm_class = sm.esm_class | ESM_CLASS_UDHI;
        let sm = Arc::new(sm.clone());
        let permits = Arc::new(Semaphore::new(window.capacity()));
        let mut tasks = JoinSet::new();
        for (index, part) in parts.into_iter().enumerate() {
            let session = self.clone();
            let sm = sm.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| SmppError::NotConnected)?;
                let result = session
                    .submit_part(&sm, part, esm_class, timeout, Admission::Queued)
                    .await?;
                Ok::<_, SmppError>((index, result))
            });
        }

        let mut results: Vec<Option<SubmitResult>> = vec![None; count];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((index, result))) => results[index] = Some(result),
                Ok(Err(e)) => {
                    warn!(error = %e, reference, "segment failed, abandoning remaining parts");
                    return Err(e);
                }
                Err(e) => {
                    return Err(SmppError::InvalidState(format!("segment task failed: {e}")));
                }
            }
        }
        Ok(results.into_iter().flatten().collect())
    }

    /// Ask the SMSC for the state of a message it accepted earlier.
    pub async fn query(
        &self,
        source: &str,
        message_id: &str,
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
    ) -> SmppResult<QueryResult> {
        let pdu = QuerySm::new(message_id, Address::new(ton, npi, source));
        let timeout = self.inner.config.response_timeout;
        match self
            .inner
            .request(Frame::QuerySm(pdu), CommandId::QuerySmResp, timeout, Admission::Immediate)
            .await?
        {
            Frame::QuerySmResp(resp) => Ok(QueryResult {
                state: resp.state_name(),
                message_id: resp.message_id,
                final_date: resp.final_date,
                error_code: resp.error_code,
            }),
            other => Err(SmppError::UnexpectedPdu {
                expected: CommandId::QuerySmResp,
                actual: other.command_id(),
            }),
        }
    }

    /// Unbind and tear the session down.
    ///
    /// Pending requests fail with `NotConnected`. Safe to call more than
    /// once and while submissions are in flight.
    pub async fn close(&self) {
        let first = !self.inner.closing.swap(true, Ordering::SeqCst);
        if first && self.status() == ConnectionStatus::Connected {
            if let Some(window) = self.inner.window.get() {
                let unbind = Frame::Unbind(Unbind::new(0));
                match window.submit(unbind, self.inner.config.response_timeout).await {
                    Ok(_) => debug!("unbind acknowledged"),
                    Err(e) => debug!(error = %e, "unbind not acknowledged"),
                }
            }
        }
        self.inner.teardown(None).await;
    }

    async fn submit_part(
        &self,
        sm: &ShortMessage,
        short_message: Bytes,
        esm_class: u8,
        timeout: Duration,
        admission: Admission,
    ) -> SmppResult<SubmitResult> {
        let params = sm.params(short_message, esm_class);
        let (frame, expected) = if sm.is_multi() {
            let mut pdu = SubmitMulti::new(sm.source(), sm.destinations(), params);
            pdu.service_type = sm.service_type.clone();
            (Frame::SubmitMulti(Box::new(pdu)), CommandId::SubmitMultiResp)
        } else {
            let mut pdu = SubmitSm::new(sm.source(), sm.destination(), params);
            pdu.service_type = sm.service_type.clone();
            (Frame::SubmitSm(Box::new(pdu)), CommandId::SubmitSmResp)
        };

        let resp = self
            .inner
            .request(frame, expected, timeout, admission)
            .await?;
        Ok(SubmitResult::new(resp))
    }
}

impl Inner {
    /// Move to `event` unless the session is already there or has ended.
    fn advance(&self, event: ConnectionEvent) -> bool {
        self.status.send_if_modified(|current| {
            if current.status == ConnectionStatus::Disconnected || current.status == event.status
            {
                return false;
            }
            debug!(from = %current.status, to = %event.status, "session status changed");
            *current = event;
            true
        })
    }

    fn next_reference(&self) -> u16 {
        self.reference.fetch_add(1, Ordering::Relaxed)
    }

    /// The window, if this session may submit right now
    fn ready(&self) -> SmppResult<Arc<Window>> {
        if self.status.borrow().status != ConnectionStatus::Connected {
            return Err(SmppError::NotConnected);
        }
        let bind_type = self.config.credentials.bind_type;
        if !bind_type.can_transmit() {
            return Err(SmppError::InvalidState(format!(
                "{bind_type:?} session cannot submit or query"
            )));
        }
        self.window.get().cloned().ok_or(SmppError::NotConnected)
    }

    /// One request/response exchange on a bound session. `timeout` bounds
    /// the rate limiter wait and, separately, the exchange itself.
    async fn request(
        &self,
        frame: Frame,
        expected: CommandId,
        timeout: Duration,
        admission: Admission,
    ) -> SmppResult<Frame> {
        let window = self.ready()?;

        if let Some(limiter) = &self.config.rate_limiter {
            tokio::time::timeout(timeout, limiter.wait(1))
                .await
                .map_err(|_| SmppError::Timeout)??;
        }

        let exchanged = match admission {
            Admission::Immediate => window.submit(frame, timeout).await,
            Admission::Queued => window.submit_queued(frame, timeout).await,
        };
        match exchanged {
            Ok(resp) => expect(resp, expected),
            Err(SmppError::Transport(e)) => {
                error!(error = %e, "write failed, closing session");
                let cause = SmppError::Transport(io::Error::new(e.kind(), e.to_string()));
                self.teardown(Some(cause)).await;
                Err(SmppError::Transport(e))
            }
            Err(e) => Err(e),
        }
    }

    async fn run(self: Arc<Self>) {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SmppError::NotConnected),
            outcome = self.handshake() => outcome,
        };

        match outcome {
            Ok(window) => {
                if !self.advance(ConnectionEvent::new(ConnectionStatus::Connected)) {
                    // Closed while the bind response was in flight
                    self.teardown(None).await;
                    return;
                }
                if self.config.keep_alive.enabled {
                    tokio::spawn(self.clone().keep_alive(window));
                }
            }
            Err(e) => {
                warn!(addr = %self.config.addr, error = %e, "bind failed");
                self.teardown(Some(e)).await;
            }
        }
    }

    async fn handshake(self: &Arc<Self>) -> SmppResult<Arc<Window>> {
        let (connection, reader) =
            Connection::dial(&self.config.addr, self.config.connect_timeout).await?;
        let connection = Arc::new(connection);
        let window = Arc::new(Window::new(connection.clone(), self.config.window_size));
        let _ = self.connection.set(connection.clone());
        let _ = self.window.set(window.clone());
        if self.cancel.is_cancelled() {
            // teardown may have run before either was set
            window.shutdown();
            connection.shutdown().await;
            return Err(SmppError::NotConnected);
        }

        tokio::spawn(self.clone().read_loop(reader, window.clone()));

        let credentials = &self.config.credentials;
        let body = credentials.bind_body();
        let (frame, expected) = match credentials.bind_type {
            BindType::Transmitter => (
                Frame::BindTransmitter(BindTransmitter::new(0, body)),
                CommandId::BindTransmitterResp,
            ),
            BindType::Receiver => (
                Frame::BindReceiver(BindReceiver::new(0, body)),
                CommandId::BindReceiverResp,
            ),
            BindType::Transceiver => (
                Frame::BindTransceiver(BindTransceiver::new(0, body)),
                CommandId::BindTransceiverResp,
            ),
        };

        let resp = expect(
            window.submit(frame, self.config.response_timeout).await?,
            expected,
        )?;
        let system_id = match &resp {
            Frame::BindTransmitterResp(resp) => resp.system_id.as_str(),
            Frame::BindReceiverResp(resp) => resp.system_id.as_str(),
            Frame::BindTransceiverResp(resp) => resp.system_id.as_str(),
            _ => "",
        };
        info!(
            addr = %self.config.addr,
            system_id,
            bind_type = ?credentials.bind_type,
            "session bound"
        );
        Ok(window)
    }

    async fn read_loop(self: Arc<Self>, mut reader: FrameReader, window: Arc<Window>) {
        let inner: &Inner = &self;
        let slots: &Window = &window;
        let end = tokio::select! {
            _ = self.cancel.cancelled() => return,
            end = reader.receive_loop(move |item| inner.on_inbound(slots, item)) => end,
        };

        match end {
            ConnectionError::Closed => info!("SMSC closed the connection"),
            ref e => error!(error = %e, "connection lost"),
        }
        self.teardown(Some(SmppError::from(end))).await;
    }

    async fn on_inbound(&self, window: &Window, item: Result<Frame, ConnectionError>) {
        let frame = match item {
            Ok(frame) => frame,
            Err(e) => return self.on_decode_error(window, e).await,
        };

        debug!(
            command_id = ?frame.command_id(),
            sequence_number = frame.sequence_number(),
            "PDU received"
        );

        let Some(frame) = window.dispatch(frame) else {
            return;
        };

        match frame {
            Frame::EnquireLink(req) => {
                let resp = EnquireLinkResponse::new(req.sequence_number);
                self.reply(window, Frame::EnquireLinkResp(resp)).await;
            }
            Frame::DeliverSm(deliver) => {
                let resp = DeliverSmResponse::new(deliver.sequence_number);
                self.reply(window, Frame::DeliverSmResp(resp)).await;
                self.deliver(Frame::DeliverSm(deliver));
            }
            Frame::Unbind(req) => {
                info!("SMSC requested unbind");
                let resp = UnbindResponse::new(req.sequence_number);
                self.reply(window, Frame::UnbindResp(resp)).await;
                self.teardown(None).await;
            }
            other => self.deliver(other),
        }
    }

    async fn on_decode_error(&self, window: &Window, error: ConnectionError) {
        match error {
            ConnectionError::Decode {
                header: Some(header),
                source,
            } => {
                warn!(
                    command_id = ?header.command_id,
                    sequence_number = header.sequence_number,
                    error = %source,
                    "undecodable PDU"
                );
                if header.command_id.is_response() {
                    window.fail(header.sequence_number, SmppError::Decode(source));
                } else {
                    let nack = GenericNack::error(header.sequence_number, source.to_command_status());
                    self.reply(window, Frame::GenericNack(nack)).await;
                }
            }
            ConnectionError::Decode {
                header: None,
                source:
                    CodecError::InvalidCommandId {
                        command_id,
                        sequence_number,
                    },
            } if command_id & 0x8000_0000 == 0 => {
                warn!(command_id, sequence_number, "unsupported request from SMSC");
                let nack = GenericNack::invalid_command_id(sequence_number);
                self.reply(window, Frame::GenericNack(nack)).await;
            }
            e => warn!(error = %e, "undecodable PDU dropped"),
        }
    }

    async fn reply(&self, window: &Window, frame: Frame) {
        let command_id = frame.command_id();
        if let Err(e) = window.reply(frame).await {
            warn!(?command_id, error = %e, "failed to send reply");
        }
    }

    fn deliver(&self, frame: Frame) {
        match &self.config.inbound_handler {
            Some(handler) => handler.handle(frame),
            None => debug!(
                command_id = ?frame.command_id(),
                sequence_number = frame.sequence_number(),
                "unsolicited PDU dropped, no inbound handler"
            ),
        }
    }

    async fn keep_alive(self: Arc<Self>, window: Arc<Window>) {
        let config = &self.config.keep_alive;
        let mut manager = KeepAliveManager::new(config);
        let mut ticker = tokio::time::interval_at(Instant::now() + config.interval, config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_error = None;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            manager.on_ping_sent();
            let ping = Frame::EnquireLink(EnquireLink::new(0));
            match window.submit(ping, config.timeout).await {
                Ok(Frame::EnquireLinkResp(_)) => manager.on_ping_success(),
                Ok(other) => {
                    warn!(command_id = ?other.command_id(), "unexpected answer to enquire_link");
                    manager.on_ping_failure();
                }
                // Traffic is flowing if the window is full
                Err(SmppError::MaxWindowSize) => continue,
                Err(SmppError::NotConnected) => return,
                Err(e) => {
                    manager.on_ping_failure();
                    last_error = Some(e);
                }
            }

            if manager.is_connection_failed() {
                error!(status = ?manager.status(), "keep-alive failed, closing session");
                self.teardown(Some(last_error.unwrap_or(SmppError::Timeout)))
                    .await;
                return;
            }
        }
    }

    /// End the session: publish `Disconnected`, cancel every slot and stop
    /// the background tasks. Idempotent.
    async fn teardown(&self, cause: Option<SmppError>) {
        let event = match cause {
            Some(e) => ConnectionEvent::failed(e),
            None => ConnectionEvent::new(ConnectionStatus::Disconnected),
        };
        self.advance(event);
        self.cancel.cancel();
        if let Some(window) = self.window.get() {
            window.shutdown();
        }
        if let Some(connection) = self.connection.get() {
            connection.shutdown().await;
        }
    }
}

/// How a request is admitted to a full window
#[derive(Debug, Clone, Copy)]
enum Admission {
    /// Fail with `MaxWindowSize`
    Immediate,
    /// Wait for a slot within the request deadline
    Queued,
}

/// Map a response to the caller's outcome: the SMSC status first, then the
/// response type.
fn expect(resp: Frame, expected: CommandId) -> SmppResult<Frame> {
    let status = resp.command_status();
    if status != CommandStatus::Ok {
        return Err(SmppError::Protocol(status));
    }
    if resp.command_id() != expected {
        return Err(SmppError::UnexpectedPdu {
            expected,
            actual: resp.command_id(),
        });
    }
    Ok(resp)
}
