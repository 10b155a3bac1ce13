// ABOUTME: Window manager correlating outbound requests with their responses by sequence number
// ABOUTME: Bounds in-flight requests, times out unanswered ones and cancels everything on shutdown

use crate::client::{SmppError, SmppResult};
use crate::codec::Frame;
use crate::connection::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::time::Instant;
use tracing::{debug, info};

type Waiter = oneshot::Sender<SmppResult<Frame>>;

/// Tracks every request awaiting a response on one connection.
///
/// The slot table and sequence counter sit behind one lock that is held for
/// lookup, insert and remove only. Callers wait on their own oneshot outside
/// the lock.
pub struct Window {
    capacity: usize,
    connection: Arc<Connection>,
    state: Mutex<WindowState>,
    released: Notify,
}

struct WindowState {
    next_sequence: u32,
    pending: HashMap<u32, Waiter>,
    closed: bool,
}

impl WindowState {
    /// Next sequence number not held by a pending slot. 0 and 0xFFFFFFFF are
    /// never handed out.
    fn allocate(&mut self) -> u32 {
        loop {
            let candidate = self.next_sequence;
            self.next_sequence = match candidate.wrapping_add(1) {
                0 | u32::MAX => 1,
                next => next,
            };
            if candidate != 0 && candidate != u32::MAX && !self.pending.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

/// Removes the slot when the waiting caller finishes, times out or is dropped.
struct SlotGuard<'a> {
    window: &'a Window,
    sequence_number: u32,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.window.state().pending.remove(&self.sequence_number);
        self.window.released.notify_waiters();
    }
}

/// An admitted request: its sequence number is reserved until this drops.
struct Slot<'a> {
    guard: SlotGuard<'a>,
    response: oneshot::Receiver<SmppResult<Frame>>,
}

impl Window {
    pub fn new(connection: Arc<Connection>, capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            connection,
            state: Mutex::new(WindowState {
                next_sequence: 1,
                pending: HashMap::new(),
                closed: false,
            }),
            released: Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send `frame` and wait for the response carrying its sequence number.
    ///
    /// Fails with `MaxWindowSize` without touching the network when every
    /// slot is taken. The deadline covers both the write and the wait; on
    /// expiry the slot is released and the connection stays open.
    pub async fn submit(&self, frame: Frame, timeout: Duration) -> SmppResult<Frame> {
        let slot = self.admit(&frame)?;
        self.exchange(slot, frame, timeout).await
    }

    /// Like [`Window::submit`], but waits for a free slot instead of failing
    /// with `MaxWindowSize`. The deadline covers the wait for a slot as well.
    pub async fn submit_queued(&self, frame: Frame, timeout: Duration) -> SmppResult<Frame> {
        let deadline = Instant::now() + timeout;
        let slot = loop {
            // Registered before the check so a release in between is not missed
            let released = self.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            match self.admit(&frame) {
                Err(SmppError::MaxWindowSize) => {}
                admitted => break admitted?,
            }
            if tokio::time::timeout_at(deadline, released).await.is_err() {
                debug!(command_id = ?frame.command_id(), ?timeout, "no free slot before deadline");
                return Err(SmppError::Timeout);
            }
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        self.exchange(slot, frame, remaining).await
    }

    fn admit(&self, frame: &Frame) -> SmppResult<Slot<'_>> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state();
        if state.closed {
            return Err(SmppError::NotConnected);
        }
        if state.pending.len() >= self.capacity {
            debug!(
                command_id = ?frame.command_id(),
                capacity = self.capacity,
                "window full"
            );
            return Err(SmppError::MaxWindowSize);
        }
        let sequence_number = state.allocate();
        state.pending.insert(sequence_number, tx);
        Ok(Slot {
            guard: SlotGuard {
                window: self,
                sequence_number,
            },
            response: rx,
        })
    }

    async fn exchange(&self, slot: Slot<'_>, mut frame: Frame, timeout: Duration) -> SmppResult<Frame> {
        let Slot { guard, response } = slot;
        let sequence_number = guard.sequence_number;

        frame.set_sequence_number(sequence_number);
        debug!(command_id = ?frame.command_id(), sequence_number, "sending request");

        let exchange = async {
            self.connection.write_frame(&frame).await?;
            // The sender is dropped without a value only if the slot was
            // removed by someone other than dispatch or shutdown
            response.await.unwrap_or(Err(SmppError::NotConnected))
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                debug!(sequence_number, ?timeout, "request timed out");
                Err(SmppError::Timeout)
            }
        }
    }

    /// Send `frame` without registering a slot, e.g. a response to a peer
    /// request. Keeps the sequence number already on the frame.
    pub async fn reply(&self, frame: Frame) -> SmppResult<()> {
        if self.is_closed() {
            return Err(SmppError::NotConnected);
        }
        self.connection.write_frame(&frame).await?;
        Ok(())
    }

    /// Route an inbound frame to the caller waiting on its sequence number.
    ///
    /// Returns the frame when nobody is waiting for it: every request from
    /// the peer, and responses whose slot is gone (late or unknown).
    pub fn dispatch(&self, frame: Frame) -> Option<Frame> {
        if !frame.is_response() {
            return Some(frame);
        }

        let sequence_number = frame.sequence_number();
        let waiter = self.state().pending.remove(&sequence_number);
        match waiter {
            Some(waiter) => {
                // The caller may have given up between removal and send
                let _ = waiter.send(Ok(frame));
                None
            }
            None => {
                info!(
                    sequence_number,
                    command_id = ?frame.command_id(),
                    "response with no pending request, possibly after timeout"
                );
                Some(frame)
            }
        }
    }

    /// Resolve the slot for `sequence_number` with `error`. Returns false
    /// when no such slot exists.
    pub fn fail(&self, sequence_number: u32, error: SmppError) -> bool {
        let waiter = self.state().pending.remove(&sequence_number);
        match waiter {
            Some(waiter) => {
                let _ = waiter.send(Err(error));
                true
            }
            None => false,
        }
    }

    /// Cancel every pending slot with `NotConnected` and refuse new
    /// submissions. Idempotent.
    pub fn shutdown(&self) {
        let drained: Vec<Waiter> = {
            let mut state = self.state();
            state.closed = true;
            state.pending.drain().map(|(_, waiter)| waiter).collect()
        };
        if !drained.is_empty() {
            debug!(cancelled = drained.len(), "window shut down");
        }
        for waiter in drained {
            let _ = waiter.send(Err(SmppError::NotConnected));
        }
        self.released.notify_waiters();
    }

    /// Number of requests currently awaiting a response
    pub fn pending(&self) -> usize {
        self.state().pending.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::FrameReader;
    use crate::datatypes::{
        CommandStatus, DeliverSm, EnquireLink, EnquireLinkResponse, MessageParams,
    };
    use tokio::sync::mpsc;

    /// A window whose peer forwards every frame it reads to the test.
    fn window(capacity: usize) -> (Arc<Window>, mpsc::UnboundedReceiver<Frame>) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (connection, _) = Connection::from_stream(client);
        let (_peer_writer, reader) = Connection::from_stream(server);
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(forward(reader, tx, _peer_writer));
        (Arc::new(Window::new(Arc::new(connection), capacity)), rx)
    }

    async fn forward(mut reader: FrameReader, tx: mpsc::UnboundedSender<Frame>, _w: Connection) {
        while let Ok(frame) = reader.read_frame().await {
            if tx.send(frame).is_err() {
                break;
            }
        }
    }

    fn enquire_link() -> Frame {
        Frame::EnquireLink(EnquireLink::new(0))
    }

    fn resp(sequence_number: u32) -> Frame {
        Frame::EnquireLinkResp(EnquireLinkResponse::new(sequence_number))
    }

    #[tokio::test]
    async fn response_resolves_matching_caller() {
        let (window, mut peer) = window(10);
        let caller = {
            let window = window.clone();
            tokio::spawn(async move { window.submit(enquire_link(), Duration::from_secs(1)).await })
        };

        let sent = peer.recv().await.unwrap();
        assert_eq!(sent.sequence_number(), 1);
        assert!(window.dispatch(resp(1)).is_none());

        let frame = caller.await.unwrap().unwrap();
        assert_eq!(frame.sequence_number(), 1);
        assert_eq!(window.pending(), 0);
    }

    #[tokio::test]
    async fn responses_fan_in_out_of_order() {
        let (window, mut peer) = window(10);
        let mut callers = Vec::new();
        for _ in 0..3 {
            let window = window.clone();
            callers.push(tokio::spawn(async move {
                window.submit(enquire_link(), Duration::from_secs(1)).await
            }));
        }

        let mut seqs = Vec::new();
        for _ in 0..3 {
            seqs.push(peer.recv().await.unwrap().sequence_number());
        }
        for seq in seqs.iter().rev() {
            window.dispatch(resp(*seq));
        }

        let mut got = Vec::new();
        for caller in callers {
            got.push(caller.await.unwrap().unwrap().sequence_number());
        }
        got.sort();
        seqs.sort();
        assert_eq!(got, seqs);
    }

    #[tokio::test]
    async fn full_window_rejects_without_sending() {
        let (window, mut peer) = window(1);
        let first = {
            let window = window.clone();
            tokio::spawn(async move { window.submit(enquire_link(), Duration::from_secs(1)).await })
        };
        let sent = peer.recv().await.unwrap();

        let second = window.submit(enquire_link(), Duration::from_secs(1)).await;
        assert!(matches!(second, Err(SmppError::MaxWindowSize)));

        window.dispatch(resp(sent.sequence_number()));
        first.await.unwrap().unwrap();
        assert!(peer.try_recv().is_err());
    }

    #[tokio::test]
    async fn queued_submission_waits_for_a_free_slot() {
        let (window, mut peer) = window(1);
        let first = {
            let window = window.clone();
            tokio::spawn(async move { window.submit(enquire_link(), Duration::from_secs(1)).await })
        };
        let first_seq = peer.recv().await.unwrap().sequence_number();

        let queued = {
            let window = window.clone();
            tokio::spawn(async move {
                window
                    .submit_queued(enquire_link(), Duration::from_secs(1))
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert!(peer.try_recv().is_err());

        window.dispatch(resp(first_seq));
        first.await.unwrap().unwrap();

        let queued_seq = peer.recv().await.unwrap().sequence_number();
        window.dispatch(resp(queued_seq));
        assert_eq!(queued.await.unwrap().unwrap().sequence_number(), queued_seq);
    }

    #[tokio::test]
    async fn queued_submission_times_out_when_no_slot_frees() {
        let (window, mut peer) = window(1);
        let _held = {
            let window = window.clone();
            tokio::spawn(async move { window.submit(enquire_link(), Duration::from_secs(5)).await })
        };
        peer.recv().await.unwrap();

        let result = window
            .submit_queued(enquire_link(), Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(SmppError::Timeout)));
        assert!(peer.try_recv().is_err());
        assert_eq!(window.pending(), 1);
    }

    #[tokio::test]
    async fn queued_submission_fails_once_shut_down() {
        let (window, mut peer) = window(1);
        let _held = {
            let window = window.clone();
            tokio::spawn(async move { window.submit(enquire_link(), Duration::from_secs(5)).await })
        };
        peer.recv().await.unwrap();

        let queued = {
            let window = window.clone();
            tokio::spawn(async move {
                window
                    .submit_queued(enquire_link(), Duration::from_secs(5))
                    .await
            })
        };
        tokio::task::yield_now().await;
        window.shutdown();
        assert!(matches!(queued.await.unwrap(), Err(SmppError::NotConnected)));
    }

    #[tokio::test]
    async fn timeout_releases_slot_and_late_response_is_unsolicited() {
        let (window, mut peer) = window(1);
        let result = window
            .submit(enquire_link(), Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(SmppError::Timeout)));
        assert_eq!(window.pending(), 0);

        let late = peer.recv().await.unwrap().sequence_number();
        assert!(window.dispatch(resp(late)).is_some());

        // The slot is free again
        let again = {
            let window = window.clone();
            tokio::spawn(async move { window.submit(enquire_link(), Duration::from_secs(1)).await })
        };
        let seq = peer.recv().await.unwrap().sequence_number();
        assert_ne!(seq, late);
        window.dispatch(resp(seq));
        again.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn dropped_caller_releases_slot() {
        let (window, mut peer) = window(1);
        let caller = {
            let window = window.clone();
            tokio::spawn(async move { window.submit(enquire_link(), Duration::from_secs(5)).await })
        };
        peer.recv().await.unwrap();
        assert_eq!(window.pending(), 1);

        caller.abort();
        let _ = caller.await;
        assert_eq!(window.pending(), 0);
    }

    #[tokio::test]
    async fn requests_from_peer_never_match_slots() {
        let (window, mut peer) = window(10);
        let caller = {
            let window = window.clone();
            tokio::spawn(async move { window.submit(enquire_link(), Duration::from_secs(1)).await })
        };
        let seq = peer.recv().await.unwrap().sequence_number();

        let mut deliver = DeliverSm::new("a".into(), "b".into(), MessageParams::default());
        deliver.sequence_number = seq;
        let unsolicited = window.dispatch(Frame::DeliverSm(Box::new(deliver)));
        assert!(matches!(unsolicited, Some(Frame::DeliverSm(_))));
        assert_eq!(window.pending(), 1);

        window.dispatch(resp(seq));
        caller.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn fail_resolves_slot_with_error() {
        let (window, mut peer) = window(10);
        let caller = {
            let window = window.clone();
            tokio::spawn(async move { window.submit(enquire_link(), Duration::from_secs(1)).await })
        };
        let seq = peer.recv().await.unwrap().sequence_number();

        assert!(window.fail(seq, SmppError::Protocol(CommandStatus::SystemError)));
        assert!(!window.fail(seq, SmppError::Timeout));
        assert!(matches!(
            caller.await.unwrap(),
            Err(SmppError::Protocol(CommandStatus::SystemError))
        ));
    }

    #[tokio::test]
    async fn shutdown_cancels_pending_and_is_idempotent() {
        let (window, mut peer) = window(10);
        let mut callers = Vec::new();
        for _ in 0..2 {
            let window = window.clone();
            callers.push(tokio::spawn(async move {
                window.submit(enquire_link(), Duration::from_secs(5)).await
            }));
        }
        peer.recv().await.unwrap();
        peer.recv().await.unwrap();

        window.shutdown();
        window.shutdown();

        for caller in callers {
            assert!(matches!(caller.await.unwrap(), Err(SmppError::NotConnected)));
        }
        assert!(matches!(
            window.submit(enquire_link(), Duration::from_secs(1)).await,
            Err(SmppError::NotConnected)
        ));
        assert!(peer.try_recv().is_err());
    }

    #[test]
    fn sequence_numbers_skip_reserved_and_in_use() {
        let mut state = WindowState {
            next_sequence: u32::MAX - 1,
            pending: HashMap::new(),
            closed: false,
        };
        assert_eq!(state.allocate(), u32::MAX - 1);
        assert_eq!(state.allocate(), 1);

        let (tx, _rx) = oneshot::channel();
        state.pending.insert(2, tx);
        assert_eq!(state.allocate(), 3);
    }
}
