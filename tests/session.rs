// ABOUTME: End-to-end session behaviour against the mock SMSC
// ABOUTME: Covers submission, windowing, segmentation, queries, inbound PDUs and teardown

mod support;

use smpp_session::client::{
    channel_handler, BindCredentials, ConnectionStatus, KeepAliveConfig, Session, ShortMessage,
    SmppError,
};
use smpp_session::connection::Connection;
use smpp_session::datatypes::{
    Address, BindTransceiverResponse, CommandId, CommandStatus, DeliverSm, MessageParams,
    NumericPlanIndicator, SubmitMultiResponse, TypeOfNumber, Unbind, UnsuccessSme,
};
use smpp_session::text::{parse_udh, Encoding, Text, UDH_LENGTH};
use smpp_session::Frame;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use support::{config, echo, header, respond, MockSmsc, Wire};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

async fn bound(session: &Session) {
    let event = session.bind().wait().await;
    assert_eq!(event.status, ConnectionStatus::Connected, "{:?}", event.error);
}

#[tokio::test]
async fn submit_returns_smsc_message_id() {
    let smsc = MockSmsc::echo().await;
    let session = Session::new(config(smsc.addr()));
    bound(&session).await;

    let result = session
        .submit(&ShortMessage::new("root", "foobar", "Lorem ipsum"))
        .await
        .unwrap();
    assert_eq!(result.resp_id(), "foobar");
    assert_eq!(result.resp().command_id(), CommandId::SubmitSmResp);
    assert_eq!(result.num_unsuccess(), None);

    session.close().await;
}

#[tokio::test]
async fn full_window_rejects_excess_submissions() {
    let smsc = MockSmsc::start(|conn: Arc<Connection>, pdu: Frame| async move {
        if pdu.command_id() == CommandId::SubmitSm {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        echo(conn, pdu).await;
    })
    .await;
    let session = Session::new(config(smsc.addr()).with_window_size(2));
    bound(&session).await;

    let sm = ShortMessage::new("root", "foobar", "Lorem ipsum");
    let (a, b, c) = tokio::join!(session.submit(&sm), session.submit(&sm), session.submit(&sm));
    let results = [a, b, c];

    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(SmppError::MaxWindowSize)))
        .count();
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(rejected, 1);
    assert_eq!(accepted, 2);
}

/// Answers each segment with "foobar" plus its zero-based part index.
async fn segment_echo(conn: Arc<Connection>, pdu: Frame) {
    if let Frame::SubmitSm(submit) = &pdu {
        if let Some((concat, _)) = parse_udh(&submit.params.short_message) {
            let id = format!("foobar{}", concat.index - 1);
            let resp = Frame::SubmitSmResp(smpp_session::datatypes::SubmitSmResponse::new(
                pdu.sequence_number(),
                id,
            ));
            let _ = conn.write_frame(&resp).await;
            return;
        }
    }
    echo(conn, pdu).await;
}

#[tokio::test]
async fn long_raw_message_is_split_in_order() {
    let smsc = MockSmsc::start(segment_echo).await;
    let session = Session::new(config(smsc.addr()));
    bound(&session).await;

    let body = "a".repeat(189);
    let results = session
        .submit_long(&ShortMessage::new("root", "foobar", Text::raw(body)))
        .await
        .unwrap();

    let ids: Vec<&str> = results.iter().map(|r| r.resp_id()).collect();
    assert_eq!(ids, vec!["foobar0", "foobar1"]);
}

#[tokio::test]
async fn short_body_on_submit_long_is_one_plain_part() {
    let smsc = MockSmsc::echo().await;
    let session = Session::new(config(smsc.addr()));
    bound(&session).await;

    let results = session
        .submit_long(&ShortMessage::new("root", "foobar", "short"))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].resp_id(), "foobar");
}

#[tokio::test]
async fn long_message_waits_for_slots_held_by_other_submissions() {
    let smsc = MockSmsc::start(|conn: Arc<Connection>, pdu: Frame| async move {
        if let Frame::SubmitSm(submit) = &pdu {
            let delay = match parse_udh(&submit.params.short_message) {
                Some(_) => 50,
                None => 200,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        segment_echo(conn, pdu).await;
    })
    .await;
    let session = Session::new(config(smsc.addr()).with_window_size(3));
    bound(&session).await;

    let short = ShortMessage::new("root", "foobar", "Lorem ipsum");
    let long = ShortMessage::new("root", "foobar", Text::raw("a".repeat(300)));
    let (short, long) = tokio::join!(session.submit(&short), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        session.submit_long(&long).await
    });

    assert_eq!(short.unwrap().resp_id(), "foobar");
    let ids: Vec<String> = long
        .unwrap()
        .iter()
        .map(|r| r.resp_id().to_owned())
        .collect();
    assert_eq!(ids, vec!["foobar0", "foobar1", "foobar2"]);
    assert_eq!(session.pending(), 0);
}

#[tokio::test]
async fn zero_window_size_still_sends_long_messages() {
    let smsc = MockSmsc::start(segment_echo).await;
    let mut config = config(smsc.addr());
    config.window_size = 0;
    let session = Session::new(config);
    bound(&session).await;

    let sm = ShortMessage::new("root", "foobar", Text::raw("a".repeat(189)));
    let results = tokio::time::timeout(Duration::from_secs(3), session.submit_long(&sm))
        .await
        .expect("submit_long did not finish")
        .unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn ucs2_segments_reassemble_to_original_text() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let smsc = MockSmsc::start(move |conn: Arc<Connection>, pdu: Frame| {
        let tx = tx.clone();
        async move {
            if let Frame::SubmitSm(submit) = &pdu {
                let _ = tx.send((submit.params.esm_class, submit.params.short_message.clone()));
            }
            echo(conn, pdu).await;
        }
    })
    .await;
    let session = Session::new(config(smsc.addr()));
    bound(&session).await;

    let original = "Ünïcødé ✓ ".repeat(15);
    let results = session
        .submit_long(&ShortMessage::new("root", "foobar", Text::ucs2(original.clone())))
        .await
        .unwrap();
    assert_eq!(results.len(), 3);

    let mut parts = Vec::new();
    for _ in 0..3 {
        let (esm_class, short_message) = rx.recv().await.unwrap();
        assert_eq!(esm_class & 0x40, 0x40);
        let (concat, text) = parse_udh(&short_message).unwrap();
        assert_eq!(concat.total, 3);
        assert_eq!(text.len() % 2, 0);
        assert_eq!(short_message.len(), UDH_LENGTH + text.len());
        parts.push((concat.index, text.to_vec()));
    }
    parts.sort();

    let octets: Vec<u8> = parts.into_iter().flat_map(|(_, text)| text).collect();
    assert_eq!(Encoding::Ucs2.decode(&octets), original);
}

#[tokio::test]
async fn query_maps_state_to_name() {
    let smsc = MockSmsc::echo().await;
    let session = Session::new(config(smsc.addr()));
    bound(&session).await;

    let result = session
        .query(
            "root",
            "13",
            TypeOfNumber::Unknown,
            NumericPlanIndicator::Unknown,
        )
        .await
        .unwrap();
    assert_eq!(result.message_id, "13");
    assert_eq!(result.state, "DELIVERED");
}

#[tokio::test]
async fn submit_multi_reports_unsuccessful_destinations() {
    let smsc = MockSmsc::start(|conn: Arc<Connection>, pdu: Frame| async move {
        if let Frame::SubmitMulti(multi) = &pdu {
            assert_eq!(multi.destinations.len(), 3);
            let failed = UnsuccessSme::new(
                Address::from("bar"),
                CommandStatus::InvalidDestinationAddress,
            );
            let resp = SubmitMultiResponse::new(pdu.sequence_number(), "foobar", vec![failed]);
            let _ = conn.write_frame(&Frame::SubmitMultiResp(resp)).await;
            return;
        }
        echo(conn, pdu).await;
    })
    .await;
    let session = Session::new(config(smsc.addr()));
    bound(&session).await;

    let sm = ShortMessage::new("root", "", "Lorem ipsum")
        .with_dst_list(vec!["foo".into(), "bar".into()])
        .with_dl_list(vec!["club".into()]);
    let result = session.submit(&sm).await.unwrap();

    assert_eq!(result.resp_id(), "foobar");
    assert_eq!(result.num_unsuccess(), Some(1));
    let unsuccess = result.unsuccess_smes().unwrap();
    assert_eq!(unsuccess.len(), 1);
    assert_eq!(unsuccess[0].address.addr, "bar");
    assert_eq!(
        unsuccess[0].error_status_code,
        CommandStatus::InvalidDestinationAddress
    );
}

#[tokio::test]
async fn submit_after_close_fails_without_io() {
    let received = Arc::new(AtomicUsize::new(0));
    let seen = received.clone();
    let smsc = MockSmsc::start(move |conn: Arc<Connection>, pdu: Frame| {
        seen.fetch_add(1, Ordering::SeqCst);
        echo(conn, pdu)
    })
    .await;
    let session = Session::new(config(smsc.addr()));
    bound(&session).await;

    session.close().await;
    assert_eq!(session.status(), ConnectionStatus::Disconnected);
    // bind and unbind
    let before = received.load(Ordering::SeqCst);
    assert_eq!(before, 2);

    let err = session
        .submit(&ShortMessage::new("root", "foobar", "Lorem ipsum"))
        .await
        .unwrap_err();
    assert!(matches!(err, SmppError::NotConnected));
    assert!(!err.is_retryable());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(received.load(Ordering::SeqCst), before);

    // close is idempotent
    session.close().await;
}

#[tokio::test]
async fn close_cancels_in_flight_submissions() {
    // Submissions are never answered
    let smsc = MockSmsc::start(|conn: Arc<Connection>, pdu: Frame| async move {
        if pdu.command_id() != CommandId::SubmitSm {
            echo(conn, pdu).await;
        }
    })
    .await;
    let session = Session::new(config(smsc.addr()).with_response_timeout(Duration::from_secs(5)));
    bound(&session).await;

    let pending = {
        let session = session.clone();
        tokio::spawn(async move {
            session
                .submit(&ShortMessage::new("root", "foobar", "never answered"))
                .await
        })
    };
    while session.pending() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    session.close().await;
    assert!(matches!(
        pending.await.unwrap(),
        Err(SmppError::NotConnected)
    ));
}

#[tokio::test]
async fn close_while_connecting_releases_the_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (closed_tx, closed) = oneshot::channel();
    tokio::spawn(async move {
        // Reads the bind request but never answers it
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let _ = stream.read_to_end(&mut received).await;
        let _ = closed_tx.send(received.len());
    });

    let session = Session::new(config(&addr).with_response_timeout(Duration::from_secs(5)));
    let mut handle = session.bind();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(session.status(), ConnectionStatus::Connecting);

    session.close().await;
    let received = tokio::time::timeout(Duration::from_secs(1), closed)
        .await
        .expect("socket left open")
        .unwrap();
    assert!(received >= 16);

    let event = handle.wait().await;
    assert_eq!(event.status, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn unanswered_submission_times_out_and_session_survives() {
    let answered = Arc::new(AtomicUsize::new(0));
    let count = answered.clone();
    let smsc = MockSmsc::start(move |conn: Arc<Connection>, pdu: Frame| {
        let count = count.clone();
        async move {
            // The first submission is ignored
            if pdu.command_id() == CommandId::SubmitSm && count.fetch_add(1, Ordering::SeqCst) == 0
            {
                return;
            }
            echo(conn, pdu).await;
        }
    })
    .await;
    let session =
        Session::new(config(smsc.addr()).with_response_timeout(Duration::from_millis(200)));
    bound(&session).await;

    let sm = ShortMessage::new("root", "foobar", "Lorem ipsum");
    let err = session.submit(&sm).await.unwrap_err();
    assert!(matches!(err, SmppError::Timeout));
    assert!(err.is_retryable());
    assert_eq!(session.pending(), 0);

    assert_eq!(session.status(), ConnectionStatus::Connected);
    assert_eq!(session.submit(&sm).await.unwrap().resp_id(), "foobar");
}

#[tokio::test]
async fn each_submission_keeps_its_own_deadline() {
    let smsc = MockSmsc::start(|conn: Arc<Connection>, pdu: Frame| async move {
        if pdu.command_id() == CommandId::SubmitSm {
            tokio::time::sleep(Duration::from_millis(1200)).await;
        }
        echo(conn, pdu).await;
    })
    .await;
    // The session default of one second is shorter than the SMSC's delay
    let session = Session::new(config(smsc.addr()));
    bound(&session).await;

    let sm = ShortMessage::new("root", "foobar", "Lorem ipsum");
    let (hurried, patient) = tokio::join!(
        session.submit_with_timeout(&sm, Duration::from_millis(100)),
        session.submit_with_timeout(&sm, Duration::from_secs(3)),
    );

    assert!(matches!(hurried, Err(SmppError::Timeout)));
    assert_eq!(patient.unwrap().resp_id(), "foobar");
    assert_eq!(session.status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn smsc_error_status_is_a_protocol_error() {
    let smsc = MockSmsc::start(|conn: Arc<Connection>, pdu: Frame| async move {
        if pdu.command_id() == CommandId::SubmitSm {
            let resp = smpp_session::datatypes::SubmitSmResponse::error(
                pdu.sequence_number(),
                CommandStatus::ThrottlingError,
            );
            let _ = conn.write_frame(&Frame::SubmitSmResp(resp)).await;
            return;
        }
        echo(conn, pdu).await;
    })
    .await;
    let session = Session::new(config(smsc.addr()));
    bound(&session).await;

    let err = session
        .submit(&ShortMessage::new("root", "foobar", "Lorem ipsum"))
        .await
        .unwrap_err();
    assert_eq!(err.command_status(), Some(CommandStatus::ThrottlingError));
    assert_eq!(session.status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn undecodable_pdus_fail_only_their_own_exchange() {
    let (tx, mut nacks) = mpsc::unbounded_channel();
    let smsc = MockSmsc::start_raw(move |wire: Wire, pdu: Frame| {
        let tx = tx.clone();
        async move {
            match &pdu {
                Frame::SubmitSm(submit) if submit.params.short_message.as_ref() == b"bad" => {
                    // message_id without its NUL terminator
                    let mut resp = header(19, 0x8000_0004, pdu.sequence_number());
                    resp.extend_from_slice(b"abc");
                    wire.send(&resp).await;

                    // deliver_sm cut short after service_type
                    let mut req = header(17, 0x0000_0005, 42);
                    req.push(0);
                    wire.send(&req).await;
                }
                Frame::GenericNack(_) => {
                    let _ = tx.send(pdu);
                }
                _ => {
                    if let Some(resp) = respond(&pdu) {
                        wire.send_frame(&resp).await;
                    }
                }
            }
        }
    })
    .await;
    let session = Session::new(config(smsc.addr()));
    bound(&session).await;

    let err = session
        .submit(&ShortMessage::new("root", "foobar", Text::raw("bad")))
        .await
        .unwrap_err();
    assert!(matches!(err, SmppError::Decode(_)), "{err:?}");

    let nack = tokio::time::timeout(Duration::from_secs(1), nacks.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(nack.sequence_number(), 42);
    assert_eq!(nack.command_status(), CommandStatus::SystemError);

    assert_eq!(session.status(), ConnectionStatus::Connected);
    let result = session
        .submit(&ShortMessage::new("root", "foobar", "good"))
        .await
        .unwrap();
    assert_eq!(result.resp_id(), "foobar");
}

#[tokio::test]
async fn rejected_bind_disconnects_with_status() {
    let smsc = MockSmsc::start(|conn: Arc<Connection>, pdu: Frame| async move {
        let resp = BindTransceiverResponse::error(pdu.sequence_number(), CommandStatus::InvalidPassword);
        let _ = conn.write_frame(&Frame::BindTransceiverResp(resp)).await;
    })
    .await;
    let session = Session::new(config(smsc.addr()));

    let event = session.bind().wait().await;
    assert_eq!(event.status, ConnectionStatus::Disconnected);
    assert!(matches!(
        event.error.as_deref(),
        Some(SmppError::Protocol(CommandStatus::InvalidPassword))
    ));

    let err = session
        .submit(&ShortMessage::new("root", "foobar", "Lorem ipsum"))
        .await
        .unwrap_err();
    assert!(matches!(err, SmppError::NotConnected));
}

#[tokio::test]
async fn receiver_session_cannot_submit() {
    let smsc = MockSmsc::echo().await;
    let config = config(smsc.addr());
    let config = smpp_session::SessionConfig {
        credentials: BindCredentials::receiver("client", "secret"),
        ..config
    };
    let session = Session::new(config);
    bound(&session).await;

    let err = session
        .submit(&ShortMessage::new("root", "foobar", "Lorem ipsum"))
        .await
        .unwrap_err();
    assert!(matches!(err, SmppError::InvalidState(_)));
}

#[tokio::test]
async fn deliver_sm_is_acknowledged_and_routed() {
    let (acks_tx, mut acks) = mpsc::unbounded_channel();
    let smsc = MockSmsc::start(move |conn: Arc<Connection>, pdu: Frame| {
        let acks_tx = acks_tx.clone();
        async move {
            match &pdu {
                Frame::BindTransceiver(_) => {
                    echo(conn.clone(), pdu).await;
                    let mut deliver = DeliverSm::new(
                        Address::from("sender"),
                        Address::from("root"),
                        MessageParams::new(&b"inbound"[..]),
                    );
                    // Same number the client used for its bind
                    deliver.sequence_number = 1;
                    let _ = conn.write_frame(&Frame::DeliverSm(Box::new(deliver))).await;
                }
                Frame::DeliverSmResp(_) | Frame::EnquireLinkResp(_) => {
                    let _ = acks_tx.send(pdu.command_id());
                }
                _ => echo(conn, pdu).await,
            }
        }
    })
    .await;

    let (inbound_tx, mut inbound) = mpsc::unbounded_channel();
    let session = Session::new(
        config(smsc.addr()).with_inbound_handler(Arc::new(channel_handler(inbound_tx))),
    );
    bound(&session).await;

    match inbound.recv().await.unwrap() {
        Frame::DeliverSm(deliver) => {
            assert_eq!(deliver.source.addr, "sender");
            assert_eq!(&deliver.params.short_message[..], b"inbound");
        }
        other => panic!("unexpected inbound PDU {other:?}"),
    }
    assert_eq!(acks.recv().await.unwrap(), CommandId::DeliverSmResp);
}

#[tokio::test]
async fn smsc_unbind_ends_the_session() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let smsc = MockSmsc::start(move |conn: Arc<Connection>, pdu: Frame| {
        let tx = tx.clone();
        async move {
            match &pdu {
                Frame::BindTransceiver(_) => {
                    echo(conn.clone(), pdu).await;
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    let _ = conn.write_frame(&Frame::Unbind(Unbind::new(7))).await;
                }
                Frame::UnbindResp(resp) => {
                    let _ = tx.send(resp.sequence_number);
                }
                _ => echo(conn, pdu).await,
            }
        }
    })
    .await;
    let session = Session::new(config(smsc.addr()));
    let mut handle = session.bind();
    assert_eq!(handle.wait().await.status, ConnectionStatus::Connected);

    let event = handle.changed().await.unwrap();
    assert_eq!(event.status, ConnectionStatus::Disconnected);
    assert!(event.error.is_none());
    assert_eq!(rx.recv().await.unwrap(), 7);

    assert!(matches!(
        session
            .submit(&ShortMessage::new("root", "foobar", "Lorem ipsum"))
            .await,
        Err(SmppError::NotConnected)
    ));
}

#[tokio::test]
async fn failed_keep_alive_disconnects() {
    let smsc = MockSmsc::start(|conn: Arc<Connection>, pdu: Frame| async move {
        if pdu.command_id() != CommandId::EnquireLink {
            echo(conn, pdu).await;
        }
    })
    .await;
    let keep_alive = KeepAliveConfig::new(Duration::from_millis(100))
        .with_timeout(Duration::from_millis(50));
    let session = Session::new(config(smsc.addr()).with_keep_alive(keep_alive));
    let mut handle = session.bind();
    assert_eq!(handle.wait().await.status, ConnectionStatus::Connected);

    let event = handle.changed().await.unwrap();
    assert_eq!(event.status, ConnectionStatus::Disconnected);
    assert!(matches!(event.error.as_deref(), Some(SmppError::Timeout)));
}

#[tokio::test]
async fn answered_keep_alive_keeps_session_up() {
    let smsc = MockSmsc::echo().await;
    let keep_alive = KeepAliveConfig::new(Duration::from_millis(50))
        .with_timeout(Duration::from_millis(200));
    let session = Session::new(config(smsc.addr()).with_keep_alive(keep_alive));
    bound(&session).await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(session.status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn rate_limit_wait_is_bounded_by_response_timeout() {
    let smsc = MockSmsc::echo().await;
    let session = Session::new(
        config(smsc.addr())
            .with_response_timeout(Duration::from_millis(200))
            .with_rate_limiter(Arc::new(smpp_session::ratelimit::per_second(1))),
    );
    bound(&session).await;

    let sm = ShortMessage::new("root", "foobar", "Lorem ipsum");
    session.submit(&sm).await.unwrap();
    assert!(matches!(session.submit(&sm).await, Err(SmppError::Timeout)));
}

#[tokio::test]
async fn bind_twice_shares_state() {
    let binds = Arc::new(AtomicUsize::new(0));
    let count = binds.clone();
    let smsc = MockSmsc::start(move |conn: Arc<Connection>, pdu: Frame| {
        if pdu.command_id() == CommandId::BindTransceiver {
            count.fetch_add(1, Ordering::SeqCst);
        }
        echo(conn, pdu)
    })
    .await;
    let session = Session::new(config(smsc.addr()));

    let mut first = session.bind();
    let mut second = session.bind();
    assert_eq!(first.wait().await.status, ConnectionStatus::Connected);
    assert_eq!(second.wait().await.status, ConnectionStatus::Connected);
    assert_eq!(binds.load(Ordering::SeqCst), 1);
}
