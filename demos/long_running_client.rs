// ABOUTME: Long-running SMPP client example demonstrating keep-alive and inbound message handling
// ABOUTME: Shows how to watch session status, log delivery receipts and send periodic messages

//! # Long-Running SMPP Client with Keep-Alive
//!
//! This example binds as a transceiver and then:
//!
//! * Lets the session send enquire_link on its own and ends when it fails
//! * Logs every deliver_sm, decoding delivery receipts
//! * Optionally sends a message every `--sms-interval` seconds and queries its state
//! * Shuts down cleanly when the run duration elapses
//!
//! ## Usage
//!
//! ```bash
//! # Basic keep-alive monitoring (no SMS sending)
//! cargo run --example long_running_client -- --system-id test --password secret
//!
//! # With periodic SMS sending
//! cargo run --example long_running_client -- \
//!   --system-id test --password secret \
//!   --to 123456789 --from 987654321 \
//!   --sms-interval 120
//!
//! # Custom keep-alive settings
//! cargo run --example long_running_client -- \
//!   --system-id test --password secret \
//!   --keep-alive-interval 60 \
//!   --keep-alive-timeout 15 \
//!   --max-failures 5 \
//!   --run-duration 600
//! ```

use argh::FromArgs;
use smpp_session::client::{
    BindCredentials, ConnectionStatus, KeepAliveConfig, Session, SessionConfig, ShortMessage,
};
use smpp_session::datatypes::{tlv::tags, NumericPlanIndicator, TypeOfNumber};
use smpp_session::text::{Encoding, Text};
use smpp_session::Frame;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Long-running SMPP client with keep-alive functionality
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the system id
    #[argh(option)]
    system_id: Option<String>,

    /// the password
    #[argh(option)]
    password: Option<String>,

    /// the hostname of IP address of the SMSC (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the port to use when connecting to the SMSC (default: 2775)
    #[argh(option, short = 'p')]
    port: Option<u32>,

    /// keep-alive interval in seconds (default: 30)
    #[argh(option)]
    keep_alive_interval: Option<u64>,

    /// keep-alive timeout in seconds (default: 10)
    #[argh(option)]
    keep_alive_timeout: Option<u64>,

    /// maximum consecutive failures before considering connection dead (default: 3)
    #[argh(option)]
    max_failures: Option<u32>,

    /// how long to run the client in seconds (default: 300, i.e., 5 minutes)
    #[argh(option)]
    run_duration: Option<u64>,

    /// interval between SMS sends in seconds (default: 60)
    #[argh(option)]
    sms_interval: Option<u64>,

    /// the recipient telephone number (optional - no SMS sent if not provided)
    #[argh(option, short = 't')]
    to: Option<String>,

    /// the telephone number that the message will be from (optional)
    #[argh(option, short = 'f')]
    from: Option<String>,
}

fn log_inbound(frame: Frame) {
    match frame {
        Frame::DeliverSm(deliver) if deliver.is_delivery_receipt() => {
            let message_id = deliver
                .params
                .tlv(tags::RECEIPTED_MESSAGE_ID)
                .and_then(|tlv| tlv.as_cstring())
                .unwrap_or_default();
            info!(%message_id, from = %deliver.source.addr, "delivery receipt");
        }
        Frame::DeliverSm(deliver) => {
            let encoding = Encoding::from_data_coding(deliver.params.data_coding)
                .unwrap_or_default();
            let text = Text::decode(&deliver.params.short_message, encoding);
            info!(from = %deliver.source.addr, text = text.as_str(), "message received");
        }
        other => warn!(command_id = ?other.command_id(), "unsolicited PDU"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging { Level::DEBUG } else { Level::INFO })
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(2775);
    let system_id = cli_args.system_id.unwrap_or_default();
    let password = cli_args.password.unwrap_or_default();
    let run_duration = Duration::from_secs(cli_args.run_duration.unwrap_or(300));
    let sms_interval = Duration::from_secs(cli_args.sms_interval.unwrap_or(60));

    let keep_alive = KeepAliveConfig::new(Duration::from_secs(
        cli_args.keep_alive_interval.unwrap_or(30),
    ))
    .with_timeout(Duration::from_secs(cli_args.keep_alive_timeout.unwrap_or(10)))
    .with_max_failures(cli_args.max_failures.unwrap_or(3));

    info!("Starting long-running SMPP client");
    info!("Connecting to {host}:{port}");
    info!("Will run for {} seconds", run_duration.as_secs());

    let config = SessionConfig::new(
        format!("{host}:{port}"),
        BindCredentials::transceiver(system_id, password),
    )
    .with_keep_alive(keep_alive)
    .with_inbound_handler(Arc::new(log_inbound));

    let session = Session::new(config);
    let mut events = session.bind();
    let event = events.wait().await;
    if event.status != ConnectionStatus::Connected {
        error!(error = ?event.error, "Bind failed");
        return Err("bind failed".into());
    }

    info!("Connected and bound successfully");

    let recipients = cli_args.to.zip(cli_args.from);
    let mut sms_timer = interval(sms_interval);
    let deadline = sleep(run_duration);
    tokio::pin!(deadline);

    let start_time = std::time::Instant::now();
    let mut message_count = 0;

    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!("Run duration elapsed, shutting down");
                break;
            }

            event = events.changed() => {
                match event {
                    Some(event) if event.status == ConnectionStatus::Disconnected => {
                        error!(error = ?event.error, "Session ended");
                        break;
                    }
                    Some(event) => info!(status = %event.status, "Session status changed"),
                    None => break,
                }
            }

            _ = sms_timer.tick(), if recipients.is_some() => {
                let Some((to, from)) = &recipients else { continue };
                message_count += 1;
                let text = format!("Test message #{message_count} from long-running client");
                let sms = ShortMessage::new(from.as_str(), to.as_str(), text.as_str())
                    .with_delivery_receipt();

                match session.submit(&sms).await {
                    Ok(result) => {
                        info!("Message {} sent successfully! ID: {}", message_count, result.resp_id());
                        match session
                            .query(from, result.resp_id(), TypeOfNumber::Unknown, NumericPlanIndicator::Unknown)
                            .await
                        {
                            Ok(state) => info!(message_id = %state.message_id, state = state.state, "Queried message"),
                            Err(e) => warn!("Query failed: {e}"),
                        }
                    }
                    Err(e) => error!("Failed to send message {}: {}", message_count, e),
                }
            }
        }
    }

    info!("Shutting down client");
    session.close().await;

    info!("Total SMS messages sent: {}", message_count);
    let uptime = start_time.elapsed();
    info!("Client ran for {:.1} seconds", uptime.as_secs_f64());

    Ok(())
}
