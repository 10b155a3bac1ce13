// ABOUTME: Example application sending one SMS, segmented when it is too long for a single PDU
// ABOUTME: Shows the Session bind, submit_long and close flow

use argh::FromArgs;
use smpp_session::client::{BindCredentials, ConnectionStatus, Session, SessionConfig, ShortMessage};
use smpp_session::text::Text;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

/// Example application to show the simplest case of sending an SMS message
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

    /// the message to send
    #[argh(option, short = 'm')]
    message: String,

    /// the recipient telephone number
    #[argh(option, short = 't')]
    to: String,

    /// the telephone number that the message will be from
    #[argh(option, short = 'f')]
    from: String,

    /// send the message as UCS2 instead of raw octets
    #[argh(switch)]
    ucs2: bool,

    /// request a delivery receipt
    #[argh(switch)]
    receipt: bool,

    /// maximum PDUs per second (default: unlimited)
    #[argh(option)]
    rate: Option<usize>,
}

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging { Level::TRACE } else { Level::INFO })
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(2775);
    let system_id = cli_args.system_id.unwrap_or_default();
    let password = cli_args.password.unwrap_or_default();

    let mut config = SessionConfig::new(
        format!("{host}:{port}"),
        BindCredentials::transmitter(system_id, password),
    )
    .with_response_timeout(Duration::from_secs(5));
    if let Some(rate) = cli_args.rate {
        config = config.with_rate_limiter(Arc::new(smpp_session::ratelimit::per_second(rate)));
    }

    let session = Session::new(config);
    let event = session.bind().wait().await;
    if event.status != ConnectionStatus::Connected {
        let reason = event.error.map(|e| e.to_string()).unwrap_or_default();
        eprintln!("Connection/bind failed: {reason}");
        return Err(reason.into());
    }

    println!("Connected and bound successfully");

    let text = if cli_args.ucs2 {
        Text::ucs2(cli_args.message)
    } else {
        Text::raw(cli_args.message)
    };
    let mut sms = ShortMessage::new(cli_args.from, cli_args.to, text);
    if cli_args.receipt {
        sms = sms.with_delivery_receipt();
    }

    let outcome = session.submit_long(&sms).await;
    session.close().await;

    match outcome {
        Ok(parts) => {
            for (index, part) in parts.iter().enumerate() {
                println!("Part {} accepted, message ID: {}", index + 1, part.resp_id());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to send message: {e}");
            Err(Box::<dyn Error>::from(e.to_string()))
        }
    }
}
