//! # blockbotd
//!
//! Drives one block peripheral from a line-oriented shell on stdin.
//!
//! Wiring only: configuration, logging, the transport backend and the
//! peripheral channel are assembled here and handed to [`shell::Shell`].

mod config;
mod settings;
mod shell;

use std::sync::Arc;

use blockbot_adapter_ble::BtleTransportFactory;
use blockbot_adapter_virtual::VirtualBench;
use blockbot_app::channel::PeripheralChannel;
use blockbot_app::event_bus::ChannelEvent;
use blockbot_app::ports::TransportFactory;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use config::{Backend, Config};
use settings::EnvGroupKey;
use shell::{Reply, Shell};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .with_writer(std::io::stderr)
        .init();

    let group = config.group_key();
    tracing::info!(
        device = %config.device.kind,
        group = group.as_ref().map_or("-", |g| g.as_str()),
        backend = ?config.transport.backend,
        "starting blockbotd"
    );

    let keys = EnvGroupKey::new(group.clone());
    match config.transport.backend {
        Backend::Ble => {
            let factory = BtleTransportFactory::new(config.transport.ble.clone());
            run(PeripheralChannel::new(config.device.kind, factory, keys)).await
        }
        Backend::Virtual => {
            let bench = VirtualBench::classroom(group.as_ref());
            run(PeripheralChannel::new(config.device.kind, bench.factory(), keys)).await
        }
    }
}

async fn run<F: TransportFactory>(
    channel: PeripheralChannel<F, EnvGroupKey>,
) -> Result<(), Box<dyn std::error::Error>> {
    let channel = Arc::new(channel);
    let events = tokio::spawn(log_events(channel.events().subscribe()));
    let mut shell = Shell::new(Arc::clone(&channel));

    println!("{}", shell::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match shell::parse(&line) {
            Ok(command) => command,
            Err(shell::ParseError::Empty) => continue,
            Err(err) => {
                println!("error: {err}");
                continue;
            }
        };
        match shell.execute(command).await {
            Ok(Reply::Say(text)) => println!("{text}"),
            Ok(Reply::Quit) => break,
            Err(err) => println!("error: {err}"),
        }
    }

    channel.disconnect().await;
    events.abort();
    tracing::info!("blockbotd stopped");
    Ok(())
}

async fn log_events(mut events: tokio::sync::broadcast::Receiver<ChannelEvent>) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        match events.recv().await {
            Ok(ChannelEvent::Reading(_)) => {}
            Ok(event) => tracing::info!(?event, "channel event"),
            Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "event log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
