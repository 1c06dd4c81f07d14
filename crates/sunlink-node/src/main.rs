//! `sunlink` binary.
//!
//! Replays a captured VE.Direct byte stream (file or stdin) through the full
//! pipeline with a logging radio, so captures from real devices can be
//! inspected end to end without hardware attached.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sunlink_node::{
    FixedSensor, Node, NodeConfig, NodeContext, NodeError, ReplaySource, DEFAULT_CHUNK,
};
use sunlink_radio::{LinkConfig, RadioError, RadioLink, RadioManager};

#[derive(Parser, Debug)]
#[command(
    name = "sunlink",
    about = "Solar telemetry node: VE.Direct in, radio messages out"
)]
struct Cli {
    /// Path to the node configuration file (defaults apply when absent).
    #[arg(long, default_value = "sunlink.yaml")]
    config: PathBuf,

    /// Captured VE.Direct byte stream to replay. Reads stdin when omitted.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Bytes fed to the parser per poll round.
    #[arg(long, default_value_t = DEFAULT_CHUNK)]
    chunk: usize,
}

/// Radio that logs every payload instead of keying hardware.
struct TraceRadio;

impl RadioLink for TraceRadio {
    fn configure(&mut self, config: &LinkConfig) -> Result<(), RadioError> {
        info!(
            "TraceRadio: configured channel {} address {:?}",
            config.channel,
            String::from_utf8_lossy(&config.address)
        );
        Ok(())
    }

    fn write(&mut self, payload: &[u8]) -> bool {
        info!(
            "TraceRadio: tx {} bytes {}",
            payload.len(),
            hex::encode(payload)
        );
        true
    }

    fn power_down(&mut self) {
        info!("TraceRadio: power down");
    }

    fn power_up(&mut self) {
        info!("TraceRadio: power up");
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("sunlink: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), NodeError> {
    let config = if cli.config.exists() {
        NodeConfig::load(&cli.config)?
    } else {
        info!(
            "sunlink: {} not found, using defaults",
            cli.config.display()
        );
        NodeConfig::default()
    };

    let source = match &cli.replay {
        Some(path) => ReplaySource::from_path(path)?.with_chunk(cli.chunk),
        None => {
            let mut data = Vec::new();
            std::io::stdin().read_to_end(&mut data)?;
            ReplaySource::new(data).with_chunk(cli.chunk)
        }
    };

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;

    let manager = RadioManager::new(
        TraceRadio,
        config.radio.link_config()?,
        config.transmit.clone(),
    )?;
    let mut node = Node::new(
        source,
        FixedSensor::default(),
        manager,
        NodeContext::default(),
        &config,
    );

    let report = node.run(&stop);
    if stop.load(Ordering::Relaxed) {
        node.power_down();
    }
    info!("sunlink: {report}");

    if node.has_error() {
        return Err(NodeError::LinkFailed);
    }
    Ok(())
}
