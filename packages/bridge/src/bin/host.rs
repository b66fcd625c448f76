//! songframe-host: the embedded editor over stdin/stdout
//!
//! Host commands arrive as JSON lines on stdin and events leave as JSON lines
//! on stdout. Logs go to stderr. Lines such as `{"edit": "..."}` play the
//! part of the person typing into the editor.

use anyhow::{Context, Result};
use clap::Parser;
use songframe_bridge::{
    console_action, decode_line, encode_event, BridgeConfig, BridgeInput, ConsoleAction,
    HostBridge, RestGateway,
};
use songframe_editor::{
    tree, HeadlessSurface, HostEvent, LaunchContext, MemoryGateway, PersistenceGateway,
    SurfaceProbe,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "songframe-host")]
#[command(about = "Run the songframe editor session over line-delimited JSON", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ./songframe.config.json if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Launch URL; its `docId` query parameter opens a document at startup
    #[arg(long)]
    launch_url: Option<String>,

    /// Override the save debounce interval
    #[arg(long)]
    debounce_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load_file(path)?,
        None => BridgeConfig::load(&std::env::current_dir()?)?,
    };
    if let Some(debounce_ms) = cli.debounce_ms {
        config.save_debounce_ms = debounce_ms;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let launch = match &cli.launch_url {
        Some(url) => LaunchContext::from_url(url).context("Failed to parse --launch-url")?,
        None => LaunchContext::default(),
    };

    let gateway: Arc<dyn PersistenceGateway> = match &config.backend {
        Some(backend) => {
            tracing::info!("Using backend at {}", backend.url);
            Arc::new(RestGateway::new(backend)?)
        }
        None => {
            tracing::info!("No backend configured, using in-memory store");
            Arc::new(MemoryGateway::from_fixtures(config.load_fixtures()?))
        }
    };

    let (surface, probe) = HeadlessSurface::new();
    let (bridge, handle) = HostBridge::new(&config, gateway, Box::new(surface));
    let (inputs, events) = handle.into_parts();

    let writer = tokio::spawn(write_events(events));
    let reader = tokio::spawn(read_lines(inputs, probe));

    bridge.run(&launch).await;

    // The bridge owned every event sender; the writer drains and stops
    reader.abort();
    writer.await??;
    Ok(())
}

async fn read_lines(inputs: mpsc::Sender<BridgeInput>, probe: SurfaceProbe) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let Some(message) = decode_line(&line) else {
            continue;
        };

        let input = match console_action(&message) {
            Some(ConsoleAction::Edit(text)) => {
                if !probe.edit(|doc| tree::push_paragraph(doc, &text)) {
                    tracing::warn!("Editor is read-only or not mounted");
                }
                continue;
            }
            Some(ConsoleAction::Rename(title)) => {
                if !probe.edit_title(&title) {
                    tracing::warn!("Title is read-only or no document is open");
                }
                continue;
            }
            Some(ConsoleAction::InsertSection(label)) => BridgeInput::InsertSection(label),
            None => BridgeInput::Host(message),
        };

        if inputs.send(input).await.is_err() {
            return Ok(());
        }
    }

    // stdin closed
    let _ = inputs.send(BridgeInput::Shutdown).await;
    Ok(())
}

async fn write_events(mut events: mpsc::UnboundedReceiver<HostEvent>) -> Result<()> {
    let mut stdout = tokio::io::stdout();

    while let Some(event) = events.recv().await {
        let mut line = encode_event(&event)?;
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}
