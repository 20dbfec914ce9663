//! pi-show
//!
//! Shows text files and images on the display attached to a single-board
//! computer: an SSD1306 OLED panel on the I2C bus when one answers, otherwise
//! an X session through xmessage and feh.

mod config;
mod content;
mod detect;
mod player;
mod rendering;

use anyhow::{Context, Result};
use clap::Parser;
use pishow_hw::OledDevice;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::{Cli, Config, RenderConfig, RunConfig};
use content::StdinSource;
use detect::{DisplayTarget, Helpers, SystemHost};
use player::{Player, Shutdown};
use rendering::{Canvas, Font, PanelCanvas, TextRenderer, WindowedCanvas};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    // Load configuration
    let file = match &cli.config {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            info!("Loaded configuration from: {}", path.display());
            config
        }
        None => Config::default(),
    };
    let run = RunConfig::resolve(cli, file);
    debug!("{:?}", run);

    // Pick the display
    let host = SystemHost;
    let helpers = Helpers::locate(&host, &run.helpers);
    let target = detect::detect(&host, &run.panel, &helpers)?;

    let font = Font::load(run.font.as_deref())?;
    let render = RenderConfig::for_target(&target, run.wait);

    // Stdin is drained while Ctrl-C still has its default action.
    let stdin = run
        .stdin
        .then(|| StdinSource::read_from(std::io::stdin().lock()));

    // Register signal handlers before any rendering so an interrupt never
    // takes the default action.
    let shutdown = shutdown_signal()?;

    match target {
        DisplayTarget::PixelPanel { .. } => {
            let bus_node = run.panel.bus_node();
            let device = OledDevice::open(&bus_node.to_string_lossy(), run.panel.address)
                .context("Failed to open OLED panel")?;
            let canvas = PanelCanvas::new(device, TextRenderer::new(font));
            play(canvas, render, &run, stdin, shutdown).await;
        }
        DisplayTarget::WindowedFallback { .. } => {
            let canvas = WindowedCanvas::new(helpers);
            play(canvas, render, &run, stdin, shutdown).await;
        }
    }

    Ok(())
}

async fn play<C: Canvas>(
    canvas: C,
    render: RenderConfig,
    run: &RunConfig,
    stdin: Option<StdinSource>,
    shutdown: Shutdown,
) {
    info!(
        "Showing {} ({} lines x {} chars, {}s per item)",
        run.directory.display(),
        render.max_lines,
        render.max_chars,
        render.dwell.as_secs()
    );

    let exit = Player::new(canvas, render, run.directory.clone())
        .once(run.once)
        .with_stdin(stdin)
        .with_shutdown(shutdown)
        .run()
        .await;
    debug!("Loop ended: {:?}", exit);
}

fn shutdown_signal() -> Result<Shutdown> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(Box::pin(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down");
            }
        }
    }))
}
