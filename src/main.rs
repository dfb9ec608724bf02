//! Debug Chart - Main Entry Point
//!
//! Charts the local variables of a program paused under a debug adapter.

use anyhow::Context;
use clap::Parser;
use debugchart_rs::{backend::DebugBackend, config::AppConfig, frontend::DebugChartApp, logging};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Connect to the debug adapter at this address on start-up
    #[clap(long)]
    connect: Option<String>,

    /// Config file to use instead of the one in the data directory
    #[clap(long)]
    config: Option<PathBuf>,

    /// Start with the built-in demo session instead of a debug adapter
    #[clap(long, conflicts_with = "connect")]
    demo: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load_or_default(args.config.as_deref());
    let _log_guard = logging::init(&config.logging);

    tracing::info!("Starting Debug Chart");

    if let Some(address) = &args.connect {
        config.session.address = address.clone();
    }

    let (backend, frontend) = DebugBackend::new(config.clone());
    let stop = backend.stop_handle();
    let backend_handle = std::thread::Builder::new()
        .name("debug-backend".to_string())
        .spawn(move || backend.run())
        .context("Failed to spawn backend thread")?;

    if args.demo {
        frontend.use_demo_session();
    } else if args.connect.is_some() {
        frontend.connect(Some(config.session.clone()));
    }

    let dark_mode = config.ui.dark_mode;
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 680.0])
            .with_min_inner_size([640.0, 400.0])
            .with_title("Debug Chart"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Debug Chart",
        native_options,
        Box::new(move |cc| {
            if dark_mode {
                cc.egui_ctx.set_visuals(egui::Visuals::dark());
            } else {
                cc.egui_ctx.set_visuals(egui::Visuals::light());
            }

            Ok(Box::new(DebugChartApp::new(frontend, config, args.config)))
        }),
    );

    // A request blocked on a silent adapter must not hold up exit
    tracing::info!("Shutting down...");
    stop.store(false, Ordering::SeqCst);
    drop(backend_handle);

    result.map_err(|e| anyhow::anyhow!("UI error: {}", e))
}
