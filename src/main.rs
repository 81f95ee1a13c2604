mod app;
mod config;
mod error;
mod payload;
mod recorder;
mod submitter;
mod ui;

use std::path::PathBuf;

use clap::Parser;

use app::{AppState, WidgetEvent};
use config::Config;
use recorder::CpalDevice;

#[derive(Parser, Debug)]
#[command(
    name = "soundcheck",
    version,
    about = "Record or pick an audio clip and submit it for analysis"
)]
struct Args {
    /// Analysis service URL (overrides the config file for this run)
    #[arg(long)]
    server: Option<String>,

    /// Validate and preselect an audio file at startup
    #[arg(long)]
    file: Option<PathBuf>,

    /// Write the effective configuration back to disk and continue
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    log::info!("soundcheck starting");

    let args = Args::parse();

    let mut config = Config::load();
    if let Some(server) = args.server {
        config.server_url = server;
    }
    if args.save_config {
        if let Err(e) = config.save() {
            log::warn!("Failed to save config: {e}");
        }
    }

    let (tx, rx) = async_channel::unbounded::<WidgetEvent>();
    let mut state = AppState::new(config, tx.clone(), Box::new(CpalDevice));

    ui::panel::print_banner(&state);

    if let Some(path) = args.file {
        app::handle_event(&mut state, WidgetEvent::FileChosen(path));
    }

    ui::console::start_reader(tx);

    while let Ok(event) = rx.recv().await {
        if !app::handle_event(&mut state, event) {
            break;
        }
    }

    log::info!("soundcheck exiting");
}
