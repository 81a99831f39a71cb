use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod controller;
mod domain;
mod model;
mod stats;
mod table;
mod ui;

use controller::Controller;
use domain::{DexConfig, DexError};
use model::{Model, Status};
use ui::DexUI;

/// Interactive data exploration for delimited text files.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path of the file to explore (a delimited text file with a header row)
    file: String,

    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// Event poll timeout in milliseconds
    #[arg(long, default_value_t = 100)]
    poll: u64,
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

// The terminal belongs to ratatui, so log output goes to the file named
// by DEX_LOG. Without it, logging stays off.
fn init_logging() {
    if let Ok(path) = std::env::var("DEX_LOG")
        && let Ok(file) = std::fs::File::create(path)
    {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::registry()
            .with(filter)
            .with(ErrorLayer::default())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    }
}

fn run() -> Result<(), DexError> {
    let cli = Cli::parse();
    if !cli.delimiter.is_ascii() {
        return Err(DexError::LoadingFailed(
            "Delimiter must be a single ascii character!".into(),
        ));
    }
    let path = shellexpand::full(&cli.file)
        .map_err(|e| DexError::LoadingFailed(e.to_string()))?
        .into_owned();

    let cfg = DexConfig::default().with_event_poll_time(cli.poll);
    let mut terminal = ratatui::init();
    let size = terminal.size()?;

    let mut model = Model::load(
        Path::new(&path),
        cli.delimiter as u8,
        &cfg,
        size.width as usize,
        size.height as usize,
    )?;
    let ui = DexUI::new(&cfg);
    let controller = Controller::new(&cfg);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }
    }

    Ok(())
}
