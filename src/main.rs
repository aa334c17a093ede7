pub mod config;
pub mod controller;
pub mod ui;

use crate::config::DisplayConfig;
use crate::controller::{GamepadBackend, GilrsBackend, NoGamepads};
use crate::ui::fonts::{FontAsset, FontError};
use crate::ui::LaneInputsUI;
use color_eyre::Result;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

// Startup failures; each one ends the process with exit code 1
#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("font failed to load: {0}")]
    Font(#[from] FontError),

    #[error("gamepad subsystem failed to initialize: {0}")]
    Gamepad(String),

    #[error("window failed to create: {0}")]
    Window(String),
}

fn main() -> ExitCode {
    if let Err(e) = setup() {
        eprintln!("Failed to set up diagnostics: {}", e);
        return ExitCode::FAILURE;
    }

    match run() {
        Ok(()) => {
            info!("Visualizer closed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> std::result::Result<(), StartupError> {
    let config = DisplayConfig::load_or_default();

    let font = FontAsset::load(&config.font_path)?;

    let backend: Box<dyn GamepadBackend> = if config.use_gamepad {
        Box::new(GilrsBackend::new().map_err(|e| StartupError::Gamepad(e.to_string()))?)
    } else {
        Box::new(NoGamepads)
    };

    info!("Starting visualizer window");
    let native_options = ui::native_options(&config);
    eframe::run_native(
        ui::WINDOW_TITLE,
        native_options,
        Box::new(|cc| Ok(Box::new(LaneInputsUI::new(cc, config, font, backend)))),
    )
    .map_err(|e| StartupError::Window(e.to_string()))
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
