//! Stem Splitter - Main entry point
//!
//! This is the application entry point using iced. It handles:
//! - Configuration loading
//! - Application-level logging initialization
//! - Directory creation
//! - Application launch

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use stem_core::config::ConfigManager;
use stem_core::logging::init_tracing_with_file;

mod app;
mod handlers;
mod pages;
mod theme;

use app::{App, AppInit};

/// Window title.
const APP_TITLE: &str = "Stem Splitter";

/// Default config path: .config/settings.toml (relative to current working directory)
fn default_config_path() -> PathBuf {
    PathBuf::from(".config").join("settings.toml")
}

fn main() -> iced::Result {
    // Load configuration first (needed for logs directory path and level)
    let config_path = default_config_path();
    let mut config_manager = ConfigManager::new(&config_path);

    if let Err(e) = config_manager.load_or_create() {
        eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
    }

    let logs_dir = config_manager.logs_folder();
    let level = config_manager.settings().logging.level;
    let _log_guard = init_tracing_with_file(level, &logs_dir);

    tracing::info!("Stem Splitter starting");
    tracing::info!("Config: {}", config_path.display());
    tracing::info!("Core version: {}", stem_core::version());

    if let Err(e) = config_manager.ensure_dirs_exist() {
        tracing::error!("Failed to create directories: {}", e);
    }

    let version_info = format!(
        "Stem Splitter started.\nCore version: {}\nConfig: {}\nLogs: {}\nTool: {}",
        stem_core::version(),
        config_path.display(),
        logs_dir.display(),
        config_manager.settings().tool.command,
    );

    let init = AppInit {
        config: Arc::new(Mutex::new(config_manager)),
        version_info,
    };

    tracing::info!("Application initialized, starting iced event loop");

    iced::application(move || App::new(init.clone()), App::update, App::view)
        .title(APP_TITLE)
        .window_size((560.0, 520.0))
        .run()
}
