//! Main application module for Stem Splitter.
//!
//! Holds the iced application state and routes messages to the handlers.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use iced::{Element, Task};
use parking_lot::Mutex;

use stem_core::config::ConfigManager;
use stem_core::logging::ProgressThrottle;
use stem_core::separation::RunEvent;
use stem_core::session::Session;

use crate::pages;

/// Initialization data for the App.
#[derive(Clone)]
pub struct AppInit {
    pub config: Arc<Mutex<ConfigManager>>,
    pub version_info: String,
}

/// All possible messages the application can receive.
#[derive(Debug, Clone)]
pub enum Message {
    // Selection
    BrowseInput,
    InputSelected(Option<PathBuf>),
    BrowseOutput,
    OutputSelected(Option<PathBuf>),
    PathsSaved(Result<(), String>),

    // Separation
    SplitStems,
    Runner { run_id: u64, event: RunEvent },
    RunnerStopped(u64),

    // Completion dialog dismissed
    DialogClosed,
}

pub struct App {
    pub config: Arc<Mutex<ConfigManager>>,
    pub session: Session,
    pub log_text: String,
    pub progress_log: ProgressThrottle,
}

impl App {
    pub fn new(init: AppInit) -> (Self, Task<Message>) {
        let progress_step = init.config.lock().settings().logging.progress_step;

        let mut app = Self {
            config: init.config,
            session: Session::new(),
            log_text: String::new(),
            progress_log: ProgressThrottle::new(progress_step),
        };
        for line in init.version_info.lines() {
            app.append_log(line);
        }

        (app, Task::none())
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::BrowseInput => self.browse_input(),
            Message::InputSelected(path) => self.handle_input_selected(path),
            Message::BrowseOutput => self.browse_output(),
            Message::OutputSelected(path) => self.handle_output_selected(path),
            Message::PathsSaved(result) => {
                self.handle_paths_saved(result);
                Task::none()
            }
            Message::SplitStems => self.start_separation(),
            Message::Runner { run_id, event } => self.handle_runner_event(run_id, event),
            Message::RunnerStopped(run_id) => self.handle_runner_stopped(run_id),
            Message::DialogClosed => Task::none(),
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        pages::main_window::view(self)
    }

    /// Append a timestamped line to the log panel.
    pub fn append_log(&mut self, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        self.log_text.push_str(&format!("[{}] {}\n", timestamp, message));
    }
}
