//! Session state behind the main window.
//!
//! Holds what the user selected, whether a run is in flight, and the
//! progress/status shown to them. The GUI renders from this and feeds
//! runner events back into it; the split button's enabled flag is
//! `can_run()`, never stored separately.

use std::path::{Path, PathBuf};

use crate::separation::{RunSummary, SeparationFailure};

/// Label shown when no input file is selected.
pub const NO_FILE_LABEL: &str = "No file selected";
/// Label shown when no output folder is selected.
pub const NO_FOLDER_LABEL: &str = "No folder selected";

/// Lifecycle of a separation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }
}

/// The user's current file and folder choice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub input_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl Selection {
    /// Both paths present.
    pub fn is_complete(&self) -> bool {
        self.input_file.is_some() && self.output_dir.is_some()
    }
}

/// Everything the runner needs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub run_id: u64,
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
}

/// Terminal result of a run, as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Succeeded { stems_dir: PathBuf },
    Failed { detail: String, tail: Vec<String> },
}

impl Completion {
    /// Body text for the completion dialog.
    pub fn dialog_message(&self) -> String {
        match self {
            Completion::Succeeded { stems_dir } => {
                format!("Stems written under:\n{}", stems_dir.display())
            }
            Completion::Failed { detail, .. } => format!("Separation failed:\n{}", detail),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    selection: Selection,
    run_state: RunState,
    progress: u8,
    status_text: String,
    current_run: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Progress value in 0..=100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Id of the latest run (0 before the first run).
    pub fn current_run(&self) -> u64 {
        self.current_run
    }

    /// Set or clear the input file. A cancelled picker passes `None`.
    pub fn select_input_file(&mut self, path: Option<PathBuf>) {
        self.selection.input_file = non_empty(path);
    }

    /// Set or clear the output folder. A cancelled picker passes `None`.
    pub fn select_output_dir(&mut self, path: Option<PathBuf>) {
        self.selection.output_dir = non_empty(path);
    }

    /// Base name of the input file, or a placeholder.
    pub fn input_label(&self) -> String {
        match &self.selection.input_file {
            Some(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            None => NO_FILE_LABEL.to_string(),
        }
    }

    /// Full output folder path, or a placeholder.
    pub fn output_label(&self) -> String {
        match &self.selection.output_dir {
            Some(path) => path.display().to_string(),
            None => NO_FOLDER_LABEL.to_string(),
        }
    }

    /// Whether the split action is enabled.
    pub fn can_run(&self) -> bool {
        self.selection.is_complete() && !self.run_state.is_running()
    }

    /// Start a run. Returns `None` if the selection is incomplete or a run
    /// is already in flight.
    pub fn begin_run(&mut self) -> Option<RunRequest> {
        if !self.can_run() {
            return None;
        }
        let input_file = self.selection.input_file.clone()?;
        let output_dir = self.selection.output_dir.clone()?;

        self.current_run += 1;
        self.run_state = RunState::Running;
        self.set_progress(0);

        Some(RunRequest {
            run_id: self.current_run,
            input_file,
            output_dir,
        })
    }

    /// Apply a progress update. Ignored unless it belongs to the running run.
    pub fn apply_progress(&mut self, run_id: u64, pct: u8) -> bool {
        if !self.accepts(run_id) {
            return false;
        }
        self.set_progress(pct.min(100));
        true
    }

    /// Finish the running run. Returns `None` for stale or repeated results.
    pub fn complete(
        &mut self,
        run_id: u64,
        result: &Result<RunSummary, SeparationFailure>,
    ) -> Option<Completion> {
        if !self.accepts(run_id) {
            return None;
        }

        match result {
            Ok(summary) => {
                self.run_state = RunState::Succeeded;
                self.progress = 100;
                self.status_text = "Done! 100%".to_string();
                Some(Completion::Succeeded {
                    stems_dir: summary.stems_dir.clone(),
                })
            }
            Err(failure) => Some(self.fail(failure.to_string(), failure.tail.clone())),
        }
    }

    /// Fail the running run without a runner result (the runner went away).
    pub fn abort(&mut self, run_id: u64, detail: impl Into<String>) -> Option<Completion> {
        if !self.accepts(run_id) {
            return None;
        }
        Some(self.fail(detail.into(), Vec::new()))
    }

    fn fail(&mut self, detail: String, tail: Vec<String>) -> Completion {
        self.run_state = RunState::Failed;
        self.status_text = "Error occurred.".to_string();
        Completion::Failed { detail, tail }
    }

    fn accepts(&self, run_id: u64) -> bool {
        self.run_state.is_running() && run_id == self.current_run
    }

    fn set_progress(&mut self, pct: u8) {
        self.progress = pct;
        self.status_text = format!("Processing... {}%", pct);
    }
}

fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

/// Parent directory to reopen a picker in, if any.
pub fn picker_start_dir(path: &Path) -> Option<PathBuf> {
    let dir = if path.is_dir() { Some(path) } else { path.parent() };
    dir.filter(|d| !d.as_os_str().is_empty() && d.is_dir())
        .map(Path::to_path_buf)
}
