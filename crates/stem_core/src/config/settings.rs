//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// External separation tool invocation.
    #[serde(default)]
    pub tool: ToolSettings,

    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// How the external separation tool is launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Program name or path of the separation tool.
    #[serde(default = "default_command")]
    pub command: String,

    /// Target stem for two-stem mode (the remainder becomes the second stem).
    #[serde(default = "default_two_stems")]
    pub two_stems: String,

    /// Additional arguments passed before the output directory flag.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_command() -> String {
    "demucs".to_string()
}

fn default_two_stems() -> String {
    "vocals".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            command: default_command(),
            two_stems: default_two_stems(),
            extra_args: Vec::new(),
        }
    }
}

/// Path configuration for logs and remembered picker locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Directory the audio file picker last opened in.
    #[serde(default)]
    pub last_input_dir: String,

    /// Directory last chosen as the output folder.
    #[serde(default)]
    pub last_output_dir: String,
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            logs_folder: default_logs_folder(),
            last_input_dir: String::new(),
            last_output_dir: String::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Number of trailing tool output lines kept for failure reports.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress percentage step between log panel entries.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
        }
    }
}

/// Config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Tool,
    Paths,
    Logging,
}

impl ConfigSection {
    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Tool => "tool",
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
        }
    }

    /// All sections, in file order.
    pub fn all() -> [ConfigSection; 3] {
        [ConfigSection::Tool, ConfigSection::Paths, ConfigSection::Logging]
    }
}
