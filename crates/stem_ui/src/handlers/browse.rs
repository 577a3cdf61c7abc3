//! File browsing handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use iced::Task;
use parking_lot::Mutex;

use stem_core::config::{ConfigManager, ConfigSection, PathSettings};
use stem_core::logging::MessagePrefix;
use stem_core::separation::AUDIO_EXTENSIONS;
use stem_core::session::picker_start_dir;

use crate::app::{App, Message};

impl App {
    /// Browse for the input audio file.
    pub fn browse_input(&self) -> Task<Message> {
        let start_dir = self.remembered_dir(|paths| &paths.last_input_dir);

        Task::perform(
            async move {
                let mut dialog = rfd::AsyncFileDialog::new()
                    .set_title("Select an audio file")
                    .add_filter("Audio Files", AUDIO_EXTENSIONS);
                if let Some(dir) = start_dir {
                    dialog = dialog.set_directory(dir);
                }
                dialog.pick_file().await.map(|f| f.path().to_path_buf())
            },
            Message::InputSelected,
        )
    }

    /// Browse for the output folder.
    pub fn browse_output(&self) -> Task<Message> {
        let start_dir = self.remembered_dir(|paths| &paths.last_output_dir);

        Task::perform(
            async move {
                let mut dialog = rfd::AsyncFileDialog::new().set_title("Select output folder");
                if let Some(dir) = start_dir {
                    dialog = dialog.set_directory(dir);
                }
                dialog.pick_folder().await.map(|f| f.path().to_path_buf())
            },
            Message::OutputSelected,
        )
    }

    /// Handle the input file picker result. Cancelling clears the selection.
    pub fn handle_input_selected(&mut self, path: Option<PathBuf>) -> Task<Message> {
        self.session.select_input_file(path);

        let Some(file) = self.session.selection().input_file.clone() else {
            self.append_log("Input file cleared");
            return Task::none();
        };
        self.append_log(&format!("Input file: {}", file.display()));

        match picker_start_dir(&file) {
            Some(dir) => self.remember_dir(&dir, |paths, value| paths.last_input_dir = value),
            None => Task::none(),
        }
    }

    /// Handle the output folder picker result. Cancelling clears the selection.
    pub fn handle_output_selected(&mut self, path: Option<PathBuf>) -> Task<Message> {
        self.session.select_output_dir(path);

        let Some(dir) = self.session.selection().output_dir.clone() else {
            self.append_log("Output folder cleared");
            return Task::none();
        };
        self.append_log(&format!("Output folder: {}", dir.display()));
        self.remember_dir(&dir, |paths, value| paths.last_output_dir = value)
    }

    /// Handle the result of saving the `[paths]` section.
    pub fn handle_paths_saved(&mut self, result: Result<(), String>) {
        if let Err(e) = result {
            tracing::warn!("Failed to save last used folder: {}", e);
            self.append_log(&MessagePrefix::Warning.format(&format!(
                "Could not save last used folder: {}",
                e
            )));
        }
    }

    fn remembered_dir(&self, field: impl Fn(&PathSettings) -> &String) -> Option<PathBuf> {
        let cfg = self.config.lock();
        let value = field(&cfg.settings().paths);
        if value.is_empty() {
            return None;
        }
        picker_start_dir(Path::new(value))
    }

    /// Record a picker directory in memory and save `[paths]` in the background.
    fn remember_dir(
        &mut self,
        dir: &Path,
        set: impl FnOnce(&mut PathSettings, String),
    ) -> Task<Message> {
        set(
            &mut self.config.lock().settings_mut().paths,
            dir.to_string_lossy().to_string(),
        );

        let config = Arc::clone(&self.config);
        Task::perform(
            async move {
                match tokio::task::spawn_blocking(move || save_paths(&config)).await {
                    Ok(result) => result,
                    Err(e) => Err(e.to_string()),
                }
            },
            Message::PathsSaved,
        )
    }
}

/// Write the `[paths]` section to disk.
fn save_paths(config: &Mutex<ConfigManager>) -> Result<(), String> {
    config
        .lock()
        .update_section(ConfigSection::Paths)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppInit;
    use std::fs;
    use tempfile::tempdir;

    fn app_with_config(config_path: PathBuf) -> (App, Arc<Mutex<ConfigManager>>) {
        let config = Arc::new(Mutex::new(ConfigManager::new(config_path)));
        let (app, _) = App::new(AppInit {
            config: Arc::clone(&config),
            version_info: String::new(),
        });
        (app, config)
    }

    #[test]
    fn selection_updates_memory_without_writing_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");
        let (mut app, config) = app_with_config(config_path.clone());

        let _ = app.handle_input_selected(Some(dir.path().join("song.mp3")));

        assert_eq!(
            config.lock().settings().paths.last_input_dir,
            dir.path().to_string_lossy()
        );
        assert!(!config_path.exists());
    }

    #[test]
    fn save_paths_writes_section() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");
        let config = Mutex::new(ConfigManager::new(&config_path));
        config.lock().load_or_create().unwrap();
        config.lock().settings_mut().paths.last_output_dir = "/music/stems".to_string();

        save_paths(&config).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("/music/stems"));
    }

    #[test]
    fn cancelled_pick_saves_nothing() {
        let dir = tempdir().unwrap();
        let (mut app, config) = app_with_config(dir.path().join("settings.toml"));

        let _ = app.handle_output_selected(None);

        assert!(config.lock().settings().paths.last_output_dir.is_empty());
        assert!(app.session.selection().output_dir.is_none());
    }
}
