//! Separation run handlers.
//!
//! The runner blocks on the external tool, so it runs on its own thread.
//! Its events come back through a channel that iced drains as a stream,
//! tagged with the run id they belong to.

use std::thread;

use iced::futures::stream;
use iced::Task;
use rfd::{AsyncMessageDialog, MessageButtons, MessageLevel};
use tokio::sync::mpsc;

use stem_core::logging::MessagePrefix;
use stem_core::separation::{RunEvent, SeparationRunner};
use stem_core::session::Completion;

use crate::app::{App, Message};

impl App {
    /// Start a separation run for the current selection.
    pub fn start_separation(&mut self) -> Task<Message> {
        let Some(request) = self.session.begin_run() else {
            self.append_log(&MessagePrefix::Warning.format(
                "Select an audio file and an output folder first",
            ));
            return Task::none();
        };
        let run_id = request.run_id;

        let (tool, error_tail) = {
            let cfg = self.config.lock();
            let settings = cfg.settings();
            (settings.tool.clone(), settings.logging.error_tail as usize)
        };

        self.progress_log.reset();
        self.append_log(&MessagePrefix::Phase.format("Starting Separation"));
        self.append_log(&format!("Input: {}", request.input_file.display()));
        self.append_log(&format!("Output: {}", request.output_dir.display()));

        let (tx, rx) = mpsc::unbounded_channel();
        let spawned = thread::Builder::new()
            .name(format!("separation-{}", run_id))
            .spawn(move || {
                let runner = SeparationRunner::new(tool, error_tail);
                runner.run(&request.input_file, &request.output_dir, |event| {
                    // Receiver is gone only if the window closed
                    let _ = tx.send(event);
                });
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn separation thread: {}", e);
            return match self
                .session
                .abort(run_id, format!("Could not start worker thread: {}", e))
            {
                Some(completion) => self.finish_run(completion),
                None => Task::none(),
            };
        }

        let events = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Task::run(events, move |event| Message::Runner { run_id, event })
            .chain(Task::done(Message::RunnerStopped(run_id)))
    }

    /// Handle one event from a runner thread.
    pub fn handle_runner_event(&mut self, run_id: u64, event: RunEvent) -> Task<Message> {
        match event {
            RunEvent::Started { command_line } => {
                if run_id == self.session.current_run() {
                    self.append_log(&MessagePrefix::Command.format(&command_line));
                }
                Task::none()
            }
            RunEvent::Progress(pct) => {
                if self.session.apply_progress(run_id, pct)
                    && self.progress_log.should_log(u32::from(pct))
                {
                    self.append_log(&format!("Progress: {}%", pct));
                }
                Task::none()
            }
            RunEvent::Completed(result) => match self.session.complete(run_id, &result) {
                Some(completion) => self.finish_run(completion),
                None => {
                    tracing::debug!("Ignoring completion for stale run {}", run_id);
                    Task::none()
                }
            },
        }
    }

    /// The runner's event stream ended. Fails the run if it never completed.
    pub fn handle_runner_stopped(&mut self, run_id: u64) -> Task<Message> {
        match self
            .session
            .abort(run_id, "Separation worker stopped without reporting a result")
        {
            Some(completion) => {
                tracing::error!("Run {} ended without a completion event", run_id);
                self.finish_run(completion)
            }
            None => Task::none(),
        }
    }

    /// Log the outcome and show the completion dialog.
    fn finish_run(&mut self, completion: Completion) -> Task<Message> {
        let (level, title) = match &completion {
            Completion::Succeeded { stems_dir } => {
                self.append_log(&MessagePrefix::Success.format(&format!(
                    "Stems written under {}",
                    stems_dir.display()
                )));
                (MessageLevel::Info, "Success")
            }
            Completion::Failed { detail, tail } => {
                self.append_log(&MessagePrefix::Error.format(detail));
                for line in tail {
                    self.append_log(&format!("  | {}", line));
                }
                (MessageLevel::Error, "Error")
            }
        };

        let description = completion.dialog_message();
        Task::perform(
            async move {
                AsyncMessageDialog::new()
                    .set_level(level)
                    .set_title(title)
                    .set_description(description)
                    .set_buttons(MessageButtons::Ok)
                    .show()
                    .await
            },
            |_| Message::DialogClosed,
        )
    }
}
