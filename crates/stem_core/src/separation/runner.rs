//! Separation runner: drives one external tool process to completion.
//!
//! The runner is blocking and meant to live on its own thread. It reports
//! through a callback:
//!
//! ```text
//! Started ─► Progress(n)* ─► Completed(Ok | Err)
//! ```
//!
//! `Completed` is emitted exactly once, after the process has exited and
//! every output line has been drained. A launch failure skips `Started`.
//!
//! Standard output and standard error share one pipe, so lines arrive in
//! the order the tool wrote them.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::config::ToolSettings;

use super::command::{stems_dir, SeparationCommand};
use super::errors::{RunFailure, SeparationError, SeparationFailure, SeparationResult};
use super::progress::{parse_progress, LineSplitter};

/// Read buffer size for tool output pipes.
const READ_CHUNK: usize = 4096;

/// Event reported by a running separation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The tool process was spawned.
    Started { command_line: String },
    /// A progress percentage was parsed from the tool output.
    Progress(u8),
    /// The run finished. Always the last event.
    Completed(Result<RunSummary, SeparationFailure>),
}

/// Details of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Where the tool writes the stems.
    pub stems_dir: PathBuf,
    /// Number of non-blank output lines read.
    pub lines_read: usize,
}

/// Starts the separation tool.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, command: &SeparationCommand) -> SeparationResult<Box<dyn ToolProcess>>;
}

/// A spawned tool process.
pub trait ToolProcess: Send {
    /// Take the merged stdout/stderr stream. Called once, right after launch.
    fn take_output(&mut self) -> SeparationResult<Box<dyn Read + Send>>;

    /// Block until the process exits. `None` means there is no exit code
    /// (terminated by a signal).
    fn wait(&mut self) -> io::Result<Option<i32>>;

    /// Kill the process.
    fn kill(&mut self) -> io::Result<()>;
}

/// Launches the tool with `std::process::Command`, stdout and stderr merged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, command: &SeparationCommand) -> SeparationResult<Box<dyn ToolProcess>> {
        let mut process = Command::new(command.program());
        process.args(command.args());
        spawn_merged(process, command.program())
    }
}

/// Spawn `command` with stdout and stderr writing into the same pipe.
fn spawn_merged(mut command: Command, program: &str) -> SeparationResult<Box<dyn ToolProcess>> {
    let (reader, writer) = io::pipe()?;
    let stderr_writer = writer.try_clone()?;

    let child = command
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr_writer)
        .spawn()
        .map_err(|e| SeparationError::launch(program, e))?;

    // Parent copies of the write end must close, or the reader never sees EOF
    drop(command);

    tracing::debug!("Spawned {} (pid {})", program, child.id());
    Ok(Box::new(SystemProcess {
        child,
        output: Some(reader),
    }))
}

struct SystemProcess {
    child: Child,
    output: Option<io::PipeReader>,
}

impl ToolProcess for SystemProcess {
    fn take_output(&mut self) -> SeparationResult<Box<dyn Read + Send>> {
        let output = self
            .output
            .take()
            .ok_or(SeparationError::OutputUnavailable("output"))?;
        Ok(Box::new(output))
    }

    fn wait(&mut self) -> io::Result<Option<i32>> {
        Ok(self.child.wait()?.code())
    }

    fn kill(&mut self) -> io::Result<()> {
        self.child.kill()
    }
}

/// Bounded buffer of the most recent output lines.
#[derive(Debug)]
pub struct OutputTail {
    capacity: usize,
    lines: VecDeque<String>,
}

impl OutputTail {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity.min(256)),
        }
    }

    pub fn push(&mut self, line: &str) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

/// Runs the separation tool for one input file at a time.
///
/// Stateless between runs; overlapping runs are prevented by the caller.
pub struct SeparationRunner<L = SystemLauncher> {
    launcher: L,
    tool: ToolSettings,
    error_tail: usize,
}

impl SeparationRunner<SystemLauncher> {
    /// Runner that spawns real processes.
    pub fn new(tool: ToolSettings, error_tail: usize) -> Self {
        Self::with_launcher(SystemLauncher, tool, error_tail)
    }
}

impl<L: ProcessLauncher> SeparationRunner<L> {
    /// Runner with a custom launcher.
    pub fn with_launcher(launcher: L, tool: ToolSettings, error_tail: usize) -> Self {
        Self {
            launcher,
            tool,
            error_tail,
        }
    }

    /// Separate `input_file` into `output_dir`, reporting through `on_event`.
    ///
    /// Blocks until the tool exits. Never panics on tool or I/O failure;
    /// every failure ends in a single `Completed(Err(..))`.
    pub fn run<F>(&self, input_file: &Path, output_dir: &Path, mut on_event: F)
    where
        F: FnMut(RunEvent),
    {
        let command = SeparationCommand::new(&self.tool, input_file, output_dir);
        let mut tail = OutputTail::new(self.error_tail);

        let result = self.execute(&command, &mut tail, &mut on_event);

        match &result {
            Ok(summary) => tracing::info!(
                "Separation finished: {} lines read, stems under {}",
                summary.lines_read,
                summary.stems_dir.display()
            ),
            Err(failure) => {
                tracing::warn!("Separation failed: {}", failure);
                for line in &failure.tail {
                    tracing::warn!("  | {}", line);
                }
            }
        }

        on_event(RunEvent::Completed(result));
    }

    fn execute<F>(
        &self,
        command: &SeparationCommand,
        tail: &mut OutputTail,
        on_event: &mut F,
    ) -> Result<RunSummary, SeparationFailure>
    where
        F: FnMut(RunEvent),
    {
        tracing::info!("Launching separation: {}", command);

        let mut process = self
            .launcher
            .launch(command)
            .map_err(|e| SeparationFailure::new(e.into(), Vec::new()))?;

        on_event(RunEvent::Started {
            command_line: command.to_string(),
        });

        let mut output = match process.take_output() {
            Ok(output) => output,
            Err(e) => {
                reap(process.as_mut());
                return Err(SeparationFailure::new(e.into(), Vec::new()));
            }
        };

        let mut lines_read = 0usize;
        let mut handle_line = |line: String| {
            lines_read += 1;
            tracing::trace!("tool> {}", line);
            if let Some(pct) = parse_progress(&line) {
                on_event(RunEvent::Progress(pct));
            }
            tail.push(&line);
        };

        let mut splitter = LineSplitter::new();
        let mut buf = [0u8; READ_CHUNK];
        let read_error = loop {
            match output.read(&mut buf) {
                Ok(0) => {
                    if let Some(line) = splitter.finish() {
                        handle_line(line);
                    }
                    break None;
                }
                Ok(n) => {
                    for line in splitter.push(&buf[..n]) {
                        handle_line(line);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Some(e),
            }
        };
        drop(output);

        if let Some(e) = &read_error {
            tracing::error!("Reading tool output failed: {}", e);
            if let Err(kill_err) = process.kill() {
                tracing::debug!("Kill after read failure: {}", kill_err);
            }
        }

        let status = process.wait();

        if let Some(e) = read_error {
            return Err(SeparationFailure::new(
                SeparationError::Io(e).into(),
                tail.lines(),
            ));
        }

        match status {
            Ok(Some(0)) => Ok(RunSummary {
                stems_dir: stems_dir(command.output_dir()),
                lines_read,
            }),
            Ok(Some(code)) => Err(SeparationFailure::new(RunFailure::ExitCode(code), tail.lines())),
            Ok(None) => Err(SeparationFailure::new(RunFailure::Terminated, tail.lines())),
            Err(e) => Err(SeparationFailure::new(
                SeparationError::Io(e).into(),
                tail.lines(),
            )),
        }
    }
}

/// Kill and wait, so no process outlives a failed run.
fn reap(process: &mut dyn ToolProcess) {
    if let Err(e) = process.kill() {
        tracing::debug!("Kill failed (process may have exited): {}", e);
    }
    if let Err(e) = process.wait() {
        tracing::warn!("Wait after kill failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use crate::logging::init_test_tracing;

    /// What a scripted stream produces.
    #[derive(Clone)]
    enum Script {
        Bytes(Vec<u8>),
        FailAfter(Vec<u8>),
    }

    struct ScriptedLauncher {
        output: Script,
        exit: Option<i32>,
        launch_error: Option<io::ErrorKind>,
        killed: Arc<AtomicBool>,
        waited: Arc<AtomicBool>,
    }

    impl ScriptedLauncher {
        fn new(output: Script, exit: Option<i32>) -> Self {
            Self {
                output,
                exit,
                launch_error: None,
                killed: Arc::new(AtomicBool::new(false)),
                waited: Arc::new(AtomicBool::new(false)),
            }
        }

        fn lines(lines: &[&str], exit: i32) -> Self {
            let mut bytes = Vec::new();
            for line in lines {
                bytes.extend_from_slice(line.as_bytes());
                bytes.push(b'\n');
            }
            Self::new(Script::Bytes(bytes), Some(exit))
        }

        fn failing_launch(kind: io::ErrorKind) -> Self {
            Self {
                launch_error: Some(kind),
                ..Self::new(Script::Bytes(Vec::new()), Some(0))
            }
        }
    }

    impl ProcessLauncher for ScriptedLauncher {
        fn launch(&self, command: &SeparationCommand) -> SeparationResult<Box<dyn ToolProcess>> {
            if let Some(kind) = self.launch_error {
                return Err(SeparationError::launch(
                    command.program(),
                    io::Error::new(kind, "No such file or directory"),
                ));
            }
            Ok(Box::new(ScriptedProcess {
                output: Some(self.output.clone()),
                exit: self.exit,
                killed: Arc::clone(&self.killed),
                waited: Arc::clone(&self.waited),
            }))
        }
    }

    struct ScriptedProcess {
        output: Option<Script>,
        exit: Option<i32>,
        killed: Arc<AtomicBool>,
        waited: Arc<AtomicBool>,
    }

    impl ToolProcess for ScriptedProcess {
        fn take_output(&mut self) -> SeparationResult<Box<dyn Read + Send>> {
            let script = self
                .output
                .take()
                .ok_or(SeparationError::OutputUnavailable("output"))?;
            Ok(match script {
                Script::Bytes(bytes) => Box::new(Cursor::new(bytes)),
                Script::FailAfter(bytes) => Box::new(FailingReader {
                    data: Cursor::new(bytes),
                }),
            })
        }

        fn wait(&mut self) -> io::Result<Option<i32>> {
            self.waited.store(true, Ordering::SeqCst);
            Ok(self.exit)
        }

        fn kill(&mut self) -> io::Result<()> {
            self.killed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Yields its data, then an I/O error instead of EOF.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::other("pipe exploded")),
                n => Ok(n),
            }
        }
    }

    fn collect(launcher: ScriptedLauncher) -> (Vec<RunEvent>, Arc<AtomicBool>, Arc<AtomicBool>) {
        init_test_tracing();
        let killed = Arc::clone(&launcher.killed);
        let waited = Arc::clone(&launcher.waited);
        let runner = SeparationRunner::with_launcher(launcher, ToolSettings::default(), 5);
        let mut events = Vec::new();
        runner.run(Path::new("song.mp3"), Path::new("/out"), |e| events.push(e));
        (events, killed, waited)
    }

    fn progress_values(events: &[RunEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn completions(events: &[RunEvent]) -> Vec<&Result<RunSummary, SeparationFailure>> {
        events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Completed(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn progress_lines_reported_in_order() {
        let launcher =
            ScriptedLauncher::lines(&["frame 10%", "no match here", "frame 55%", "frame 100%"], 0);
        let (events, _, _) = collect(launcher);

        assert_eq!(progress_values(&events), vec![10, 55, 100]);
        assert!(matches!(events.first(), Some(RunEvent::Started { .. })));
        assert!(matches!(events.last(), Some(RunEvent::Completed(_))));
    }

    #[test]
    fn exit_zero_completes_once_with_success() {
        let (events, killed, waited) = collect(ScriptedLauncher::lines(&["50%", "done"], 0));

        let done = completions(&events);
        assert_eq!(done.len(), 1);
        let summary = done[0].as_ref().unwrap();
        assert_eq!(summary.stems_dir, PathBuf::from("/out/separated"));
        assert_eq!(summary.lines_read, 2);
        assert!(waited.load(Ordering::SeqCst));
        assert!(!killed.load(Ordering::SeqCst));
    }

    #[test]
    fn nonzero_exit_reports_code_and_tail() {
        let lines: Vec<String> = (0..8).map(|i| format!("line {}", i)).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let (events, _, _) = collect(ScriptedLauncher::lines(&refs, 1));

        let done = completions(&events);
        assert_eq!(done.len(), 1);
        let failure = done[0].as_ref().unwrap_err();
        assert_eq!(failure.reason, RunFailure::ExitCode(1));
        // Tail capacity is 5
        assert_eq!(failure.tail, vec!["line 3", "line 4", "line 5", "line 6", "line 7"]);
    }

    #[test]
    fn signal_termination_is_a_failure() {
        let (events, _, _) = collect(ScriptedLauncher::new(Script::Bytes(Vec::new()), None));
        let done = completions(&events);
        assert_eq!(done[0].as_ref().unwrap_err().reason, RunFailure::Terminated);
    }

    #[test]
    fn launch_error_completes_once_without_start() {
        let (events, killed, waited) =
            collect(ScriptedLauncher::failing_launch(io::ErrorKind::NotFound));

        assert_eq!(events.len(), 1);
        match &events[0] {
            RunEvent::Completed(Err(failure)) => match &failure.reason {
                RunFailure::Launch(text) => {
                    assert!(text.contains("demucs"));
                    assert!(text.contains("No such file or directory"));
                }
                other => panic!("expected launch failure, got {:?}", other),
            },
            other => panic!("expected completion, got {:?}", other),
        }
        assert!(!killed.load(Ordering::SeqCst));
        assert!(!waited.load(Ordering::SeqCst));
    }

    #[test]
    fn read_failure_kills_and_reaps_process() {
        let launcher = ScriptedLauncher::new(Script::FailAfter(b"noise\n 20%\n".to_vec()), Some(0));
        let (events, killed, waited) = collect(launcher);

        assert_eq!(progress_values(&events), vec![20]);
        let done = completions(&events);
        assert_eq!(done.len(), 1);
        match &done[0].as_ref().unwrap_err().reason {
            RunFailure::Io(text) => assert!(text.contains("pipe exploded")),
            other => panic!("expected io failure, got {:?}", other),
        }
        assert!(killed.load(Ordering::SeqCst));
        assert!(waited.load(Ordering::SeqCst));
    }

    #[test]
    fn carriage_return_bars_reported_in_write_order() {
        let launcher = ScriptedLauncher::new(
            Script::Bytes(b"  5%|#\r 30%|###\rwarning: slow\n 60%\n 45%\n".to_vec()),
            Some(0),
        );
        let (events, _, _) = collect(launcher);

        assert_eq!(progress_values(&events), vec![5, 30, 60, 45]);
        match events.last() {
            Some(RunEvent::Completed(Ok(summary))) => assert_eq!(summary.lines_read, 5),
            other => panic!("expected success last, got {:?}", other),
        }
    }

    #[test]
    fn runner_is_reusable_between_runs() {
        init_test_tracing();
        let runner = SeparationRunner::with_launcher(
            ScriptedLauncher::lines(&["90%"], 0),
            ToolSettings::default(),
            5,
        );
        for _ in 0..2 {
            let mut events = Vec::new();
            runner.run(Path::new("a.wav"), Path::new("out"), |e| events.push(e));
            assert_eq!(progress_values(&events), vec![90]);
            assert_eq!(completions(&events).len(), 1);
        }
    }

    #[test]
    fn output_tail_is_bounded() {
        let mut tail = OutputTail::new(2);
        tail.push("a");
        tail.push("b");
        tail.push("c");
        assert_eq!(tail.lines(), vec!["b", "c"]);

        let mut none = OutputTail::new(0);
        none.push("a");
        assert!(none.lines().is_empty());
    }

    #[cfg(unix)]
    mod system {
        use super::*;

        fn tool(command: &str) -> ToolSettings {
            ToolSettings {
                command: command.to_string(),
                ..ToolSettings::default()
            }
        }

        fn run_system(command: &str) -> Vec<RunEvent> {
            init_test_tracing();
            let runner = SeparationRunner::new(tool(command), 10);
            let mut events = Vec::new();
            runner.run(Path::new("in.wav"), Path::new("out"), |e| events.push(e));
            events
        }

        /// Runs an inline shell script instead of the configured tool.
        struct ShellLauncher {
            script: &'static str,
        }

        impl ProcessLauncher for ShellLauncher {
            fn launch(&self, _command: &SeparationCommand) -> SeparationResult<Box<dyn ToolProcess>> {
                let mut command = Command::new("sh");
                command.arg("-c").arg(self.script);
                spawn_merged(command, "sh")
            }
        }

        #[test]
        fn interleaved_stdout_and_stderr_keep_write_order() {
            init_test_tracing();
            let script = r#"i=1
while [ "$i" -le 39 ]; do
  echo "$i%"
  echo "$((i + 1))%" >&2
  i=$((i + 2))
done
exit 3"#;
            let runner =
                SeparationRunner::with_launcher(ShellLauncher { script }, ToolSettings::default(), 4);
            let expected: Vec<u8> = (1..=40).collect();

            for _ in 0..5 {
                let mut events = Vec::new();
                runner.run(Path::new("in.wav"), Path::new("out"), |e| events.push(e));

                assert_eq!(progress_values(&events), expected);
                match events.last() {
                    Some(RunEvent::Completed(Err(failure))) => {
                        assert_eq!(failure.reason, RunFailure::ExitCode(3));
                        assert_eq!(failure.tail, vec!["37%", "38%", "39%", "40%"]);
                    }
                    other => panic!("expected exit code failure, got {:?}", other),
                }
            }
        }

        #[test]
        fn missing_program_is_launch_failure() {
            let events = run_system("definitely-not-a-separation-tool-3f9c");
            assert_eq!(events.len(), 1);
            match &events[0] {
                RunEvent::Completed(Err(failure)) => match &failure.reason {
                    RunFailure::Launch(text) => {
                        assert!(text.contains("definitely-not-a-separation-tool-3f9c"))
                    }
                    other => panic!("expected launch failure, got {:?}", other),
                },
                other => panic!("expected completion, got {:?}", other),
            }
        }

        #[test]
        fn real_process_exit_codes() {
            // `true` and `false` ignore their arguments
            let ok = run_system("true");
            assert!(matches!(ok.last(), Some(RunEvent::Completed(Ok(_)))));

            let failed = run_system("false");
            match failed.last() {
                Some(RunEvent::Completed(Err(failure))) => {
                    assert_eq!(failure.reason, RunFailure::ExitCode(1))
                }
                other => panic!("expected exit code failure, got {:?}", other),
            }
        }
    }
}
