//! Separation tool command line.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::ToolSettings;

/// Subdirectory of the output folder the tool writes its stems under.
pub const SEPARATED_SUBDIR: &str = "separated";

/// Where the tool is expected to place stems for a given output folder.
pub fn stems_dir(output_dir: &Path) -> PathBuf {
    output_dir.join(SEPARATED_SUBDIR)
}

/// A fully resolved invocation of the separation tool.
///
/// Arguments follow the tool's two-stem form:
/// `<program> --two-stems=<stem> [extra..] -o <output_dir> <input_file>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparationCommand {
    program: String,
    args: Vec<OsString>,
    output_dir: PathBuf,
}

impl SeparationCommand {
    /// Build the invocation for one input file.
    pub fn new(tool: &ToolSettings, input_file: &Path, output_dir: &Path) -> Self {
        let mut args: Vec<OsString> = Vec::with_capacity(tool.extra_args.len() + 4);
        args.push(format!("--two-stems={}", tool.two_stems).into());
        args.extend(tool.extra_args.iter().map(OsString::from));
        args.push("-o".into());
        args.push(output_dir.as_os_str().to_os_string());
        args.push(input_file.as_os_str().to_os_string());

        Self {
            program: tool.command.clone(),
            args,
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Program name or path.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments, in order.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Folder passed with `-o`.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl fmt::Display for SeparationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
