//! Progress extraction from the separation tool's log output.
//!
//! The tool prints human-readable progress bars, usually redrawn in place
//! with carriage returns. There is no schema: a line either carries a
//! `NN%` token or it does not, and most lines do not.

use once_cell::sync::Lazy;
use regex::Regex;

static PERCENT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,3})%").expect("progress pattern is valid")
});

/// Extract a progress percentage from one line of tool output.
///
/// Returns the leftmost `\d{1,3}%` token as an integer. Values above 100
/// (and lines without a token) yield `None`.
pub fn parse_progress(line: &str) -> Option<u8> {
    let caps = PERCENT_TOKEN.captures(line)?;
    let value: u16 = caps.get(1)?.as_str().parse().ok()?;
    if value > 100 {
        return None;
    }
    Some(value as u8)
}

/// Splits a byte stream into text lines.
///
/// Both `\n` and `\r` end a line, so a progress bar redrawn with `\r`
/// produces one line per redraw. Invalid UTF-8 is dropped rather than
/// reported. Blank lines are skipped.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if let Some(line) = self.take_line() {
                    lines.push(line);
                }
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Flush the unterminated remainder at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        self.take_line()
    }

    fn take_line(&mut self) -> Option<String> {
        let bytes = std::mem::take(&mut self.pending);
        let line = decode_ignoring_invalid(&bytes);
        if line.trim().is_empty() {
            None
        } else {
            Some(line)
        }
    }
}

/// Decode UTF-8, silently skipping malformed byte sequences.
pub fn decode_ignoring_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                if let Ok(valid) = std::str::from_utf8(valid) {
                    out.push_str(valid);
                }
                // error_len is None for a sequence truncated at the end
                let skip = e.error_len().unwrap_or(rest.len());
                bytes = &rest[skip..];
            }
        }
    }
}
