//! Stem Core - Backend logic for Stem Splitter
//!
//! This crate contains all business logic with zero UI dependencies:
//! configuration, logging, the separation runner that drives the external
//! tool, and the session state machine the GUI renders.

pub mod config;
pub mod logging;
pub mod separation;
pub mod session;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
