//! Message handlers for the App.
//!
//! Each submodule adds an `impl App` block for one area of the window.

mod browse;
mod separation;
