//! Application pages.

pub mod main_window;
