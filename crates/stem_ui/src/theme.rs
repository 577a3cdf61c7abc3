//! Theme configuration for Stem Splitter.
//!
//! Colors and sizing shared by the views.

use iced::Color;

use stem_core::session::RunState;

/// Application colors.
pub mod colors {
    use super::Color;

    /// Text primary
    pub const TEXT_PRIMARY: Color = Color::from_rgb(0.93, 0.93, 0.93);

    /// Placeholder text for empty selections
    pub const TEXT_MUTED: Color = Color::from_rgb(0.50, 0.50, 0.50);

    /// Finished successfully
    pub const SUCCESS: Color = Color::from_rgb(0.30, 0.65, 0.30);

    /// Run in progress
    pub const WARNING: Color = Color::from_rgb(0.80, 0.70, 0.25);

    /// Run failed
    pub const ERROR: Color = Color::from_rgb(0.80, 0.30, 0.30);
}

/// Status text colors.
pub mod status {
    use super::{colors, Color, RunState};

    pub fn for_state(state: RunState) -> Color {
        match state {
            RunState::Idle => colors::TEXT_PRIMARY,
            RunState::Running => colors::WARNING,
            RunState::Succeeded => colors::SUCCESS,
            RunState::Failed => colors::ERROR,
        }
    }
}

/// Spacing constants.
pub mod spacing {
    /// Extra small spacing (4px)
    pub const XS: f32 = 4.0;
    /// Small spacing (8px)
    pub const SM: f32 = 8.0;
    /// Medium spacing (12px)
    pub const MD: f32 = 12.0;
    /// Large spacing (16px)
    pub const LG: f32 = 16.0;
    /// Extra large spacing (24px)
    pub const XL: f32 = 24.0;
}

/// Font sizes.
pub mod font {
    /// Small font size (log panel)
    pub const SM: f32 = 11.0;
    /// Normal font size
    pub const NORMAL: f32 = 13.0;
    /// Large font size
    pub const LG: f32 = 16.0;
}
