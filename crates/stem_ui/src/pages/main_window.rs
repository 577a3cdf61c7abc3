//! Main window view.
//!
//! Two selection steps, the split button, progress and the log panel.

use iced::alignment::Vertical;
use iced::widget::{button, column, container, progress_bar, row, scrollable, text};
use iced::{Element, Length};

use crate::app::{App, Message};
use crate::theme::{colors, font, spacing, status};

/// Build the main window view.
pub fn view(app: &App) -> Element<'_, Message> {
    let content = column![
        input_step(app),
        output_step(app),
        split_row(app),
        progress_section(app),
        log_section(app),
    ]
    .spacing(spacing::MD)
    .padding(spacing::LG);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Step 1: input audio file.
fn input_step(app: &App) -> Element<'_, Message> {
    let selected = app.session.selection().input_file.is_some();
    step_section(
        "Step 1: Select an audio file",
        "Browse File...",
        Message::BrowseInput,
        app.session.input_label(),
        selected,
    )
}

/// Step 2: output folder.
fn output_step(app: &App) -> Element<'_, Message> {
    let selected = app.session.selection().output_dir.is_some();
    step_section(
        "Step 2: Select output folder",
        "Browse Folder...",
        Message::BrowseOutput,
        app.session.output_label(),
        selected,
    )
}

fn step_section<'a>(
    heading: &'a str,
    button_label: &'a str,
    on_press: Message,
    path_label: String,
    selected: bool,
) -> Element<'a, Message> {
    let label_color = if selected {
        colors::TEXT_PRIMARY
    } else {
        colors::TEXT_MUTED
    };

    column![
        text(heading).size(font::LG),
        row![
            button(text(button_label).size(font::NORMAL))
                .on_press(on_press)
                .padding([spacing::XS, spacing::LG]),
            text(path_label).size(font::NORMAL).color(label_color),
        ]
        .spacing(spacing::MD)
        .align_y(Vertical::Center),
    ]
    .spacing(spacing::SM)
    .into()
}

/// Split Stems button, enabled only when the session allows a run.
fn split_row(app: &App) -> Element<'_, Message> {
    let split_button = button(text("Split Stems").size(font::LG))
        .on_press_maybe(app.session.can_run().then_some(Message::SplitStems))
        .padding([spacing::SM, spacing::XL]);

    container(split_button).center_x(Length::Fill).into()
}

/// Progress bar and status line.
fn progress_section(app: &App) -> Element<'_, Message> {
    column![
        progress_bar(0.0..=100.0, f32::from(app.session.progress())),
        text(app.session.status_text())
            .size(font::NORMAL)
            .color(status::for_state(app.session.run_state())),
    ]
    .spacing(spacing::XS)
    .into()
}

/// Scrollable log panel.
fn log_section(app: &App) -> Element<'_, Message> {
    let log = container(text(&app.log_text).size(font::SM))
        .padding(spacing::SM)
        .width(Length::Fill);

    column![
        text("Log").size(font::NORMAL),
        scrollable(log).height(Length::Fill),
    ]
    .spacing(spacing::XS)
    .height(Length::Fill)
    .into()
}
