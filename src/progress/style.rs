//! Status glyphs and colors for rendered rows.

use std::time::Duration;

use crossterm::style::{Color, Stylize};

use crate::stack::event::StatusCode;
use crate::util::single_line;

/// Braille spinner frames, advanced every [`FRAME_MS`].
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_MS: u128 = 80;

pub fn spinner_frame(elapsed: Duration) -> &'static str {
    let index = (elapsed.as_millis() / FRAME_MS) as usize % SPINNER_FRAMES.len();
    SPINNER_FRAMES[index]
}

fn status_color(status: &StatusCode) -> Color {
    if status.is_failure() || status.is_rolled_back() {
        Color::Red
    } else if status.is_success() {
        Color::Green
    } else if status.is_in_progress() {
        Color::Cyan
    } else {
        Color::DarkGrey
    }
}

/// Glyph plus label, e.g. `✔ create complete`.
pub fn status_cell(status: &StatusCode, elapsed: Duration, color: bool) -> String {
    let glyph = if (status.is_failure() && status.is_terminal()) || status.is_rolled_back() {
        "✘"
    } else if status.is_success() {
        "✔"
    } else if status.is_in_progress() {
        spinner_frame(elapsed)
    } else {
        "·"
    };
    let cell = format!("{} {}", glyph, single_line(&status.label()));
    if color {
        cell.with(status_color(status)).to_string()
    } else {
        cell
    }
}

/// Whole-second elapsed time in parentheses, e.g. `(1m 5s)`.
pub fn elapsed_cell(elapsed: Duration) -> String {
    let whole = Duration::from_secs(elapsed.as_secs());
    format!("({})", humantime::format_duration(whole))
}

pub fn failure_text(text: &str, color: bool) -> String {
    if color {
        text.with(Color::Red).to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_cell_plain() {
        assert_eq!(
            status_cell(&StatusCode::CreateComplete, Duration::ZERO, false),
            "✔ create complete"
        );
        assert_eq!(
            status_cell(&StatusCode::UpdateFailed, Duration::ZERO, false),
            "✘ update failed"
        );
        assert_eq!(
            status_cell(&StatusCode::NotStarted, Duration::ZERO, false),
            "· not started"
        );
    }

    #[test]
    fn test_rolled_back_reads_as_failure() {
        assert_eq!(
            status_cell(&StatusCode::RollbackComplete, Duration::ZERO, false),
            "✘ rollback complete"
        );
        assert_eq!(
            status_cell(&StatusCode::UpdateRollbackComplete, Duration::ZERO, false),
            "✘ update rollback complete"
        );
        assert_eq!(status_color(&StatusCode::UpdateRollbackComplete), Color::Red);
    }

    #[test]
    fn test_unknown_label_stays_on_one_line() {
        let status = StatusCode::Unknown("IMPORT\nCOMPLETE".to_string());
        let cell = status_cell(&status, Duration::ZERO, false);
        assert!(!cell.contains('\n'));
        assert_eq!(cell, "· import complete");
    }

    #[test]
    fn test_status_cell_spins_while_in_progress() {
        let first = status_cell(&StatusCode::CreateInProgress, Duration::ZERO, false);
        let later = status_cell(&StatusCode::CreateInProgress, Duration::from_millis(80), false);
        assert_eq!(first, "⠋ create in progress");
        assert_eq!(later, "⠙ create in progress");
    }

    #[test]
    fn test_status_cell_colored() {
        let cell = status_cell(&StatusCode::CreateComplete, Duration::ZERO, true);
        assert!(cell.starts_with('\x1b'));
        assert_eq!(crate::util::strip_ansi(&cell), "✔ create complete");
    }

    #[test]
    fn test_elapsed_cell() {
        assert_eq!(elapsed_cell(Duration::from_millis(5_400)), "(5s)");
        assert_eq!(elapsed_cell(Duration::from_secs(65)), "(1m 5s)");
        assert_eq!(elapsed_cell(Duration::ZERO), "(0s)");
    }
}
