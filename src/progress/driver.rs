//! Redraws a render tree in place until it finishes or is cancelled.

use std::io::{self, Write};
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use crossterm::{cursor, execute, queue, terminal};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::text::align_columns;
use super::DynamicRenderer;
use crate::error::{Result, StackwatchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveOptions {
    /// Time between redraws.
    pub interval: Duration,
    /// Spaces between aligned columns.
    pub column_padding: usize,
}

impl Default for DriveOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
            column_padding: 2,
        }
    }
}

/// Hides the cursor for as long as it lives and shows it again on drop,
/// whichever way the drive loop exits.
struct HiddenCursor<'a, W: Write> {
    out: &'a mut W,
}

impl<'a, W: Write> HiddenCursor<'a, W> {
    fn acquire(out: &'a mut W) -> io::Result<Self> {
        execute!(out, cursor::Hide)?;
        Ok(Self { out })
    }
}

impl<W: Write> Deref for HiddenCursor<'_, W> {
    type Target = W;

    fn deref(&self) -> &W {
        self.out
    }
}

impl<W: Write> DerefMut for HiddenCursor<'_, W> {
    fn deref_mut(&mut self) -> &mut W {
        self.out
    }
}

impl<W: Write> Drop for HiddenCursor<'_, W> {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show);
    }
}

/// Tracks what the previous frame left on screen.
#[derive(Debug, Default)]
struct Frame {
    previous_lines: Option<usize>,
}

impl Frame {
    fn draw<W: Write>(
        &mut self,
        out: &mut W,
        tree: &dyn DynamicRenderer,
        column_padding: usize,
    ) -> io::Result<()> {
        // Render the whole frame before touching the screen.
        let mut buf = Vec::new();
        let lines = tree.render(&mut buf)?;
        let text = align_columns(&String::from_utf8_lossy(&buf), column_padding);

        if let Some(previous) = self.previous_lines {
            for _ in 0..previous {
                queue!(out, cursor::MoveUp(1), terminal::Clear(terminal::ClearType::CurrentLine))?;
            }
            queue!(out, cursor::MoveToColumn(0))?;
        }
        out.write_all(text.as_bytes())?;
        out.flush()?;
        self.previous_lines = Some(lines);
        Ok(())
    }
}

/// Redraws `tree` to `out` every `opts.interval` until the tree is done or
/// `cancel` fires, drawing one last frame either way.
///
/// Returns `Ok(())` when the tree finishes, [`StackwatchError::Cancelled`] on
/// cancellation, and the I/O error of the first failed frame otherwise.
pub async fn drive<W: Write>(
    cancel: &CancellationToken,
    out: &mut W,
    tree: &dyn DynamicRenderer,
    opts: DriveOptions,
) -> Result<()> {
    let mut out = HiddenCursor::acquire(out)?;
    let mut frame = Frame::default();
    let mut done = tree.done();
    let mut ticker = tokio::time::interval(opts.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_ms = opts.interval.as_millis() as u64, "Rendering deployment progress");
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                frame.draw(&mut *out, tree, opts.column_padding)?;
                debug!("Progress rendering cancelled");
                return Err(StackwatchError::Cancelled);
            }
            _ = done.wait() => {
                frame.draw(&mut *out, tree, opts.column_padding)?;
                debug!("Progress rendering finished");
                return Ok(());
            }
            _ = ticker.tick() => {
                frame.draw(&mut *out, tree, opts.column_padding)?;
            }
        }
    }
}
