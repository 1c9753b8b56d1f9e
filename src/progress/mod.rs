//! Live deployment progress rendering.
//!
//! Listener tasks fold stream events into per-component state behind a
//! mutex; the driver periodically renders a snapshot of the whole tree and
//! redraws it in place.

pub mod done;
pub mod driver;
pub mod resource;
pub mod rollout;
pub mod service;
pub mod stack;
pub mod stopwatch;
pub mod style;
pub mod text;
pub mod tree;

use std::io::{self, Write};

pub use done::{DoneLatch, DoneSignal};
pub use driver::drive;
pub use resource::ResourceComponent;
pub use rollout::RollingUpdateComponent;
pub use service::ServiceDeploymentComponent;
pub use stack::StackComponent;
pub use text::{LineComponent, TableComponent};
pub use tree::Tree;

/// Anything that can write its current state as lines of text.
pub trait Renderer: Send + Sync {
    /// Writes the renderer's lines to `out` and returns how many it wrote.
    fn render(&self, out: &mut dyn Write) -> io::Result<usize>;
}

/// A renderer backed by a live stream, which eventually finishes.
pub trait DynamicRenderer: Renderer {
    fn done(&self) -> DoneSignal;
}

/// Renders nothing and is always done. Stands in for a nested renderer
/// that has not been spawned yet.
pub struct NoopComponent;

impl Renderer for NoopComponent {
    fn render(&self, _out: &mut dyn Write) -> io::Result<usize> {
        Ok(0)
    }
}

impl DynamicRenderer for NoopComponent {
    fn done(&self) -> DoneSignal {
        DoneSignal::fired()
    }
}

/// Layout knobs shared by every component in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Spaces before this component's lines.
    pub padding: usize,
    /// Extra spaces each nesting level adds.
    pub indent: usize,
    /// Column at which failure reasons wrap.
    pub wrap_width: usize,
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            padding: 0,
            indent: 2,
            wrap_width: 100,
            color: true,
        }
    }
}

impl RenderOptions {
    /// Options for a component nested one level below this one.
    pub fn nested(&self) -> Self {
        Self {
            padding: self.padding + self.indent,
            ..*self
        }
    }

    pub fn pad(&self) -> String {
        " ".repeat(self.padding)
    }
}
