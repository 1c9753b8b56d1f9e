//! Renderer for a whole stack: its own row followed by its resources.

use std::io::{self, Write};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::done::{wait_all, DoneLatch, DoneSignal};
use super::resource::ResourceComponent;
use super::{DynamicRenderer, RenderOptions, Renderer};
use crate::stack::event::StackEvent;

pub struct StackComponent {
    stack: ResourceComponent,
    resources: Vec<Arc<dyn DynamicRenderer>>,
    done: DoneSignal,
}

impl StackComponent {
    /// `resources` should be built with `opts.nested()` so they indent under
    /// the stack row. Must be called inside a tokio runtime.
    pub fn new(
        stack_name: impl Into<String>,
        description: impl Into<String>,
        events: mpsc::UnboundedReceiver<StackEvent>,
        resources: Vec<Arc<dyn DynamicRenderer>>,
        opts: RenderOptions,
    ) -> Self {
        let stack = ResourceComponent::new(stack_name, description, events, opts);
        let (latch, done) = DoneLatch::new();

        let mut signals: Vec<DoneSignal> = resources.iter().map(|r| r.done()).collect();
        signals.push(stack.done());
        tokio::spawn(async move {
            wait_all(signals).await;
            latch.fire();
        });

        Self {
            stack,
            resources,
            done,
        }
    }

    pub fn stack(&self) -> &ResourceComponent {
        &self.stack
    }
}

impl Renderer for StackComponent {
    fn render(&self, out: &mut dyn Write) -> io::Result<usize> {
        let mut lines = self.stack.render(out)?;
        for resource in &self.resources {
            lines += resource.render(out)?;
        }
        Ok(lines)
    }
}

impl DynamicRenderer for StackComponent {
    fn done(&self) -> DoneSignal {
        self.done.clone()
    }
}
