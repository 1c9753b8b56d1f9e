use std::io::{self, Write};
use std::sync::Arc;

use super::done::DoneSignal;
use super::{DynamicRenderer, Renderer};

/// A dynamic root followed by renderers drawn in fixed order after it.
/// The tree finishes when the root does; trailing renderers have no lifecycle.
pub struct Tree {
    root: Arc<dyn DynamicRenderer>,
    children: Vec<Arc<dyn Renderer>>,
}

impl Tree {
    pub fn compose(root: Arc<dyn DynamicRenderer>, children: Vec<Arc<dyn Renderer>>) -> Self {
        Self { root, children }
    }
}

impl Renderer for Tree {
    fn render(&self, out: &mut dyn Write) -> io::Result<usize> {
        let mut lines = self.root.render(out)?;
        for child in &self.children {
            lines += child.render(out)?;
        }
        Ok(lines)
    }
}

impl DynamicRenderer for Tree {
    fn done(&self) -> DoneSignal {
        self.root.done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::done::DoneLatch;
    use crate::progress::text::LineComponent;
    use crate::testing::plain_opts;

    struct Root {
        done: DoneSignal,
    }

    impl Renderer for Root {
        fn render(&self, out: &mut dyn Write) -> io::Result<usize> {
            writeln!(out, "root")?;
            Ok(1)
        }
    }

    impl DynamicRenderer for Root {
        fn done(&self) -> DoneSignal {
            self.done.clone()
        }
    }

    #[test]
    fn test_root_then_children_in_order() {
        let (_latch, done) = DoneLatch::new();
        let tree = Tree::compose(
            Arc::new(Root { done }),
            vec![
                Arc::new(LineComponent::new("first", plain_opts())),
                Arc::new(LineComponent::new("second", plain_opts())),
            ],
        );
        let mut out = Vec::new();
        assert_eq!(tree.render(&mut out).unwrap(), 3);
        assert_eq!(String::from_utf8(out).unwrap(), "root\nfirst\nsecond\n");
    }

    #[test]
    fn test_done_follows_root() {
        let (latch, done) = DoneLatch::new();
        let tree = Tree::compose(
            Arc::new(Root { done }),
            vec![Arc::new(LineComponent::new("footer", plain_opts()))],
        );
        assert!(!tree.done().is_done());
        latch.fire();
        assert!(tree.done().is_done());
    }
}
