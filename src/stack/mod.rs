//! Stack events, subscription plumbing and recorded-deployment replay.

pub mod event;
pub mod replay;
pub mod rollout;
pub mod stream;
pub mod tasks;

pub use event::{StackEvent, StatusCode};
pub use rollout::ServiceSnapshot;
pub use stream::{EventFanout, RolloutStreams};
pub use tasks::TaskGroup;
