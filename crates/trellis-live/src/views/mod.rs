//! Views mounted on a [`GraphObserver`](crate::GraphObserver).
//!
//! Each view owns a task that follows the observer's snapshots. Dropping the
//! view aborts the task, which releases its subscription.

mod backlinks;
mod graph;
mod overlay;

pub use backlinks::BacklinkPanel;
pub use graph::GraphView;
pub use overlay::OverlayView;
