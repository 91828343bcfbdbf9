use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use trellis_core::config::OverlayStyle;
use trellis_core::overlay::{render_overlay, Overlay};

use crate::lock;
use crate::observer::GraphObserver;

/// Connection overlay kept in step with the board.
///
/// Re-laid out from scratch on every published snapshot so lines follow
/// notebooks as they move or resize.
pub struct OverlayView {
    current: Arc<Mutex<Option<Overlay>>>,
    task: JoinHandle<()>,
}

impl OverlayView {
    pub fn mount(observer: &GraphObserver, style: OverlayStyle) -> Self {
        let mut subscription = observer.subscribe();
        let current = Arc::new(Mutex::new(render_overlay(&subscription.latest(), &style)));

        let task = tokio::spawn({
            let current = current.clone();
            async move {
                while let Some(snapshot) = subscription.next().await {
                    *lock(&current) = render_overlay(&snapshot, &style);
                }
            }
        });

        Self { current, task }
    }

    /// `None` while there are no connections to draw.
    pub fn current(&self) -> Option<Overlay> {
        lock(&self.current).clone()
    }

    pub fn svg(&self) -> Option<String> {
        lock(&self.current).as_ref().map(Overlay::to_svg)
    }
}

impl Drop for OverlayView {
    fn drop(&mut self) {
        self.task.abort();
    }
}
