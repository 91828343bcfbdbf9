use std::sync::{Arc, Mutex};

use log::debug;
use tokio::task::JoinHandle;
use trellis_core::{GraphSnapshot, Navigator, NotebookInfo, ShapeId};

use crate::lock;
use crate::observer::GraphObserver;

/// Lists the notebooks linking into the selected one.
pub struct BacklinkPanel {
    shared: Arc<Mutex<PanelState>>,
    navigator: Arc<dyn Navigator>,
    task: JoinHandle<()>,
}

struct PanelState {
    selected: Option<ShapeId>,
    snapshot: Arc<GraphSnapshot>,
    entries: Vec<NotebookInfo>,
}

impl PanelState {
    fn refresh(&mut self) {
        self.entries = match &self.selected {
            Some(selected) => self.snapshot.backlinks_of(selected),
            None => Vec::new(),
        };
    }
}

impl BacklinkPanel {
    pub fn mount(observer: &GraphObserver, navigator: Arc<dyn Navigator>) -> Self {
        let mut subscription = observer.subscribe();
        let shared = Arc::new(Mutex::new(PanelState {
            selected: None,
            snapshot: subscription.latest(),
            entries: Vec::new(),
        }));

        let task = tokio::spawn({
            let shared = shared.clone();
            async move {
                while let Some(snapshot) = subscription.next().await {
                    let mut state = lock(&shared);
                    state.snapshot = snapshot;
                    state.refresh();
                }
            }
        });

        Self {
            shared,
            navigator,
            task,
        }
    }

    /// Change the notebook whose backlinks are listed. `None` clears the list.
    pub fn select(&self, shape: Option<ShapeId>) {
        let mut state = lock(&self.shared);
        state.selected = shape;
        state.refresh();
    }

    pub fn selected(&self) -> Option<ShapeId> {
        lock(&self.shared).selected.clone()
    }

    /// Current backlinks, in board order.
    pub fn entries(&self) -> Vec<NotebookInfo> {
        lock(&self.shared).entries.clone()
    }

    /// Ask the host to focus the entry at `index`. Returns the focused shape.
    pub fn open(&self, index: usize) -> Option<ShapeId> {
        let shape = lock(&self.shared).entries.get(index)?.shape_id.clone();
        debug!("Opening backlink {}", shape);
        self.navigator.focus(&shape);
        Some(shape)
    }
}

impl Drop for BacklinkPanel {
    fn drop(&mut self) {
        self.task.abort();
    }
}
