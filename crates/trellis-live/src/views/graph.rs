use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use trellis_core::config::GraphViewConfig;
use trellis_core::layout::{encode_png, FlatGraph, GraphRenderer, Pixmap, Simulation};
use trellis_core::model::Point;
use trellis_core::{GraphSnapshot, Navigator, Result, ShapeId};

use crate::lock;
use crate::observer::GraphObserver;

/// Force-directed view of the whole graph.
///
/// The simulation is rebuilt whenever the snapshot's graph identity changes
/// and ticks on `tick_interval_ms` while hot, redrawing a frame per tick.
/// Snapshots with an unchanged identity only refresh titles.
pub struct GraphView {
    inner: Arc<ViewInner>,
    task: JoinHandle<()>,
}

struct ViewInner {
    config: GraphViewConfig,
    renderer: GraphRenderer,
    navigator: Arc<dyn Navigator>,
    state: Mutex<ViewState>,
}

#[derive(Default)]
struct ViewState {
    simulation: Option<Simulation>,
    hovered: Option<ShapeId>,
    selected: Option<ShapeId>,
    frame: Option<Pixmap>,
    frames: u64,
    simulations: u64,
}

impl GraphView {
    pub fn mount(
        observer: &GraphObserver,
        config: GraphViewConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let renderer = GraphRenderer::new(&config)?;
        let inner = Arc::new(ViewInner {
            config,
            renderer,
            navigator,
            state: Mutex::new(ViewState::default()),
        });

        let mut subscription = observer.subscribe();
        inner.apply(&subscription.latest());

        let task = tokio::spawn({
            let inner = inner.clone();
            async move {
                let mut ticker = time::interval(inner.config.tick_interval());
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    let hot = inner.is_hot();
                    tokio::select! {
                        update = subscription.next() => match update {
                            Some(snapshot) => inner.apply(&snapshot),
                            None => break,
                        },
                        _ = ticker.tick(), if hot => inner.step(),
                    }
                }
            }
        });

        Ok(Self { inner, task })
    }

    /// Hover at a surface point. Returns the node under it.
    pub fn hover(&self, point: Point) -> Option<ShapeId> {
        let mut state = lock(&self.inner.state);
        let hit = node_at(&state, point);
        if hit != state.hovered {
            state.hovered = hit.clone();
            self.inner.redraw(&mut state);
        }
        hit
    }

    /// Click at a surface point: select the node under it and ask the host
    /// to focus it. Clicking empty space changes nothing.
    pub fn click(&self, point: Point) -> Option<ShapeId> {
        let shape = {
            let mut state = lock(&self.inner.state);
            let shape = node_at(&state, point)?;
            state.selected = Some(shape.clone());
            self.inner.redraw(&mut state);
            shape
        };

        debug!("Graph view focusing {}", shape);
        self.inner.navigator.focus(&shape);
        Some(shape)
    }

    pub fn hovered(&self) -> Option<ShapeId> {
        lock(&self.inner.state).hovered.clone()
    }

    pub fn selected(&self) -> Option<ShapeId> {
        lock(&self.inner.state).selected.clone()
    }

    /// The last drawn frame.
    pub fn frame(&self) -> Option<Pixmap> {
        lock(&self.inner.state).frame.clone()
    }

    pub fn frame_png(&self) -> Result<Option<Vec<u8>>> {
        lock(&self.inner.state)
            .frame
            .as_ref()
            .map(encode_png)
            .transpose()
    }

    pub fn frames_rendered(&self) -> u64 {
        lock(&self.inner.state).frames
    }

    /// Simulations started since mount, the first one included.
    pub fn simulations_started(&self) -> u64 {
        lock(&self.inner.state).simulations
    }

    pub fn is_settled(&self) -> bool {
        !self.inner.is_hot()
    }

    /// Current layout with links flattened to shape IDs.
    pub fn layout(&self) -> Option<FlatGraph> {
        lock(&self.inner.state)
            .simulation
            .as_ref()
            .map(Simulation::to_flat)
    }
}

impl Drop for GraphView {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl ViewInner {
    fn apply(&self, snapshot: &GraphSnapshot) {
        let mut state = lock(&self.state);

        let same_graph = state
            .simulation
            .as_ref()
            .map_or(false, |simulation| simulation.fingerprint() == snapshot.fingerprint);

        if same_graph {
            if let Some(simulation) = state.simulation.as_mut() {
                simulation.refresh_identities(snapshot);
            }
        } else {
            if state.simulation.is_some() {
                info!("Graph changed, restarting simulation");
            }
            // The old simulation is dropped here and never ticks again
            state.simulation = Some(Simulation::new(snapshot, &self.config));
            state.simulations += 1;

            let present = |shape: &Option<ShapeId>| {
                shape
                    .as_ref()
                    .map_or(false, |shape| snapshot.notebook(shape).is_some())
            };
            if !present(&state.hovered) {
                state.hovered = None;
            }
            if !present(&state.selected) {
                state.selected = None;
            }
        }

        self.redraw(&mut state);
    }

    fn step(&self) {
        let mut state = lock(&self.state);
        if let Some(simulation) = state.simulation.as_mut() {
            if !simulation.tick() {
                debug!("Simulation settled after {} ticks", simulation.ticks());
            }
        }
        self.redraw(&mut state);
    }

    fn is_hot(&self) -> bool {
        lock(&self.state)
            .simulation
            .as_ref()
            .map_or(false, Simulation::is_hot)
    }

    fn redraw(&self, state: &mut ViewState) {
        let Some(simulation) = state.simulation.as_ref() else {
            return;
        };

        match self
            .renderer
            .render(simulation, state.hovered.as_ref(), state.selected.as_ref())
        {
            Ok(pixmap) => {
                state.frame = Some(pixmap);
                state.frames += 1;
            }
            Err(err) => warn!("Failed to draw graph frame: {}", err),
        }
    }
}

fn node_at(state: &ViewState, point: Point) -> Option<ShapeId> {
    state
        .simulation
        .as_ref()?
        .hit_test(point)
        .map(|node| node.info.shape_id.clone())
}
