//! The live graph observer.
//!
//! While at least one [`Subscription`] is alive a background task enumerates
//! the board every `poll_interval_ms`, derives a fresh [`GraphSnapshot`] and
//! publishes it. Nothing is diffed: every cycle republishes. When the last
//! subscription is dropped the task is stopped and its interval released.

use std::sync::{Arc, Mutex};

use log::{debug, info, log, Level};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use trellis_core::config::{ObserverConfig, TrellisConfig};
use trellis_core::{Board, GraphSnapshot};

use crate::lock;

type Publisher = watch::Sender<Arc<GraphSnapshot>>;

/// Handle to the observation of one board. Cheap to clone.
#[derive(Clone)]
pub struct GraphObserver {
    inner: Arc<Inner>,
}

struct Inner {
    board: Arc<dyn Board>,
    config: ObserverConfig,
    show_cycle_stats: bool,
    state: Mutex<State>,
    wake: Notify,
}

#[derive(Default)]
struct State {
    /// Bumped on every start so stale subscriptions cannot stop a newer task
    generation: u64,
    cycle: u64,
    running: Option<Running>,
}

struct Running {
    generation: u64,
    publisher: Arc<Publisher>,
    task: JoinHandle<()>,
}

impl GraphObserver {
    pub fn new(board: Arc<dyn Board>, config: ObserverConfig) -> Self {
        Self::build(board, config, false)
    }

    pub fn from_config(board: Arc<dyn Board>, config: &TrellisConfig) -> Self {
        Self::build(
            board,
            config.observer.clone(),
            config.logging.show_cycle_stats,
        )
    }

    fn build(board: Arc<dyn Board>, config: ObserverConfig, show_cycle_stats: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                board,
                config,
                show_cycle_stats,
                state: Mutex::new(State::default()),
                wake: Notify::new(),
            }),
        }
    }

    /// Mount a subscriber.
    ///
    /// The first subscriber starts the observation task and receives a
    /// snapshot derived on the spot; later ones join the running task. Must be
    /// called from within a tokio runtime.
    pub fn subscribe(&self) -> Subscription {
        let mut state = lock(&self.inner.state);

        if let Some(running) = state.running.as_ref().filter(|r| !r.task.is_finished()) {
            return Subscription {
                receiver: running.publisher.subscribe(),
                generation: running.generation,
                inner: self.inner.clone(),
            };
        }

        state.cycle += 1;
        let first = self.inner.derive(state.cycle);
        let (publisher, receiver) = watch::channel(Arc::new(first));
        let publisher = Arc::new(publisher);

        state.generation += 1;
        let generation = state.generation;
        let task = tokio::spawn(observe(self.inner.clone(), publisher.clone()));

        info!(
            "Started graph observation every {:?}",
            self.inner.config.poll_interval()
        );
        state.running = Some(Running {
            generation,
            publisher,
            task,
        });

        Subscription {
            receiver,
            generation,
            inner: self.inner.clone(),
        }
    }

    /// Run a cycle now instead of waiting for the next poll. No-op while
    /// nobody is subscribed.
    pub fn invalidate(&self) {
        if self.is_running() {
            self.inner.wake.notify_one();
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.state)
            .running
            .as_ref()
            .map_or(false, |running| !running.task.is_finished())
    }

    /// Number of live subscriptions.
    pub fn subscribers(&self) -> usize {
        lock(&self.inner.state)
            .running
            .as_ref()
            .map_or(0, |running| running.publisher.receiver_count())
    }
}

impl Inner {
    fn derive(&self, cycle: u64) -> GraphSnapshot {
        GraphSnapshot::derive(cycle, self.board.notebook_shapes())
    }

    fn next_cycle(&self) -> u64 {
        let mut state = lock(&self.state);
        state.cycle += 1;
        state.cycle
    }

    fn publish(&self, publisher: &Publisher) {
        let snapshot = self.derive(self.next_cycle());

        let level = if self.show_cycle_stats {
            Level::Info
        } else {
            Level::Debug
        };
        if log::log_enabled!(level) {
            let changed = snapshot.changed_since(&publisher.borrow());
            log!(
                level,
                "Cycle {}: {} notebooks ({} changed), {} connections, {} diagnostics",
                snapshot.cycle,
                snapshot.notebooks.len(),
                changed,
                snapshot.connections.len(),
                snapshot.diagnostics.len()
            );
        }

        publisher.send_replace(Arc::new(snapshot));
    }

    /// Called with the subscriber's receiver already dropped.
    fn release(&self, generation: u64) {
        let mut state = lock(&self.state);
        let idle = match &state.running {
            Some(running) => {
                running.generation == generation && running.publisher.receiver_count() == 0
            }
            None => false,
        };

        if idle {
            if let Some(running) = state.running.take() {
                running.task.abort();
                info!("Stopped graph observation after cycle {}", state.cycle);
            }
        }
    }
}

async fn observe(inner: Arc<Inner>, publisher: Arc<Publisher>) {
    let period = inner.config.poll_interval();
    // The subscriber that started us already holds a fresh snapshot
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = inner.wake.notified() => {
                debug!("Graph invalidated");
                ticker.reset();
            }
        }
        inner.publish(&publisher);
    }
}

/// A mounted subscriber. Dropping it unsubscribes.
pub struct Subscription {
    receiver: watch::Receiver<Arc<GraphSnapshot>>,
    generation: u64,
    inner: Arc<Inner>,
}

impl Subscription {
    /// The most recently published snapshot.
    pub fn latest(&self) -> Arc<GraphSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published snapshot.
    pub async fn next(&mut self) -> Option<Arc<GraphSnapshot>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Swap in a detached receiver so ours no longer counts
        let (_, detached) = watch::channel(Arc::new(GraphSnapshot::default()));
        drop(std::mem::replace(&mut self.receiver, detached));
        self.inner.release(self.generation);
    }
}
