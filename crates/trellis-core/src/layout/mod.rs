//! Force-directed layout of the notebook graph.
//!
//! The simulation keeps its own arena of mutable [`GraphNode`] records indexed
//! by [`ShapeId`]. Identity records taken from the snapshot are copied in and
//! never mutated. Positions are not persisted: every simulation starts from a
//! fresh placement.

use std::collections::HashMap;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::GraphViewConfig;
use crate::error::Result;
use crate::graph::outgoing_counts;
use crate::model::{NotebookInfo, Point, ShapeId};
use crate::snapshot::GraphSnapshot;

mod forces;
mod render;

pub use render::{encode_png, parse_color, GraphRenderer};
pub use tiny_skia::Pixmap;

/// A notebook inside the simulation.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub info: NotebookInfo,
    /// Number of outgoing connections; drives the rendered size
    pub link_count: usize,
    pub radius: f32,
    pub position: Point,
    pub velocity: Point,
}

/// A connection inside the simulation, endpoints are arena indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphLink {
    pub source: usize,
    pub target: usize,
}

/// A link re-flattened to shape IDs for consumers outside the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatLink {
    pub source: ShapeId,
    pub target: ShapeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatNode {
    pub id: ShapeId,
    pub notebook_id: String,
    pub title: String,
    pub link_count: usize,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatGraph {
    pub nodes: Vec<FlatNode>,
    pub links: Vec<FlatLink>,
}

pub struct Simulation {
    pub(crate) nodes: Vec<GraphNode>,
    index: HashMap<ShapeId, usize>,
    pub(crate) links: Vec<GraphLink>,
    /// Per-link strength and bias, derived from endpoint degrees
    pub(crate) link_strength: Vec<f32>,
    pub(crate) link_bias: Vec<f32>,
    pub(crate) center: Point,
    pub(crate) alpha: f32,
    pub(crate) config: GraphViewConfig,
    pub(crate) rng: StdRng,
    ticks: u64,
    fingerprint: String,
}

impl Simulation {
    pub fn new(snapshot: &GraphSnapshot, config: &GraphViewConfig) -> Self {
        let center = Point::new(config.width as f32 / 2.0, config.height as f32 / 2.0);

        let mut nodes = Vec::with_capacity(snapshot.notebooks.len());
        let mut index = HashMap::with_capacity(snapshot.notebooks.len());

        let counts = outgoing_counts(snapshot.infos(), &snapshot.connections);
        for (i, (info, (_, link_count))) in snapshot.infos().zip(counts).enumerate() {
            index.insert(info.shape_id.clone(), i);
            nodes.push(GraphNode {
                info: info.clone(),
                link_count,
                radius: node_radius(config, link_count),
                position: initial_position(center, i),
                velocity: Point::default(),
            });
        }

        let links: Vec<GraphLink> = snapshot
            .connections
            .iter()
            .filter_map(|connection| {
                Some(GraphLink {
                    source: *index.get(&connection.source)?,
                    target: *index.get(&connection.target)?,
                })
            })
            .collect();

        let mut degree = vec![0usize; nodes.len()];
        for link in &links {
            degree[link.source] += 1;
            degree[link.target] += 1;
        }
        let link_strength = links
            .iter()
            .map(|link| 1.0 / degree[link.source].min(degree[link.target]) as f32)
            .collect();
        let link_bias = links
            .iter()
            .map(|link| {
                degree[link.source] as f32 / (degree[link.source] + degree[link.target]) as f32
            })
            .collect();

        info!(
            "Starting graph simulation: {} nodes, {} links",
            nodes.len(),
            links.len()
        );

        Self {
            alpha: if nodes.is_empty() { 0.0 } else { 1.0 },
            nodes,
            index,
            links,
            link_strength,
            link_bias,
            center,
            config: config.clone(),
            rng: StdRng::seed_from_u64(config.seed),
            ticks: 0,
            fingerprint: snapshot.fingerprint.clone(),
        }
    }

    /// Advance one step. Returns whether the simulation is still hot.
    pub fn tick(&mut self) -> bool {
        if !self.is_hot() {
            return false;
        }

        self.alpha -= self.alpha * self.config.alpha_decay;

        forces::apply_links(self);
        forces::apply_charge(self);
        forces::apply_collision(self);

        let retain = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            node.velocity.x *= retain;
            node.velocity.y *= retain;
            node.position.x += node.velocity.x;
            node.position.y += node.velocity.y;
        }

        forces::apply_centering(self);

        self.ticks += 1;
        self.is_hot()
    }

    /// Tick until cool or `max_ticks` is reached. Returns the ticks taken.
    pub fn run(&mut self, max_ticks: u64) -> u64 {
        let start = self.ticks;
        while self.ticks - start < max_ticks && self.tick() {}
        self.ticks - start
    }

    pub fn is_hot(&self) -> bool {
        self.alpha >= self.config.alpha_min
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Fingerprint of the snapshot this simulation was built from
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[GraphLink] {
        &self.links
    }

    pub fn node(&self, shape: &ShapeId) -> Option<&GraphNode> {
        self.index.get(shape).map(|&i| &self.nodes[i])
    }

    /// Copy updated titles from a snapshot with the same graph identity.
    pub fn refresh_identities(&mut self, snapshot: &GraphSnapshot) {
        for notebook in &snapshot.notebooks {
            if let Some(&i) = self.index.get(&notebook.info.shape_id) {
                self.nodes[i].info = notebook.info.clone();
            }
        }
    }

    /// The node under `point`: closest center within its radius.
    pub fn hit_test(&self, point: Point) -> Option<&GraphNode> {
        // Reversed so the last drawn node wins ties
        self.nodes
            .iter()
            .rev()
            .map(|node| (node, node.position.distance_to(point)))
            .filter(|(node, distance)| *distance <= node.radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(node, _)| node)
    }

    pub fn links_flat(&self) -> Vec<FlatLink> {
        self.links
            .iter()
            .map(|link| FlatLink {
                source: self.nodes[link.source].info.shape_id.clone(),
                target: self.nodes[link.target].info.shape_id.clone(),
            })
            .collect()
    }

    pub fn to_flat(&self) -> FlatGraph {
        FlatGraph {
            nodes: self
                .nodes
                .iter()
                .map(|node| FlatNode {
                    id: node.info.shape_id.clone(),
                    notebook_id: node.info.notebook_id.to_string(),
                    title: node.info.title.clone(),
                    link_count: node.link_count,
                    x: node.position.x,
                    y: node.position.y,
                    radius: node.radius,
                })
                .collect(),
            links: self.links_flat(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_flat())?)
    }

    pub(crate) fn jiggle(&mut self) -> f32 {
        (self.rng.gen::<f32>() - 0.5) * 1e-6
    }
}

/// Rendered radius for a node with `link_count` outgoing connections.
pub fn node_radius(config: &GraphViewConfig, link_count: usize) -> f32 {
    config.node_radius + (link_count as f32).sqrt() * config.node_radius_scale
}

/// Phyllotaxis spiral around the viewport center.
fn initial_position(center: Point, i: usize) -> Point {
    let initial_radius = 10.0f32;
    let initial_angle = std::f32::consts::PI * (3.0 - 5.0f32.sqrt());

    let radius = initial_radius * (0.5 + i as f32).sqrt();
    let angle = i as f32 * initial_angle;
    Point::new(
        center.x + radius * angle.cos(),
        center.y + radius * angle.sin(),
    )
}
