use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Top-level configuration for Trellis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrellisConfig {
    pub observer: ObserverConfig,
    pub overlay: OverlayStyle,
    pub graph: GraphViewConfig,
    pub logging: LoggingConfig,
}

/// Live graph observation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Re-derivation period in milliseconds
    pub poll_interval_ms: u64,
}

impl ObserverConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 300,
        }
    }
}

/// Look of the connection overlay drawn under the canvas nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub stroke: String,
    pub stroke_width: f32,
    /// Length of the arrowhead along the edge, in page units
    pub arrow_size: f32,
    pub opacity: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke: "#94a3b8".to_string(),
            stroke_width: 2.0,
            arrow_size: 10.0,
            opacity: 0.8,
        }
    }
}

/// Force simulation and raster settings of the graph view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphViewConfig {
    pub width: u32,
    pub height: u32,
    /// Target length of a link, in pixels
    pub link_distance: f32,
    /// Many-body strength; negative values repel
    pub charge_strength: f32,
    /// Distances below this are clamped when computing the charge force
    pub charge_distance_min: f32,
    pub collision_padding: f32,
    pub collision_strength: f32,
    /// Radius of a node without outgoing links
    pub node_radius: f32,
    /// Extra radius per sqrt(outgoing link count)
    pub node_radius_scale: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub tick_interval_ms: u64,
    /// Seed for the jiggle applied to coincident nodes
    pub seed: u64,
    pub palette: GraphPalette,
}

impl GraphViewConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for GraphViewConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            link_distance: 80.0,
            charge_strength: -120.0,
            charge_distance_min: 1.0,
            collision_padding: 4.0,
            collision_strength: 0.7,
            node_radius: 5.0,
            node_radius_scale: 2.5,
            alpha_min: 0.001,
            // Cools from 1.0 to alpha_min in about 300 ticks
            alpha_decay: 1.0 - 0.001f32.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            tick_interval_ms: 16,
            seed: 0x5eed,
            palette: GraphPalette::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphPalette {
    pub background: String,
    pub link: String,
    pub node: String,
    pub node_stroke: String,
    pub hovered: String,
    pub selected: String,
}

impl Default for GraphPalette {
    fn default() -> Self {
        Self {
            background: "#ffffff".to_string(),
            link: "#cbd5e1".to_string(),
            node: "#6366f1".to_string(),
            node_stroke: "#1e293b".to_string(),
            hovered: "#f59e0b".to_string(),
            selected: "#ef4444".to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Log per-cycle graph statistics at info instead of debug
    pub show_cycle_stats: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_cycle_stats: false,
        }
    }
}

impl TrellisConfig {
    /// Parse config from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}
