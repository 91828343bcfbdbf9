//! Trellis Core Library
//!
//! Wikilink parsing, resolution and the connection graph between notebooks on
//! a canvas, plus the pure halves of the views built on it: overlay geometry,
//! backlinks and the force-directed layout.
//! No async, no IO beyond loading a config file.
//!

pub mod backlinks;
pub mod board;
pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod model;
pub mod overlay;
pub mod parser;
pub mod resolver;
pub mod snapshot;
pub mod utils;

pub use backlinks::backlinks_of;
pub use board::{Board, MemoryBoard, Navigator};
pub use config::TrellisConfig;
pub use error::{Result, TrellisError};
pub use graph::{build_connection_map, build_graph, LinkDiagnostic};
pub use layout::{GraphRenderer, Simulation};
pub use model::{Connection, Notebook, NotebookId, NotebookInfo, NotebookShape, ShapeId};
pub use overlay::{render_overlay, Overlay};
pub use parser::{parse_wikilinks, WikilinkMatch};
pub use resolver::{resolve_detailed, resolve_wikilink, Resolution};
pub use snapshot::GraphSnapshot;
