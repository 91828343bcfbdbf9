use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::backlinks::backlinks_from_connections;
use crate::graph::{build_graph, LinkDiagnostic};
use crate::model::{Bounds, Connection, Notebook, NotebookInfo, NotebookShape, ShapeId};
use crate::parser::content_digest;

/// A notebook as seen by one observation cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNotebook {
    pub info: NotebookInfo,
    pub text: String,
    /// sha256 of `text`, lets consumers spot edits between cycles
    pub digest: String,
    pub bounds: Bounds,
}

/// Everything derived from a single canvas enumeration.
///
/// Notebooks, parse results and connections are mutually consistent because
/// they come from the same list of shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub cycle: u64,
    pub notebooks: Vec<SnapshotNotebook>,
    pub connections: Vec<Connection>,
    pub diagnostics: Vec<LinkDiagnostic>,
    /// Digest of the graph identity: shape IDs, notebook IDs and connections.
    /// Geometry, titles and texts do not contribute.
    pub fingerprint: String,
}

impl GraphSnapshot {
    pub fn derive(cycle: u64, shapes: Vec<NotebookShape>) -> Self {
        let mut notebooks = Vec::with_capacity(shapes.len());
        let mut bounds = Vec::with_capacity(shapes.len());

        for shape in shapes {
            bounds.push(shape.bounds());
            notebooks.push(Notebook::new(shape.info(), shape.markdown));
        }

        let build = build_graph(&notebooks);
        let fingerprint = fingerprint(&notebooks, &build.connections);

        let notebooks = notebooks
            .into_iter()
            .zip(bounds)
            .map(|(notebook, bounds)| SnapshotNotebook {
                digest: content_digest(&notebook.text),
                info: notebook.info,
                text: notebook.text,
                bounds,
            })
            .collect();

        Self {
            cycle,
            notebooks,
            connections: build.connections,
            diagnostics: build.diagnostics,
            fingerprint,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notebooks.is_empty()
    }

    pub fn infos(&self) -> impl Iterator<Item = &NotebookInfo> + Clone {
        self.notebooks.iter().map(|notebook| &notebook.info)
    }

    pub fn notebook(&self, shape: &ShapeId) -> Option<&SnapshotNotebook> {
        self.notebooks
            .iter()
            .find(|notebook| &notebook.info.shape_id == shape)
    }

    pub fn backlinks_of(&self, selected: &ShapeId) -> Vec<NotebookInfo> {
        backlinks_from_connections(selected, self.infos(), &self.connections)
    }

    /// Notebooks whose text differs from, or is missing in, `previous`.
    pub fn changed_since(&self, previous: &GraphSnapshot) -> usize {
        self.notebooks
            .iter()
            .filter(|notebook| {
                previous
                    .notebook(&notebook.info.shape_id)
                    .map_or(true, |old| old.digest != notebook.digest)
            })
            .count()
    }

    pub fn outgoing_count(&self, shape: &ShapeId) -> usize {
        self.connections
            .iter()
            .filter(|connection| &connection.source == shape)
            .count()
    }
}

fn fingerprint(notebooks: &[Notebook], connections: &[Connection]) -> String {
    let mut hasher = Sha256::new();
    for notebook in notebooks {
        hasher.update(notebook.info.shape_id.as_str());
        hasher.update([0]);
        hasher.update(notebook.info.notebook_id.as_str());
        hasher.update([0]);
    }
    hasher.update([1]);
    for connection in connections {
        hasher.update(connection.source.as_str());
        hasher.update([0]);
        hasher.update(connection.target.as_str());
        hasher.update([0]);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NotebookId;

    fn shape(id: &str, notebook_id: &str, title: &str, markdown: &str, x: f32) -> NotebookShape {
        NotebookShape {
            id: ShapeId::new(id),
            notebook_id: NotebookId::new(notebook_id),
            title: title.to_string(),
            markdown: markdown.to_string(),
            x,
            y: 0.0,
            width: 100.0,
            height: 50.0,
        }
    }

    fn scenario() -> Vec<NotebookShape> {
        vec![
            shape("A", "a-id", "Alpha", "See [[B]] and [[c-id|Gamma]]", 0.0),
            shape("B", "b-id", "B", "", 200.0),
            shape("C", "c-id", "Gamma", "", 400.0),
        ]
    }

    #[test]
    fn test_derive_scenario() {
        let snapshot = GraphSnapshot::derive(1, scenario());

        assert_eq!(snapshot.cycle, 1);
        assert_eq!(snapshot.notebooks.len(), 3);
        assert_eq!(
            snapshot.connections,
            vec![
                Connection::new(ShapeId::new("A"), ShapeId::new("B")),
                Connection::new(ShapeId::new("A"), ShapeId::new("C")),
            ]
        );
        assert_eq!(snapshot.outgoing_count(&ShapeId::new("A")), 2);

        let backlinks: Vec<String> = snapshot
            .backlinks_of(&ShapeId::new("B"))
            .into_iter()
            .map(|info| info.shape_id.0)
            .collect();
        assert_eq!(backlinks, vec!["A".to_string()]);
        assert!(snapshot.backlinks_of(&ShapeId::new("A")).is_empty());
    }

    #[test]
    fn test_blank_title_is_derived_from_markdown() {
        let shapes = vec![
            shape("A", "a-id", "", "# Derived Title\n\nbody", 0.0),
            shape("B", "b-id", "", "[[derived title]]", 0.0),
        ];
        let snapshot = GraphSnapshot::derive(0, shapes);

        assert_eq!(snapshot.notebooks[0].info.title, "Derived Title");
        assert_eq!(
            snapshot.connections,
            vec![Connection::new(ShapeId::new("B"), ShapeId::new("A"))]
        );
    }

    #[test]
    fn test_fingerprint_ignores_geometry_and_text() {
        let first = GraphSnapshot::derive(1, scenario());

        let mut moved = scenario();
        moved[1].x = 999.0;
        moved[0].markdown = "See [[B]] and [[c-id|Gamma]] with more words".to_string();
        let second = GraphSnapshot::derive(2, moved);

        assert_eq!(first.fingerprint, second.fingerprint);
    }

    #[test]
    fn test_fingerprint_tracks_graph_identity() {
        let first = GraphSnapshot::derive(1, scenario());

        let mut relinked = scenario();
        relinked[0].markdown = "Only [[B]]".to_string();
        assert_ne!(first.fingerprint, GraphSnapshot::derive(2, relinked).fingerprint);

        let mut removed = scenario();
        removed.pop();
        assert_ne!(first.fingerprint, GraphSnapshot::derive(3, removed).fingerprint);
    }

    #[test]
    fn test_deleted_node_disappears_next_cycle() {
        let first = GraphSnapshot::derive(1, scenario());
        assert!(first.notebook(&ShapeId::new("C")).is_some());

        let mut shapes = scenario();
        shapes.retain(|shape| shape.id.as_str() != "C");
        let second = GraphSnapshot::derive(2, shapes);

        assert!(second.notebook(&ShapeId::new("C")).is_none());
        assert_eq!(
            second.connections,
            vec![Connection::new(ShapeId::new("A"), ShapeId::new("B"))]
        );
        assert!(second.backlinks_of(&ShapeId::new("C")).is_empty());
    }

    #[test]
    fn test_changed_since_counts_edited_and_new_notebooks() {
        let first = GraphSnapshot::derive(1, scenario());
        assert_eq!(first.changed_since(&first), 0);
        assert_eq!(first.changed_since(&GraphSnapshot::default()), 3);

        let mut shapes = scenario();
        shapes[1].markdown = "edited".to_string();
        shapes[2].x = 50.0;
        let second = GraphSnapshot::derive(2, shapes);
        assert_eq!(second.changed_since(&first), 1);
    }
}
