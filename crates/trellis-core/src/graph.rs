//! Connection graph building.
//!
//! The graph is never stored: every call parses all notebook texts, resolves
//! every wikilink against the full notebook list and emits the deduplicated
//! set of directed connections.

use std::collections::HashSet;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::model::{Connection, Notebook, NotebookInfo, ShapeId};
use crate::parser::parse_wikilinks;
use crate::resolver::{resolve_detailed, Resolution};

/// Non-fatal observations made while building the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LinkDiagnostic {
    /// The target matched no notebook.
    Dangling {
        source: ShapeId,
        target: String,
        start: usize,
    },
    /// The target matched several titles; `chosen` won by candidate order.
    AmbiguousTitle {
        source: ShapeId,
        target: String,
        chosen: ShapeId,
        others: Vec<ShapeId>,
    },
    /// The target resolved to the notebook containing the link.
    SelfLink { source: ShapeId, target: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphBuild {
    pub connections: Vec<Connection>,
    pub diagnostics: Vec<LinkDiagnostic>,
}

/// Build the directed connection set for `notebooks`.
pub fn build_connection_map(notebooks: &[Notebook]) -> Vec<Connection> {
    build_graph(notebooks).connections
}

/// Build the connection set together with diagnostics.
pub fn build_graph(notebooks: &[Notebook]) -> GraphBuild {
    let candidates: Vec<&NotebookInfo> = notebooks.iter().map(|notebook| &notebook.info).collect();

    let mut seen: HashSet<(&ShapeId, &ShapeId)> = HashSet::new();
    let mut build = GraphBuild::default();

    for notebook in notebooks {
        let source = &notebook.info;

        for link in parse_wikilinks(&notebook.text) {
            let resolution = resolve_detailed(&link.target, candidates.iter().copied());

            let resolved = match &resolution {
                Resolution::Dangling => {
                    build.diagnostics.push(LinkDiagnostic::Dangling {
                        source: source.shape_id.clone(),
                        target: link.target,
                        start: link.start,
                    });
                    continue;
                }
                Resolution::ById(resolved) => *resolved,
                Resolution::ByTitle {
                    notebook: resolved,
                    ambiguous_with,
                } => {
                    if !ambiguous_with.is_empty() {
                        warn!(
                            "Ambiguous wikilink [[{}]] in {}: {} notebooks share the title, using {}",
                            link.target,
                            source.shape_id,
                            ambiguous_with.len() + 1,
                            resolved.shape_id
                        );
                        build.diagnostics.push(LinkDiagnostic::AmbiguousTitle {
                            source: source.shape_id.clone(),
                            target: link.target.clone(),
                            chosen: resolved.shape_id.clone(),
                            others: ambiguous_with
                                .iter()
                                .map(|other| other.shape_id.clone())
                                .collect(),
                        });
                    }
                    *resolved
                }
            };

            if resolved.shape_id == source.shape_id {
                build.diagnostics.push(LinkDiagnostic::SelfLink {
                    source: source.shape_id.clone(),
                    target: link.target,
                });
                continue;
            }

            if seen.insert((&source.shape_id, &resolved.shape_id)) {
                build.connections.push(Connection::new(
                    source.shape_id.clone(),
                    resolved.shape_id.clone(),
                ));
            }
        }
    }

    build
}

/// Count outgoing connections per source, in notebook order.
pub fn outgoing_counts<'a>(
    notebooks: impl IntoIterator<Item = &'a NotebookInfo>,
    connections: &[Connection],
) -> Vec<(ShapeId, usize)> {
    notebooks
        .into_iter()
        .map(|info| {
            let count = connections
                .iter()
                .filter(|connection| connection.source == info.shape_id)
                .count();
            (info.shape_id.clone(), count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notebook(shape: &str, id: &str, title: &str, text: &str) -> Notebook {
        Notebook::new(NotebookInfo::new(shape, id, title), text)
    }

    fn pairs(connections: &[Connection]) -> Vec<(&str, &str)> {
        connections
            .iter()
            .map(|c| (c.source.as_str(), c.target.as_str()))
            .collect()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let notebooks = vec![
            notebook("A", "a-id", "Alpha", "See [[B]] and [[c-id|Gamma]]"),
            notebook("B", "b-id", "B", ""),
            notebook("C", "c-id", "Gamma", ""),
        ];

        let connections = build_connection_map(&notebooks);
        assert_eq!(pairs(&connections), vec![("A", "B"), ("A", "C")]);
    }

    #[test]
    fn test_self_link_is_excluded() {
        let notebooks = vec![
            notebook("A", "a-id", "Itself", "I am [[itself]] and [[a-id]]"),
            notebook("B", "b-id", "Other", ""),
        ];

        let build = build_graph(&notebooks);
        assert!(build.connections.is_empty());
        assert_eq!(
            build
                .diagnostics
                .iter()
                .filter(|d| matches!(d, LinkDiagnostic::SelfLink { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_duplicate_links_collapse() {
        let notebooks = vec![
            notebook("A", "a-id", "A", "[[X]] ... [[X]] and [[x-id]]"),
            notebook("X", "x-id", "X", ""),
        ];

        let connections = build_connection_map(&notebooks);
        assert_eq!(pairs(&connections), vec![("A", "X")]);
    }

    #[test]
    fn test_opposite_directions_are_distinct() {
        let notebooks = vec![
            notebook("A", "a-id", "A", "[[B]]"),
            notebook("B", "b-id", "B", "[[A]]"),
        ];

        let connections = build_connection_map(&notebooks);
        assert_eq!(pairs(&connections), vec![("A", "B"), ("B", "A")]);
    }

    #[test]
    fn test_dangling_reference_is_omitted() {
        let notebooks = vec![notebook("A", "a-id", "A", "Later: [[nonexistent]]")];

        let build = build_graph(&notebooks);
        assert!(build.connections.is_empty());
        assert_eq!(
            build.diagnostics,
            vec![LinkDiagnostic::Dangling {
                source: ShapeId::new("A"),
                target: "nonexistent".to_string(),
                start: 7,
            }]
        );
    }

    #[test]
    fn test_ambiguous_title_is_reported() {
        let notebooks = vec![
            notebook("A", "a-id", "A", "[[Plans]]"),
            notebook("P1", "p1", "Plans", ""),
            notebook("P2", "p2", "plans", ""),
        ];

        let build = build_graph(&notebooks);
        assert_eq!(pairs(&build.connections), vec![("A", "P1")]);
        assert_eq!(
            build.diagnostics,
            vec![LinkDiagnostic::AmbiguousTitle {
                source: ShapeId::new("A"),
                target: "Plans".to_string(),
                chosen: ShapeId::new("P1"),
                others: vec![ShapeId::new("P2")],
            }]
        );
    }

    #[test]
    fn test_outgoing_counts() {
        let notebooks = vec![
            notebook("A", "a-id", "A", "[[B]] [[C]]"),
            notebook("B", "b-id", "B", "[[C]]"),
            notebook("C", "c-id", "C", ""),
        ];
        let connections = build_connection_map(&notebooks);
        let counts = outgoing_counts(notebooks.iter().map(|n| &n.info), &connections);

        assert_eq!(
            counts,
            vec![
                (ShapeId::new("A"), 2),
                (ShapeId::new("B"), 1),
                (ShapeId::new("C"), 0),
            ]
        );
    }
}
