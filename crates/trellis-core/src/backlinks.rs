use crate::graph::build_connection_map;
use crate::model::{Connection, Notebook, NotebookInfo, ShapeId};

/// Notebooks linking into `selected`, in candidate order.
pub fn backlinks_of(selected: &ShapeId, notebooks: &[Notebook]) -> Vec<NotebookInfo> {
    let connections = build_connection_map(notebooks);
    backlinks_from_connections(selected, notebooks.iter().map(|n| &n.info), &connections)
}

/// Filter an already-built connection set for incoming edges of `selected`.
pub fn backlinks_from_connections<'a>(
    selected: &ShapeId,
    candidates: impl IntoIterator<Item = &'a NotebookInfo>,
    connections: &[Connection],
) -> Vec<NotebookInfo> {
    candidates
        .into_iter()
        .filter(|candidate| &candidate.shape_id != selected)
        .filter(|candidate| {
            connections
                .iter()
                .any(|c| &c.target == selected && c.source == candidate.shape_id)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Vec<Notebook> {
        vec![
            Notebook::new(
                NotebookInfo::new("A", "a-id", "Alpha"),
                "See [[B]] and [[c-id|Gamma]]",
            ),
            Notebook::new(NotebookInfo::new("B", "b-id", "B"), ""),
            Notebook::new(NotebookInfo::new("C", "c-id", "Gamma"), ""),
        ]
    }

    fn shapes(infos: &[NotebookInfo]) -> Vec<&str> {
        infos.iter().map(|info| info.shape_id.as_str()).collect()
    }

    #[test]
    fn test_backlinks_of_scenario() {
        let notebooks = scenario();

        assert_eq!(shapes(&backlinks_of(&ShapeId::new("B"), &notebooks)), vec!["A"]);
        assert_eq!(shapes(&backlinks_of(&ShapeId::new("C"), &notebooks)), vec!["A"]);
        assert!(backlinks_of(&ShapeId::new("A"), &notebooks).is_empty());
    }

    #[test]
    fn test_backlinks_follow_title_links() {
        let mut notebooks = scenario();
        notebooks[2].text = "back to [[alpha]]".to_string();

        assert_eq!(shapes(&backlinks_of(&ShapeId::new("A"), &notebooks)), vec!["C"]);
    }

    #[test]
    fn test_backlinks_keep_candidate_order() {
        let notebooks = vec![
            Notebook::new(NotebookInfo::new("Z", "z", "Zed"), "[[T]]"),
            Notebook::new(NotebookInfo::new("T", "t", "T"), ""),
            Notebook::new(NotebookInfo::new("M", "m", "Em"), "[[T]] [[t]]"),
        ];

        assert_eq!(
            shapes(&backlinks_of(&ShapeId::new("T"), &notebooks)),
            vec!["Z", "M"]
        );
    }

    #[test]
    fn test_unknown_selection_has_no_backlinks() {
        let notebooks = scenario();
        assert!(backlinks_of(&ShapeId::new("deleted"), &notebooks).is_empty());
    }

    #[test]
    fn test_self_links_are_not_backlinks() {
        let notebooks = vec![Notebook::new(NotebookInfo::new("A", "a", "A"), "[[A]]")];
        assert!(backlinks_of(&ShapeId::new("A"), &notebooks).is_empty());
    }
}
