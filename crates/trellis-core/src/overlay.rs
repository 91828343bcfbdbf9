//! Connection overlay: page-space lines from the source notebook center to the
//! target notebook center, with an arrowhead at the target end.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::OverlayStyle;
use crate::model::{Bounds, Point, ShapeId};
use crate::snapshot::GraphSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayEdge {
    pub source: ShapeId,
    pub target: ShapeId,
    pub from: Point,
    pub to: Point,
    /// Tip, left wing, right wing. The tip sits on `to`.
    pub arrow: [Point; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub edges: Vec<OverlayEdge>,
    /// Page-space area covered by the edges and their arrowheads
    pub view_box: Bounds,
    pub style: OverlayStyle,
}

impl Overlay {
    /// SVG underlay in page coordinates. It never takes pointer events.
    pub fn to_svg(&self) -> String {
        self.to_string()
    }
}

/// Lay out one edge per connection.
///
/// Returns `None` when there is nothing to draw, so hosts mount no container.
pub fn render_overlay(snapshot: &GraphSnapshot, style: &OverlayStyle) -> Option<Overlay> {
    let edges: Vec<OverlayEdge> = snapshot
        .connections
        .iter()
        .filter_map(|connection| {
            let source = snapshot.notebook(&connection.source)?;
            let target = snapshot.notebook(&connection.target)?;
            edge_between(
                connection.source.clone(),
                connection.target.clone(),
                source.bounds.center(),
                target.bounds.center(),
                style.arrow_size,
            )
        })
        .collect();

    if edges.is_empty() {
        return None;
    }

    let view_box = covering_bounds(&edges, style.arrow_size.max(style.stroke_width));

    Some(Overlay {
        edges,
        view_box,
        style: style.clone(),
    })
}

fn edge_between(
    source: ShapeId,
    target: ShapeId,
    from: Point,
    to: Point,
    arrow_size: f32,
) -> Option<OverlayEdge> {
    let length = from.distance_to(to);
    // Overlapping centers have no direction to draw
    if length <= f32::EPSILON {
        return None;
    }

    let ux = (to.x - from.x) / length;
    let uy = (to.y - from.y) / length;
    let base = Point::new(to.x - ux * arrow_size, to.y - uy * arrow_size);
    let half = arrow_size / 2.0;

    Some(OverlayEdge {
        source,
        target,
        from,
        to,
        arrow: [
            to,
            Point::new(base.x - uy * half, base.y + ux * half),
            Point::new(base.x + uy * half, base.y - ux * half),
        ],
    })
}

fn covering_bounds(edges: &[OverlayEdge], padding: f32) -> Bounds {
    let mut min = Point::new(f32::INFINITY, f32::INFINITY);
    let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);

    for point in edges
        .iter()
        .flat_map(|edge| [edge.from, edge.to].into_iter().chain(edge.arrow))
    {
        min.x = min.x.min(point.x);
        min.y = min.y.min(point.y);
        max.x = max.x.max(point.x);
        max.y = max.y.max(point.y);
    }

    Bounds::new(
        min.x - padding,
        min.y - padding,
        max.x - min.x + padding * 2.0,
        max.y - min.y + padding * 2.0,
    )
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vb = self.view_box;
        writeln!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" class="trellis-connections" viewBox="{} {} {} {}" width="{}" height="{}" pointer-events="none" style="position:absolute;left:{}px;top:{}px;overflow:visible;pointer-events:none">"#,
            vb.x, vb.y, vb.width, vb.height, vb.width, vb.height, vb.x, vb.y
        )?;
        writeln!(
            f,
            r#"  <g stroke="{stroke}" stroke-width="{width}" opacity="{opacity}" fill="{stroke}" stroke-linecap="round">"#,
            stroke = escape_xml(&self.style.stroke),
            width = self.style.stroke_width,
            opacity = self.style.opacity,
        )?;
        for edge in &self.edges {
            writeln!(
                f,
                r#"    <line data-source="{}" data-target="{}" x1="{}" y1="{}" x2="{}" y2="{}" />"#,
                escape_xml(edge.source.as_str()),
                escape_xml(edge.target.as_str()),
                edge.from.x,
                edge.from.y,
                edge.to.x,
                edge.to.y
            )?;
            let [tip, left, right] = edge.arrow;
            writeln!(
                f,
                r#"    <polygon points="{},{} {},{} {},{}" stroke="none" />"#,
                tip.x, tip.y, left.x, left.y, right.x, right.y
            )?;
        }
        writeln!(f, "  </g>")?;
        writeln!(f, "</svg>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NotebookId, NotebookShape};

    fn shape(id: &str, title: &str, markdown: &str, x: f32, y: f32) -> NotebookShape {
        NotebookShape {
            id: ShapeId::new(id),
            notebook_id: NotebookId::new(format!("{}-id", id)),
            title: title.to_string(),
            markdown: markdown.to_string(),
            x,
            y,
            width: 100.0,
            height: 50.0,
        }
    }

    #[test]
    fn test_empty_connection_set_renders_nothing() {
        let snapshot = GraphSnapshot::derive(
            1,
            vec![
                shape("A", "A", "no links", 0.0, 0.0),
                shape("B", "B", "[[missing]]", 200.0, 0.0),
            ],
        );
        assert!(render_overlay(&snapshot, &OverlayStyle::default()).is_none());
        assert!(render_overlay(&GraphSnapshot::default(), &OverlayStyle::default()).is_none());
    }

    #[test]
    fn test_edge_runs_center_to_center() {
        let snapshot = GraphSnapshot::derive(
            1,
            vec![
                shape("A", "A", "[[B]]", 0.0, 0.0),
                shape("B", "B", "", 300.0, 100.0),
            ],
        );
        let overlay = render_overlay(&snapshot, &OverlayStyle::default()).unwrap();

        assert_eq!(overlay.edges.len(), 1);
        let edge = &overlay.edges[0];
        assert_eq!(edge.from, Point::new(50.0, 25.0));
        assert_eq!(edge.to, Point::new(350.0, 125.0));
        assert_eq!(edge.arrow[0], edge.to);
    }

    #[test]
    fn test_arrowhead_points_at_target() {
        let style = OverlayStyle {
            arrow_size: 10.0,
            ..OverlayStyle::default()
        };
        let snapshot = GraphSnapshot::derive(
            1,
            vec![
                shape("A", "A", "[[B]]", 0.0, 0.0),
                shape("B", "B", "", 200.0, 0.0),
            ],
        );
        let overlay = render_overlay(&snapshot, &style).unwrap();
        let [tip, left, right] = overlay.edges[0].arrow;

        // Horizontal edge to the right: wings sit 10 units behind the tip.
        assert_eq!(tip, Point::new(250.0, 25.0));
        assert!((left.x - 240.0).abs() < 1e-4);
        assert!((right.x - 240.0).abs() < 1e-4);
        assert!(((left.y - right.y).abs() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_geometry_follows_live_positions() {
        let mut shapes = vec![
            shape("A", "A", "[[B]]", 0.0, 0.0),
            shape("B", "B", "", 200.0, 0.0),
        ];
        let style = OverlayStyle::default();
        let before = render_overlay(&GraphSnapshot::derive(1, shapes.clone()), &style).unwrap();

        shapes[1].y = 400.0;
        let after = render_overlay(&GraphSnapshot::derive(2, shapes), &style).unwrap();

        assert_ne!(before.edges[0].to, after.edges[0].to);
        assert_eq!(after.edges[0].to, Point::new(250.0, 425.0));
    }

    #[test]
    fn test_svg_ignores_pointer_events() {
        let snapshot = GraphSnapshot::derive(
            1,
            vec![
                shape("A", "A", "[[B]] [[C]]", 0.0, 0.0),
                shape("B", "B", "", 200.0, 0.0),
                shape("C", "C", "", 0.0, 200.0),
            ],
        );
        let svg = render_overlay(&snapshot, &OverlayStyle::default())
            .unwrap()
            .to_svg();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"pointer-events="none""#));
        assert_eq!(svg.matches("<line ").count(), 2);
        assert_eq!(svg.matches("<polygon ").count(), 2);
        assert!(svg.contains(r#"data-source="A" data-target="C""#));
    }

    #[test]
    fn test_view_box_covers_edges() {
        let snapshot = GraphSnapshot::derive(
            1,
            vec![
                shape("A", "A", "[[B]]", -500.0, -500.0),
                shape("B", "B", "", 500.0, 500.0),
            ],
        );
        let overlay = render_overlay(&snapshot, &OverlayStyle::default()).unwrap();
        let vb = overlay.view_box;

        for edge in &overlay.edges {
            for point in [edge.from, edge.to] {
                assert!(point.x >= vb.x && point.x <= vb.x + vb.width);
                assert!(point.y >= vb.y && point.y <= vb.y + vb.height);
            }
        }
    }
}
