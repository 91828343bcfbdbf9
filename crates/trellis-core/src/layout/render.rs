use log::warn;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::Simulation;
use crate::config::{GraphPalette, GraphViewConfig};
use crate::error::{Result, TrellisError};
use crate::model::ShapeId;

/// Parse `#rrggbb` or `#rrggbbaa`.
pub fn parse_color(value: &str) -> Result<Color> {
    let invalid = || TrellisError::InvalidColor(value.to_string());

    let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return Err(invalid());
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };

    Ok(Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, alpha))
}

pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|err| TrellisError::Encode(err.to_string()))
}

struct Palette {
    background: Color,
    link: Color,
    node: Color,
    node_stroke: Color,
    hovered: Color,
    selected: Color,
}

impl Palette {
    fn from_config(palette: &GraphPalette) -> Result<Self> {
        Ok(Self {
            background: parse_color(&palette.background)?,
            link: parse_color(&palette.link)?,
            node: parse_color(&palette.node)?,
            node_stroke: parse_color(&palette.node_stroke)?,
            hovered: parse_color(&palette.hovered)?,
            selected: parse_color(&palette.selected)?,
        })
    }
}

/// Draws a simulation onto a raster surface.
///
/// Links are lines, nodes filled circles sized by their radius. The hovered
/// and selected nodes, and the links touching them, take the highlight colors.
pub struct GraphRenderer {
    width: u32,
    height: u32,
    palette: Palette,
}

impl GraphRenderer {
    pub fn new(config: &GraphViewConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(TrellisError::Surface {
                width: config.width,
                height: config.height,
            });
        }

        let palette = match Palette::from_config(&config.palette) {
            Ok(palette) => palette,
            Err(err) => {
                warn!("{}, falling back to the default graph palette", err);
                Palette::from_config(&GraphPalette::default())?
            }
        };

        Ok(Self {
            width: config.width,
            height: config.height,
            palette,
        })
    }

    pub fn render(
        &self,
        simulation: &Simulation,
        hovered: Option<&ShapeId>,
        selected: Option<&ShapeId>,
    ) -> Result<Pixmap> {
        let mut pixmap = Pixmap::new(self.width, self.height).ok_or(TrellisError::Surface {
            width: self.width,
            height: self.height,
        })?;
        pixmap.fill(self.palette.background);

        let highlight = |shape: &ShapeId| {
            if selected == Some(shape) {
                Some(self.palette.selected)
            } else if hovered == Some(shape) {
                Some(self.palette.hovered)
            } else {
                None
            }
        };

        let nodes = simulation.nodes();

        let link_stroke = Stroke {
            width: 1.5,
            ..Stroke::default()
        };
        for link in simulation.links() {
            let (source, target) = (&nodes[link.source], &nodes[link.target]);

            let mut pb = PathBuilder::new();
            pb.move_to(source.position.x, source.position.y);
            pb.line_to(target.position.x, target.position.y);
            let Some(path) = pb.finish() else {
                continue;
            };

            let color = highlight(&source.info.shape_id)
                .or_else(|| highlight(&target.info.shape_id))
                .unwrap_or(self.palette.link);
            pixmap.stroke_path(&path, &paint(color), &link_stroke, Transform::identity(), None);
        }

        for node in nodes {
            let Some(circle) =
                PathBuilder::from_circle(node.position.x, node.position.y, node.radius)
            else {
                continue;
            };

            let accent = highlight(&node.info.shape_id);
            let fill = accent.unwrap_or(self.palette.node);
            pixmap.fill_path(
                &circle,
                &paint(fill),
                FillRule::Winding,
                Transform::identity(),
                None,
            );

            let outline = Stroke {
                width: if accent.is_some() { 2.5 } else { 1.0 },
                ..Stroke::default()
            };
            pixmap.stroke_path(
                &circle,
                &paint(self.palette.node_stroke),
                &outline,
                Transform::identity(),
                None,
            );
        }

        Ok(pixmap)
    }
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}
