use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle of a canvas node.
/// Only used for selection, navigation and as connection endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeId(pub String);

impl ShapeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable content identity of a notebook, survives renames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotebookId(pub String);

impl NotebookId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh identity for a notebook being created.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotebookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Core internal coordinate, in canvas page space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }
}

/// The resolvable identity of a notebook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotebookInfo {
    pub shape_id: ShapeId,
    pub notebook_id: NotebookId,
    pub title: String,
}

impl NotebookInfo {
    pub fn new(
        shape_id: impl Into<String>,
        notebook_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            shape_id: ShapeId::new(shape_id),
            notebook_id: NotebookId::new(notebook_id),
            title: title.into(),
        }
    }
}

/// A notebook identity together with its raw markdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    pub info: NotebookInfo,
    pub text: String,
}

impl Notebook {
    pub fn new(info: NotebookInfo, text: impl Into<String>) -> Self {
        Self {
            info,
            text: text.into(),
        }
    }
}

/// A notebook node as enumerated from the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookShape {
    pub id: ShapeId,
    pub notebook_id: NotebookId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markdown: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NotebookShape {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    /// Identity of this shape. A blank title falls back to the one derived
    /// from the markdown.
    pub fn info(&self) -> NotebookInfo {
        let title = if self.title.trim().is_empty() {
            crate::parser::derive_title(&self.markdown).unwrap_or_default()
        } else {
            self.title.trim().to_string()
        };

        NotebookInfo {
            shape_id: self.id.clone(),
            notebook_id: self.notebook_id.clone(),
            title,
        }
    }
}

/// Directed edge: the source notebook links to the target notebook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub source: ShapeId,
    pub target: ShapeId,
}

impl Connection {
    pub fn new(source: ShapeId, target: ShapeId) -> Self {
        Self { source, target }
    }

    pub fn pair(&self) -> (ShapeId, ShapeId) {
        (self.source.clone(), self.target.clone())
    }
}
