//! Collaborators at the edge of the pipeline: the canvas that holds the
//! notebooks and the host that can focus one of them.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use crate::model::{NotebookId, NotebookShape, ShapeId};
use crate::utils::generate_shape_id;

/// Synchronous enumeration of the notebook shapes currently on a canvas.
pub trait Board: Send + Sync {
    /// Every notebook shape, in canvas order.
    fn notebook_shapes(&self) -> Vec<NotebookShape>;
}

/// Moves the host's attention to a shape: select it and scroll it into view.
pub trait Navigator: Send + Sync {
    fn focus(&self, shape: &ShapeId);
}

impl<F> Navigator for F
where
    F: Fn(&ShapeId) + Send + Sync,
{
    fn focus(&self, shape: &ShapeId) {
        self(shape)
    }
}

/// A board kept in memory, for hosts without a canvas engine.
#[derive(Default)]
pub struct MemoryBoard {
    shapes: RwLock<Vec<NotebookShape>>,
}

impl MemoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shapes(shapes: Vec<NotebookShape>) -> Self {
        Self {
            shapes: RwLock::new(shapes),
        }
    }

    /// Place a new notebook with fresh shape and notebook IDs.
    pub fn create(&self, title: &str, markdown: &str, x: f32, y: f32) -> NotebookShape {
        let shape = NotebookShape {
            id: ShapeId::new(generate_shape_id()),
            notebook_id: NotebookId::generate(),
            title: title.to_string(),
            markdown: markdown.to_string(),
            x,
            y,
            width: 320.0,
            height: 240.0,
        };
        debug!("Created notebook {} ({})", shape.id, shape.notebook_id);
        self.write().push(shape.clone());
        shape
    }

    /// Insert a shape as-is, replacing any shape with the same ID.
    pub fn insert(&self, shape: NotebookShape) {
        let mut shapes = self.write();
        match shapes.iter_mut().find(|existing| existing.id == shape.id) {
            Some(existing) => *existing = shape,
            None => shapes.push(shape),
        }
    }

    pub fn set_markdown(&self, id: &ShapeId, markdown: &str) -> bool {
        self.update(id, |shape| shape.markdown = markdown.to_string())
    }

    pub fn set_title(&self, id: &ShapeId, title: &str) -> bool {
        self.update(id, |shape| shape.title = title.to_string())
    }

    pub fn move_to(&self, id: &ShapeId, x: f32, y: f32) -> bool {
        self.update(id, |shape| {
            shape.x = x;
            shape.y = y;
        })
    }

    pub fn resize(&self, id: &ShapeId, width: f32, height: f32) -> bool {
        self.update(id, |shape| {
            shape.width = width;
            shape.height = height;
        })
    }

    pub fn delete(&self, id: &ShapeId) -> bool {
        let mut shapes = self.write();
        let before = shapes.len();
        shapes.retain(|shape| &shape.id != id);
        shapes.len() != before
    }

    pub fn get(&self, id: &ShapeId) -> Option<NotebookShape> {
        self.read().iter().find(|shape| &shape.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn update(&self, id: &ShapeId, apply: impl FnOnce(&mut NotebookShape)) -> bool {
        match self.write().iter_mut().find(|shape| &shape.id == id) {
            Some(shape) => {
                apply(shape);
                true
            }
            None => false,
        }
    }

    // A panic while holding the lock cannot leave a half-written shape behind,
    // so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Vec<NotebookShape>> {
        self.shapes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<NotebookShape>> {
        self.shapes.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Board for MemoryBoard {
    fn notebook_shapes(&self) -> Vec<NotebookShape> {
        self.read().clone()
    }
}
