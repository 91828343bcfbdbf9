/// Generate a shape handle for a notebook placed on the in-memory board.
///
/// Shape handles look like `shape:<nanoid>` with the default nanoid alphabet,
/// matching the canvas engine's own handles.
pub fn generate_shape_id() -> String {
    format!("shape:{}", nanoid::nanoid!(21))
}
