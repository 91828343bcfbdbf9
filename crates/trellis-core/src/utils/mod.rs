pub mod id;

pub use id::generate_shape_id;
