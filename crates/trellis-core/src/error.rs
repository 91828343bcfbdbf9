use thiserror::Error;

/// Errors raised outside the link pipeline itself.
///
/// Parsing, resolution and graph building never fail: malformed and
/// dangling links are represented by absence.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("invalid color {0:?}, expected #rrggbb or #rrggbbaa")]
    InvalidColor(String),

    #[error("cannot allocate a {width}x{height} raster surface")]
    Surface { width: u32, height: u32 },

    #[error("failed to encode frame: {0}")]
    Encode(String),

    #[error("failed to serialize graph: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrellisError>;
