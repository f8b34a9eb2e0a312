use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("pixel coordinates need a positive video size, got {width}x{height}")]
    InvalidVideoDimensions { width: u32, height: u32 },

    #[error("bbox at {t_ms} ms has negative width or height")]
    NegativeBoxSize { t_ms: u64 },

    #[error("non-finite coordinate at {t_ms} ms")]
    NonFiniteCoordinate { t_ms: u64 },

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
}
