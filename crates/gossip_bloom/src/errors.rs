use thiserror::Error;

#[derive(Debug, Error)]
pub enum BloomError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("bit position {pos} out of bounds for length {len}")]
    BitOutOfBounds { pos: u64, len: u64 },

    #[error("false positive rate must be in (0, 1), got {0}")]
    InvalidFalsePositiveRate(f64),

    /// Only raised by config validation; the constructors size zero items
    /// to a keyless filter.
    #[error("expected item count must be non-zero")]
    InvalidItemCount,
}

pub type Result<T> = std::result::Result<T, BloomError>;
