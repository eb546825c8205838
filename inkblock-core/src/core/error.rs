//! Error types for the Inkblock core library.

use thiserror::Error;

/// All errors that can occur within the Inkblock core library.
#[derive(Debug, Error)]
pub enum InkblockError {
    /// A structural delete referenced a block ID absent from the supplied snapshot.
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    /// The block model and the cursor or structure logic have diverged.
    ///
    /// Signals a programming defect rather than a user error. Callers must
    /// surface it in diagnostics and abort the offending operation.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A deletion range does not fit inside the sequence it was built for.
    #[error("Invalid range [{from}, {to}) for a sequence of {len} blocks")]
    InvalidRange {
        /// Inclusive start index.
        from: usize,
        /// Exclusive end index.
        to: usize,
        /// Length of the sequence the range was checked against.
        len: usize,
    },

    /// Note content parsed as JSON but is not a block document.
    #[error("Invalid note content: {0}")]
    InvalidContent(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Note content or settings could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias that pins the error type to [`InkblockError`].
pub type Result<T> = std::result::Result<T, InkblockError>;

impl InkblockError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::BlockNotFound(_) => "Block no longer exists".to_string(),
            Self::InvariantViolation(_) => "The cursor could not be placed".to_string(),
            Self::InvalidRange { .. } => "The selection is out of date".to_string(),
            Self::InvalidContent(_) => "Note content is damaged".to_string(),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_not_found_message_names_block() {
        let e = InkblockError::BlockNotFound("block-7".to_string());
        assert!(e.to_string().contains("block-7"));
        assert_eq!(e.user_message(), "Block no longer exists");
    }

    #[test]
    fn test_invalid_range_display() {
        let e = InkblockError::InvalidRange { from: 2, to: 5, len: 3 };
        assert_eq!(e.to_string(), "Invalid range [2, 5) for a sequence of 3 blocks");
    }
}
