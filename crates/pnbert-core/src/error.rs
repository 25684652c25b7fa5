//! BERT error types

use thiserror::Error;

/// Result type for pattern engine operations
pub type BertResult<T> = Result<T, BertError>;

/// Errors surfaced by the pattern engine.
///
/// Sync loss is not an error; it is a state transition reported through
/// the checker counters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BertError {
    /// Raw variant code outside {11, 15, 23}
    #[error("Invalid PN variant code: {0}. Must be 11, 15 or 23")]
    InvalidVariant(u32),

    /// Caller asked for more bytes than the buffer holds
    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    /// Configuration value out of range
    #[error("Invalid config: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("Failed to read config: {0}")]
    ConfigRead(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),
}

impl BertError {
    /// Check if this error came from the configuration layer
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            BertError::Config(_) | BertError::ConfigRead(_) | BertError::ConfigParse(_)
        )
    }
}

/// Resolve an explicit `(buffer, length)` request, failing before any byte is touched.
pub(crate) fn checked_len(length: usize, available: usize) -> BertResult<usize> {
    if length > available {
        return Err(BertError::BufferTooShort {
            expected: length,
            actual: available,
        });
    }
    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_len() {
        assert_eq!(checked_len(0, 0), Ok(0));
        assert_eq!(checked_len(4, 8), Ok(4));
        assert_eq!(checked_len(8, 8), Ok(8));
        assert_eq!(
            checked_len(9, 8),
            Err(BertError::BufferTooShort { expected: 9, actual: 8 })
        );
    }

    #[test]
    fn test_display() {
        let err = BertError::BufferTooShort { expected: 16, actual: 4 };
        assert_eq!(err.to_string(), "Buffer too short: expected 16, got 4");
        assert!(BertError::InvalidVariant(9).to_string().contains("9"));
    }

    #[test]
    fn test_is_config_error() {
        assert!(BertError::ConfigParse("bad".into()).is_config_error());
        assert!(!BertError::InvalidVariant(7).is_config_error());
    }
}
