// ---------------------------------------------------------------------------
// SimError: construction-time misuse and snapshot encoding failures
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors surfaced by the simulation core.
///
/// Per-tick operations never fail: out-of-range input is clamped. Only building
/// a grid with non-positive dimensions and encoding a snapshot can error.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A grid was requested with a zero width or height.
    InvalidGridDimensions {
        what: &'static str,
        width: usize,
        height: usize,
    },
    /// Encoding a snapshot failed.
    Serialize(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidGridDimensions {
                what,
                width,
                height,
            } => write!(
                f,
                "Invalid {what} dimensions {width}x{height}: width and height must be positive"
            ),
            SimError::Serialize(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for SimError {}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Serialize(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_dimensions() {
        let err = SimError::InvalidGridDimensions {
            what: "energy field",
            width: 0,
            height: 40,
        };
        let msg = err.to_string();
        assert!(msg.contains("energy field"), "got: {msg}");
        assert!(msg.contains("0x40"), "got: {msg}");
    }

    #[test]
    fn test_display_serialize() {
        let err = SimError::Serialize("bad float".to_string());
        assert_eq!(err.to_string(), "Serialization error: bad float");
    }
}
