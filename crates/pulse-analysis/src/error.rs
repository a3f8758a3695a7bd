use pulse_base::format_bytes;
use pulse_image::FrameError;
use std::fmt;

#[derive(Debug)]
pub enum AnalysisError {
    /// No frames were supplied.
    EmptyInput,
    /// One frame exhausted the re-encode fallback ladder. Fatal for the
    /// whole batch: dropping a sample from the middle of a temporally
    /// ordered sequence corrupts the downstream signal.
    FrameEncode { index: usize, source: FrameError },
    /// The payload still exceeds the hard ceiling after every compression
    /// and truncation step.
    PayloadTooLarge { size_bytes: usize, max_bytes: usize },
    /// The payload envelope could not be serialized.
    Serialize(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::EmptyInput => write!(f, "no frames provided"),
            AnalysisError::FrameEncode { index, source } => {
                write!(f, "frame {index} could not be re-encoded: {source}")
            }
            AnalysisError::PayloadTooLarge {
                size_bytes,
                max_bytes,
            } => write!(
                f,
                "payload {} exceeds the {} maximum",
                format_bytes(*size_bytes),
                format_bytes(*max_bytes)
            ),
            AnalysisError::Serialize(msg) => write!(f, "serialize error: {msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::FrameEncode { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Serialize(err.to_string())
    }
}
