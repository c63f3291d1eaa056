//! Error types for sinks.

use thiserror::Error;

/// Errors a sink can raise while accepting data or signals.
///
/// Backpressure is not an error: it is reported through
/// [`Delivery::Blocked`](crate::Delivery) and [`Ack::Blocked`](crate::Ack).
#[derive(Debug, Error)]
pub enum SinkError {
    /// The underlying writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink has been closed and accepts nothing more.
    #[error("sink is closed")]
    Closed,

    /// The sink refused the input.
    #[error("rejected: {0}")]
    Rejected(String),

    /// A stage further down the chain failed.
    #[error("downstream error: {0}")]
    Downstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SinkError {
    /// Wrap an error raised by a downstream stage.
    pub fn downstream(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Downstream(Box::new(err))
    }
}

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe gone");
        let err: SinkError = io.into();
        assert!(matches!(err, SinkError::Io(_)));
        assert!(err.to_string().contains("pipe gone"));
    }

    #[test]
    fn test_downstream_keeps_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "deep");
        let err = SinkError::downstream(inner);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "deep");
    }
}
