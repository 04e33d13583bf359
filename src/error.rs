//! Typed errors raised by utilities and by the engine itself.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Error raised by a utility while executing against the working directory.
///
/// Cloneable so the same failure can sit in the context's result map and in
/// the abort state at once.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UtilityError {
    message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl UtilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying cause, keeping `message` as the displayed text.
    pub fn with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        let source: Box<dyn std::error::Error + Send + Sync> = source.into().into();
        Self {
            message: message.into(),
            source: Some(Arc::from(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Terminal failure of a transformation run.
#[derive(Debug, Error)]
pub enum TransformationError {
    /// A utility with abort-on-failure set failed and the template unwound.
    ///
    /// The staged working directory is left on disk for inspection; `result`
    /// carries its location and whatever manual instructions had accumulated.
    #[error("{message}")]
    Aborted {
        message: String,
        utility: String,
        #[source]
        source: Option<UtilityError>,
        result: crate::transformation::TransformationResult,
    },

    /// The engine hit a state it cannot continue from.
    #[error("internal transformation error: {0}")]
    Internal(String),

    /// The configured output folder does not exist or is not a directory.
    #[error("invalid output folder: {}", .path.display())]
    InvalidOutputFolder { path: PathBuf },

    /// The working directory could not be created or populated.
    #[error("failed to stage working directory at {}", .path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utility_error_displays_message() {
        let error = UtilityError::new("pom file is missing");
        assert_eq!(error.to_string(), "pom file is missing");
        assert!(std::error::Error::source(&error).is_none());
    }

    #[test]
    fn utility_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let error = UtilityError::with_source("could not read descriptor", io);
        assert_eq!(error.to_string(), "could not read descriptor");
        let source = std::error::Error::source(&error).expect("source");
        assert!(source.to_string().contains("no such file"));
    }
}
