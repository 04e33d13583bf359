//! Caller-supplied options for a transformation run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Runtime options supplied alongside a transformation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Folder the staged working directory is created under. Must exist when
    /// set; defaults to the application's parent directory.
    pub output_folder: Option<PathBuf>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.output_folder = Some(folder.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let configuration: Configuration = serde_json::from_str("{}").unwrap();
        assert!(configuration.output_folder.is_none());
    }
}
