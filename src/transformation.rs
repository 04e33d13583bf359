//! Transformation inputs and the result handed back to the caller.

use std::path::{Path, PathBuf};

use crate::config::Configuration;
use crate::context::ManualInstruction;
use crate::recipe::{Template, UpgradePath};

/// Pointer to the application directory to transform.
///
/// The folder itself is never written to; the engine stages a copy next to
/// it and mutates the copy.
#[derive(Debug, Clone)]
pub struct Application {
    folder: PathBuf,
}

impl Application {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Final path component, used to name the staged working directory.
    pub fn name(&self) -> String {
        self.folder
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "application".to_string())
    }
}

/// What the engine should drive: a single template or an upgrade path.
#[derive(Debug)]
pub enum Recipe {
    Template(Template),
    UpgradePath(UpgradePath),
}

/// A transformation request: the recipe plus the application it targets.
#[derive(Debug)]
pub struct Transformation {
    application: Application,
    configuration: Configuration,
    recipe: Recipe,
    transformed_location: Option<PathBuf>,
}

impl Transformation {
    pub fn new(application: Application, configuration: Configuration, recipe: Recipe) -> Self {
        Self {
            application,
            configuration,
            recipe,
            transformed_location: None,
        }
    }

    pub fn application(&self) -> &Application {
        &self.application
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    /// Where the staged working copy lives, once staging has run.
    pub fn transformed_location(&self) -> Option<&Path> {
        self.transformed_location.as_deref()
    }

    pub(crate) fn set_transformed_location(&mut self, location: PathBuf) {
        self.transformed_location = Some(location);
    }
}

/// Outcome of a transformation run.
#[derive(Debug, Clone)]
pub struct TransformationResult {
    transformed_location: PathBuf,
    manual_instructions: Vec<ManualInstruction>,
    aborted: bool,
}

impl TransformationResult {
    pub(crate) fn new(
        transformed_location: PathBuf,
        manual_instructions: Vec<ManualInstruction>,
        aborted: bool,
    ) -> Self {
        Self {
            transformed_location,
            manual_instructions,
            aborted,
        }
    }

    pub fn transformed_location(&self) -> &Path {
        &self.transformed_location
    }

    /// Follow-ups the user must perform outside the automated pipeline,
    /// aggregated across every template context.
    pub fn manual_instructions(&self) -> &[ManualInstruction] {
        &self.manual_instructions
    }

    pub fn aborted(&self) -> bool {
        self.aborted
    }
}
