//! Recipes: ordered utility trees and upgrade paths.

use crate::utility::Utility;

/// An ordered tree of utilities encoding one transformation.
#[derive(Debug)]
pub struct Template {
    name: String,
    utilities: Vec<Utility>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            utilities: Vec::new(),
        }
    }

    pub fn with_utility(mut self, utility: Utility) -> Self {
        self.utilities.push(utility);
        self
    }

    pub fn add(&mut self, utility: Utility) {
        self.utilities.push(utility);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn utilities(&self) -> &[Utility] {
        &self.utilities
    }
}

/// One step of an upgrade path, taking the application between two versions.
#[derive(Debug)]
pub struct UpgradeStep {
    source_version: String,
    target_version: String,
    template: Template,
}

impl UpgradeStep {
    pub fn new(
        source_version: impl Into<String>,
        target_version: impl Into<String>,
        template: Template,
    ) -> Self {
        Self {
            source_version: source_version.into(),
            target_version: target_version.into(),
            template,
        }
    }

    pub fn source_version(&self) -> &str {
        &self.source_version
    }

    pub fn target_version(&self) -> &str {
        &self.target_version
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

/// A sequence of templates taking an application across versions.
///
/// Steps are consumed exhaustively: each step runs exactly once, in ascending
/// version order, unless an earlier step aborts.
#[derive(Debug, Default)]
pub struct UpgradePath {
    steps: Vec<UpgradeStep>,
}

impl UpgradePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: UpgradeStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[UpgradeStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
