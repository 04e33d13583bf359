//! Result algebra spoken between utilities and the engine.
//!
//! Utilities produce [`ExecutionResult`]s: operations report how a file
//! mutation went, value utilities report what they computed. The engine wraps
//! every invocation in a [`PerformResult`], which adds the skip and
//! engine-error cases a utility never emits itself.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::context::ManualInstruction;
use crate::error::UtilityError;

/// Outcome tag of a file-mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Success,
    /// The operation ran but found nothing to change.
    NoOp,
    Warning,
    Error,
}

/// Result emitted by a utility that mutates files.
#[derive(Debug, Clone)]
pub struct OperationResult {
    status: OperationStatus,
    details: Option<String>,
    warnings: Vec<String>,
    error: Option<UtilityError>,
}

impl OperationResult {
    pub fn success(details: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Success,
            details: Some(details.into()),
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn no_op(details: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::NoOp,
            details: Some(details.into()),
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn warning(details: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Warning,
            details: Some(details.into()),
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn error(error: UtilityError) -> Self {
        Self {
            status: OperationStatus::Error,
            details: None,
            warnings: Vec::new(),
            error: Some(error),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach a warning message, upgrading a `Success` to `Warning`.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        if self.status == OperationStatus::Success {
            self.status = OperationStatus::Warning;
        }
        self
    }

    pub fn status(&self) -> OperationStatus {
        self.status
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn cause(&self) -> Option<&UtilityError> {
        self.error.as_ref()
    }
}

/// The value kinds the engine inspects, plus an opaque passthrough.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityValue {
    Bool(bool),
    Text(String),
    /// Working-directory-relative paths, ordered, deduplicated by the producer.
    Files(Vec<PathBuf>),
    List(Vec<UtilityValue>),
    Instruction(ManualInstruction),
    /// A value the engine merely threads between utilities.
    Other(serde_json::Value),
}

impl UtilityValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_files(&self) -> Option<&[PathBuf]> {
        match self {
            Self::Files(files) => Some(files),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for UtilityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::Files(files) => write!(f, "{} file(s)", files.len()),
            Self::List(items) => write!(f, "{} item(s)", items.len()),
            Self::Instruction(instruction) => f.write_str(&instruction.summary),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

/// Result emitted by a utility that computes a value.
#[derive(Debug, Clone)]
pub enum ValueResult {
    /// The utility ran but has nothing to report.
    Null,
    Value(UtilityValue),
    Warning {
        value: UtilityValue,
        warnings: Vec<String>,
    },
    Error(UtilityError),
}

impl ValueResult {
    /// The carried value, present for the `Value` and `Warning` tags.
    pub fn value(&self) -> Option<&UtilityValue> {
        match self {
            Self::Value(value) | Self::Warning { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// What a utility handed back: a mutation report or a computed value.
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    Operation(OperationResult),
    Value(ValueResult),
}

impl ExecutionResult {
    pub fn is_error(&self) -> bool {
        match self {
            Self::Operation(operation) => operation.status() == OperationStatus::Error,
            Self::Value(value) => value.is_error(),
        }
    }
}

/// What the engine recorded for one utility invocation.
#[derive(Debug, Clone)]
pub enum PerformResult {
    Executed(ExecutionResult),
    /// An `execute_if`/`execute_unless` condition did not hold.
    SkippedCondition { details: String },
    /// A named dependency never produced a usable result.
    SkippedDependency { details: String },
    /// The utility raised instead of returning a result.
    Error {
        error: UtilityError,
        details: String,
    },
}

impl PerformResult {
    /// True for engine errors and for execution results tagged as errors.
    pub fn is_error(&self) -> bool {
        match self {
            Self::Error { .. } => true,
            Self::Executed(result) => result.is_error(),
            _ => false,
        }
    }

    /// Whether a dependent utility must treat this result as a failed
    /// prerequisite: anything that did not execute, or executed with an
    /// error tag.
    pub fn dependency_failure(&self) -> bool {
        match self {
            Self::Executed(result) => result.is_error(),
            _ => true,
        }
    }

    pub fn execution_result(&self) -> Option<&ExecutionResult> {
        match self {
            Self::Executed(result) => Some(result),
            _ => None,
        }
    }
}

/// Shorten `text` to at most `max` characters for log output.
pub(crate) fn abbreviate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn warning_upgrades_success() {
        let result = OperationResult::success("replaced 3 occurrences").with_warning("file had CRLF line endings");
        assert_eq!(result.status(), OperationStatus::Warning);
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn skipped_results_are_dependency_failures() {
        let skipped = PerformResult::SkippedCondition {
            details: "condition does not hold".into(),
        };
        assert!(skipped.dependency_failure());
        assert!(!skipped.is_error());
    }

    #[test]
    fn executed_error_is_both_error_and_dependency_failure() {
        let result = PerformResult::Executed(ExecutionResult::Operation(OperationResult::error(
            UtilityError::new("write failed"),
        )));
        assert!(result.is_error());
        assert!(result.dependency_failure());
    }

    #[test]
    fn executed_value_is_neither() {
        let result =
            PerformResult::Executed(ExecutionResult::Value(ValueResult::Value(UtilityValue::Bool(true))));
        assert!(!result.is_error());
        assert!(!result.dependency_failure());
    }

    #[test]
    fn abbreviate_truncates_long_text() {
        let text = "x".repeat(200);
        let short = abbreviate(&text, 120);
        assert_eq!(short.chars().count(), 120);
        assert!(short.ends_with("..."));
        assert_eq!(abbreviate("short", 120), "short");
    }
}
