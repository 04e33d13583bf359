//! Per-template execution state threaded through a transformation.
//!
//! Every template gets its own [`TransformationContext`]. Within an upgrade
//! path the context of step *k* inherits the value and result maps of step
//! *k−1*, so later steps read through to earlier writes.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::UtilityError;
use crate::result::{PerformResult, UtilityValue};

/// Work the user must carry out by hand after the automated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualInstruction {
    /// One-line summary of the follow-up.
    pub summary: String,
    /// Optional document with the full write-up, relative to the working
    /// directory.
    pub document: Option<PathBuf>,
}

impl ManualInstruction {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            document: None,
        }
    }

    pub fn with_document(mut self, document: impl Into<PathBuf>) -> Self {
        self.document = Some(document.into());
        self
    }
}

/// Why a template aborted.
#[derive(Debug, Clone)]
pub struct AbortDetails {
    pub message: String,
    /// Name of the failing utility.
    pub utility: String,
    pub error: Option<UtilityError>,
}

/// One dispatcher invocation, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRecord {
    /// Dotted order stamp within the template.
    pub order: String,
    /// Name of the dispatched utility.
    pub utility: String,
}

/// Key/value store, manual-instruction log, and abort state for one template.
#[derive(Debug, Clone, Default)]
pub struct TransformationContext {
    template: String,
    values: IndexMap<String, UtilityValue>,
    results: IndexMap<String, PerformResult>,
    instructions: Vec<ManualInstruction>,
    journal: Vec<ExecutionRecord>,
    abort: Option<AbortDetails>,
}

impl TransformationContext {
    pub(crate) fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    /// A context for the next upgrade step, inheriting the predecessor's
    /// value and result maps. Instructions, journal, and abort state start
    /// fresh.
    pub(crate) fn chained(template: impl Into<String>, predecessor: &TransformationContext) -> Self {
        Self {
            template: template.into(),
            values: predecessor.values.clone(),
            results: predecessor.results.clone(),
            instructions: Vec::new(),
            journal: Vec::new(),
            abort: None,
        }
    }

    /// Name of the template this context belongs to.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn value(&self, name: &str) -> Option<&UtilityValue> {
        self.values.get(name)
    }

    pub fn result(&self, name: &str) -> Option<&PerformResult> {
        self.results.get(name)
    }

    pub fn values(&self) -> &IndexMap<String, UtilityValue> {
        &self.values
    }

    pub fn manual_instructions(&self) -> &[ManualInstruction] {
        &self.instructions
    }

    /// Dispatcher invocations in execution order.
    pub fn journal(&self) -> &[ExecutionRecord] {
        &self.journal
    }

    pub fn abort_details(&self) -> Option<&AbortDetails> {
        self.abort.as_ref()
    }

    pub(crate) fn set_value(&mut self, name: &str, value: UtilityValue) {
        self.values.insert(name.to_string(), value);
    }

    pub(crate) fn save_result(&mut self, name: &str, result: PerformResult) {
        self.results.insert(name.to_string(), result);
    }

    pub(crate) fn add_instruction(&mut self, instruction: ManualInstruction) {
        self.instructions.push(instruction);
    }

    pub(crate) fn record_dispatch(&mut self, order: &str, utility: &str) {
        self.journal.push(ExecutionRecord {
            order: order.to_string(),
            utility: utility.to_string(),
        });
    }

    pub(crate) fn record_abort(&mut self, details: AbortDetails) {
        self.abort = Some(details);
    }
}
