//! Utility shapes and the per-utility precondition wrapper.
//!
//! A [`Utility`] is a core spec plus optional capability payloads: an
//! operation flag for file mutators, a child list for parents, a
//! [`LoopSpec`] for loops, a [`MultiCondition`] or [`FileFilter`] for
//! per-file condition evaluation, and a flag for manual-instruction
//! producers. Capabilities compose freely, except that an operation is never
//! also a parent.

use std::cell::Cell;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::context::{ManualInstruction, TransformationContext};
use crate::error::UtilityError;
use crate::result::{ExecutionResult, PerformResult, UtilityValue, ValueResult};

/// Execution body of a utility.
///
/// `target` is the utility's relative path resolved inside the working
/// directory; utilities that operate on the whole tree leave the relative
/// path at its default of `.` and receive the working directory itself.
pub trait Execute {
    fn execute(
        &self,
        target: &Path,
        context: &TransformationContext,
    ) -> Result<ExecutionResult, UtilityError>;
}

impl<F> Execute for F
where
    F: Fn(&Path, &TransformationContext) -> Result<ExecutionResult, UtilityError>,
{
    fn execute(
        &self,
        target: &Path,
        context: &TransformationContext,
    ) -> Result<ExecutionResult, UtilityError> {
        self(target, context)
    }
}

/// Declarative attributes shared by every utility shape.
#[derive(Debug, Clone)]
struct UtilitySpec {
    name: String,
    description: String,
    context_attribute: Option<String>,
    save_result: bool,
    abort_on_failure: bool,
    abort_message: Option<String>,
    dependencies: Vec<String>,
    execute_if: Option<String>,
    execute_unless: Option<String>,
    relative_path: PathBuf,
}

/// Whether a multi-condition requires every file or any file to satisfy the
/// per-file condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionMode {
    All,
    Any,
}

/// Builds a fresh per-file sub-condition for multi-conditions and filters.
pub type ConditionFactory = Box<dyn Fn(&Path) -> Utility>;

/// Loop capability: a body utility plus the iteration counter.
pub struct LoopSpec {
    body: Box<Utility>,
    iteration: Cell<usize>,
}

impl LoopSpec {
    fn new(body: Utility) -> Self {
        Self {
            body: Box::new(body),
            iteration: Cell::new(0),
        }
    }

    pub fn body(&self) -> &Utility {
        &self.body
    }

    /// Iterations started so far.
    pub fn iteration(&self) -> usize {
        self.iteration.get()
    }

    /// Advance and return the 1-based iteration number.
    pub(crate) fn next_iteration(&self) -> usize {
        let next = self.iteration.get() + 1;
        self.iteration.set(next);
        next
    }
}

/// Multi-condition capability: fold a sub-condition over a file set.
pub struct MultiCondition {
    mode: ConditionMode,
    condition: ConditionFactory,
}

impl MultiCondition {
    pub fn mode(&self) -> ConditionMode {
        self.mode
    }

    pub fn build_condition(&self, file: &Path) -> Utility {
        (self.condition)(file)
    }
}

/// Filter capability: retain the files whose sub-condition holds.
pub struct FileFilter {
    condition: ConditionFactory,
}

impl FileFilter {
    pub fn build_condition(&self, file: &Path) -> Utility {
        (self.condition)(file)
    }
}

/// A unit of work in a recipe: shared spec plus optional capabilities.
pub struct Utility {
    spec: UtilitySpec,
    exec: Box<dyn Execute>,
    operation: bool,
    children: Option<Vec<Utility>>,
    looping: Option<LoopSpec>,
    multi_condition: Option<MultiCondition>,
    filter: Option<FileFilter>,
    manual_instruction: bool,
}

impl Utility {
    /// A plain value-producing utility.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        exec: impl Execute + 'static,
    ) -> Self {
        Self {
            spec: UtilitySpec {
                name: name.into(),
                description: description.into(),
                context_attribute: None,
                save_result: true,
                abort_on_failure: false,
                abort_message: None,
                dependencies: Vec::new(),
                execute_if: None,
                execute_unless: None,
                relative_path: PathBuf::from("."),
            },
            exec: Box::new(exec),
            operation: false,
            children: None,
            looping: None,
            multi_condition: None,
            filter: None,
            manual_instruction: false,
        }
    }

    /// A file-mutating operation.
    pub fn operation(
        name: impl Into<String>,
        description: impl Into<String>,
        exec: impl Execute + 'static,
    ) -> Self {
        let mut utility = Self::new(name, description, exec);
        utility.operation = true;
        utility
    }

    /// A utility whose value is a manual follow-up for the user.
    pub fn manual(
        name: impl Into<String>,
        description: impl Into<String>,
        instruction: ManualInstruction,
    ) -> Self {
        let mut utility = Self::new(
            name,
            description,
            move |_target: &Path, _context: &TransformationContext| {
                Ok(ExecutionResult::Value(ValueResult::Value(
                    UtilityValue::Instruction(instruction.clone()),
                )))
            },
        );
        utility.manual_instruction = true;
        utility
    }

    /// Store the value under `name` instead of the utility's own name.
    pub fn with_context_attribute(mut self, name: impl Into<String>) -> Self {
        self.spec.context_attribute = Some(name.into());
        self
    }

    pub fn with_save_result(mut self, save: bool) -> Self {
        self.spec.save_result = save;
        self
    }

    /// Abort the whole template when this utility fails.
    pub fn with_abort_on_failure(mut self) -> Self {
        self.spec.abort_on_failure = true;
        self
    }

    /// Abort on failure, raising `message` instead of the generic one.
    pub fn with_abort_message(mut self, message: impl Into<String>) -> Self {
        self.spec.abort_on_failure = true;
        self.spec.abort_message = Some(message.into());
        self
    }

    /// Skip this utility unless `name` produced a non-failure result.
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.spec.dependencies.push(name.into());
        self
    }

    /// Skip this utility unless the context value under `condition` is `true`.
    pub fn with_execute_if(mut self, condition: impl Into<String>) -> Self {
        self.spec.execute_if = Some(condition.into());
        self
    }

    /// Skip this utility when the context value under `condition` is `true`.
    pub fn with_execute_unless(mut self, condition: impl Into<String>) -> Self {
        self.spec.execute_unless = Some(condition.into());
        self
    }

    /// Path this utility targets, relative to the working directory.
    pub fn with_relative_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.spec.relative_path = path.into();
        self
    }

    /// Make this utility a parent of an ordered child list.
    pub fn with_children(mut self, children: Vec<Utility>) -> Self {
        self.children = Some(children);
        self
    }

    /// Make this utility a loop whose condition is its own execution body.
    pub fn with_loop(mut self, body: Utility) -> Self {
        self.looping = Some(LoopSpec::new(body));
        self
    }

    /// Fold `condition` over this utility's file-set value.
    pub fn with_multi_condition(
        mut self,
        mode: ConditionMode,
        condition: impl Fn(&Path) -> Utility + 'static,
    ) -> Self {
        self.multi_condition = Some(MultiCondition {
            mode,
            condition: Box::new(condition),
        });
        self
    }

    /// Retain the files of this utility's file-set value for which
    /// `condition` holds.
    pub fn with_filter(mut self, condition: impl Fn(&Path) -> Utility + 'static) -> Self {
        self.filter = Some(FileFilter {
            condition: Box::new(condition),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn description(&self) -> &str {
        &self.spec.description
    }

    /// Context key the value is stored under; defaults to the name.
    pub fn context_attribute(&self) -> &str {
        self.spec.context_attribute.as_deref().unwrap_or(&self.spec.name)
    }

    pub fn save_result(&self) -> bool {
        self.spec.save_result
    }

    pub fn aborts_on_failure(&self) -> bool {
        self.spec.abort_on_failure
    }

    pub fn abort_message(&self) -> Option<&str> {
        self.spec.abort_message.as_deref()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.spec.dependencies
    }

    pub fn execute_if(&self) -> Option<&str> {
        self.spec.execute_if.as_deref()
    }

    pub fn execute_unless(&self) -> Option<&str> {
        self.spec.execute_unless.as_deref()
    }

    pub fn relative_path(&self) -> &Path {
        &self.spec.relative_path
    }

    pub fn is_operation(&self) -> bool {
        self.operation
    }

    /// Loops count as parents for execution numbering.
    pub fn is_parent(&self) -> bool {
        self.children.is_some() || self.looping.is_some()
    }

    pub fn children(&self) -> &[Utility] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn loop_spec(&self) -> Option<&LoopSpec> {
        self.looping.as_ref()
    }

    pub fn multi_condition(&self) -> Option<&MultiCondition> {
        self.multi_condition.as_ref()
    }

    pub fn file_filter(&self) -> Option<&FileFilter> {
        self.filter.as_ref()
    }

    pub fn is_manual_instruction(&self) -> bool {
        self.manual_instruction
    }

    /// The utility's relative path resolved against the working directory.
    pub fn absolute_path(&self, working_dir: &Path) -> PathBuf {
        if self.spec.relative_path == Path::new(".") {
            working_dir.to_path_buf()
        } else {
            working_dir.join(&self.spec.relative_path)
        }
    }

    /// Check dependencies and conditions, then run the execution body.
    ///
    /// Skips never invoke the body; a body error becomes
    /// [`PerformResult::Error`].
    pub fn perform(
        &self,
        working_dir: &Path,
        context: &TransformationContext,
    ) -> PerformResult {
        for dependency in &self.spec.dependencies {
            let failed = match context.result(dependency) {
                Some(result) => result.dependency_failure(),
                None => true,
            };
            if failed {
                return PerformResult::SkippedDependency {
                    details: format!("dependency {dependency} did not complete successfully"),
                };
            }
        }
        if let Some(condition) = self.spec.execute_if.as_deref() {
            if context.value(condition).and_then(UtilityValue::as_bool) != Some(true) {
                return PerformResult::SkippedCondition {
                    details: format!("condition {condition} does not hold"),
                };
            }
        }
        if let Some(condition) = self.spec.execute_unless.as_deref() {
            if context.value(condition).and_then(UtilityValue::as_bool) == Some(true) {
                return PerformResult::SkippedCondition {
                    details: format!("condition {condition} holds"),
                };
            }
        }
        match self.exec.execute(&self.absolute_path(working_dir), context) {
            Ok(result) => PerformResult::Executed(result),
            Err(error) => PerformResult::Error {
                details: format!("{} failed to execute", self.spec.name),
                error,
            },
        }
    }
}

impl fmt::Debug for Utility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utility")
            .field("name", &self.spec.name)
            .field("operation", &self.operation)
            .field("parent", &self.is_parent())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ExecutionResult, OperationResult};
    use pretty_assertions::assert_eq;

    fn value_utility(name: &str, value: UtilityValue) -> Utility {
        Utility::new(
            name,
            "test utility",
            move |_target: &Path, _context: &TransformationContext| {
                Ok(ExecutionResult::Value(ValueResult::Value(value.clone())))
            },
        )
    }

    #[test]
    fn perform_skips_on_missing_dependency() {
        let context = TransformationContext::new("t");
        let utility = value_utility("u", UtilityValue::Bool(true)).with_dependency("never-ran");
        let result = utility.perform(Path::new("/tmp"), &context);
        assert!(matches!(result, PerformResult::SkippedDependency { .. }));
    }

    #[test]
    fn perform_skips_on_failed_dependency() {
        let mut context = TransformationContext::new("t");
        context.save_result(
            "dep",
            PerformResult::Error {
                error: UtilityError::new("boom"),
                details: "dep failed to execute".into(),
            },
        );
        let utility = value_utility("u", UtilityValue::Bool(true)).with_dependency("dep");
        let result = utility.perform(Path::new("/tmp"), &context);
        assert!(matches!(result, PerformResult::SkippedDependency { .. }));
    }

    #[test]
    fn perform_skips_when_condition_does_not_hold() {
        let mut context = TransformationContext::new("t");
        context.set_value("is-maven", UtilityValue::Bool(false));
        let utility = value_utility("u", UtilityValue::Bool(true)).with_execute_if("is-maven");
        let result = utility.perform(Path::new("/tmp"), &context);
        assert!(matches!(result, PerformResult::SkippedCondition { .. }));
    }

    #[test]
    fn perform_skips_when_unless_condition_holds() {
        let mut context = TransformationContext::new("t");
        context.set_value("already-upgraded", UtilityValue::Bool(true));
        let utility =
            value_utility("u", UtilityValue::Bool(true)).with_execute_unless("already-upgraded");
        let result = utility.perform(Path::new("/tmp"), &context);
        assert!(matches!(result, PerformResult::SkippedCondition { .. }));
    }

    #[test]
    fn perform_converts_execute_errors() {
        let context = TransformationContext::new("t");
        let utility = Utility::operation(
            "broken",
            "always fails",
            |_target: &Path, _context: &TransformationContext| {
                Err(UtilityError::new("cannot open file"))
            },
        );
        let result = utility.perform(Path::new("/tmp"), &context);
        assert!(result.is_error());
        assert!(result.dependency_failure());
    }

    #[test]
    fn execute_receives_resolved_target() {
        let context = TransformationContext::new("t");
        let utility = Utility::new(
            "probe",
            "reports its target",
            |target: &Path, _context: &TransformationContext| {
                Ok(ExecutionResult::Value(ValueResult::Value(UtilityValue::Text(
                    target.display().to_string(),
                ))))
            },
        )
        .with_relative_path("pom.xml");
        let result = utility.perform(Path::new("/workspace/app"), &context);
        let PerformResult::Executed(ExecutionResult::Value(ValueResult::Value(UtilityValue::Text(
            target,
        )))) = result
        else {
            panic!("expected a text value");
        };
        assert_eq!(target, "/workspace/app/pom.xml");
    }

    #[test]
    fn context_attribute_defaults_to_name() {
        let utility = value_utility("u", UtilityValue::Bool(true));
        assert_eq!(utility.context_attribute(), "u");
        let renamed = value_utility("u", UtilityValue::Bool(true)).with_context_attribute("k");
        assert_eq!(renamed.context_attribute(), "k");
    }

    #[test]
    fn operation_result_passthrough() {
        let context = TransformationContext::new("t");
        let utility = Utility::operation(
            "touch",
            "creates a marker",
            |_target: &Path, _context: &TransformationContext| {
                Ok(ExecutionResult::Operation(OperationResult::success("created")))
            },
        );
        let result = utility.perform(Path::new("/tmp"), &context);
        assert!(matches!(
            result,
            PerformResult::Executed(ExecutionResult::Operation(_))
        ));
    }
}
