//! Per-utility dispatch: order stamping, shape post-processing, and error
//! routing.
//!
//! Each dispatch performs the utility, interprets its result by shape, and
//! recurses into loop bodies and children. Order stamps are structural
//! labels for the journal and the logs; they are never parsed.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::context::{AbortDetails, TransformationContext};
use crate::error::UtilityError;
use crate::result::{
    abbreviate, ExecutionResult, OperationResult, OperationStatus, PerformResult, UtilityValue,
    ValueResult,
};
use crate::utility::{ConditionMode, FileFilter, MultiCondition, Utility};

/// Raised through the drivers when a failing utility demands an abort.
#[derive(Debug)]
pub(crate) struct AbortSignal {
    pub(crate) message: String,
    pub(crate) utility: String,
    pub(crate) error: Option<UtilityError>,
}

/// Perform one utility at `order`, interpret its result, and recurse into
/// its children.
pub(crate) fn dispatch(
    utility: &Utility,
    working_dir: &Path,
    context: &mut TransformationContext,
    order: &str,
) -> Result<(), AbortSignal> {
    context.record_dispatch(order, utility.name());
    let mut result = utility.perform(working_dir, context);
    let outcome = process(utility, working_dir, context, order, &mut result);
    // The raw result is stored irrespective of outcome, abort included.
    if utility.save_result() {
        context.save_result(utility.name(), result);
    }
    outcome
}

fn process(
    utility: &Utility,
    working_dir: &Path,
    context: &mut TransformationContext,
    order: &str,
    result: &mut PerformResult,
) -> Result<(), AbortSignal> {
    match result {
        PerformResult::SkippedCondition { details }
        | PerformResult::SkippedDependency { details } => {
            if utility.is_operation() {
                info!(order, utility = utility.name(), "skipped: {details}");
            } else {
                debug!(order, utility = utility.name(), "skipped: {details}");
            }
            Ok(())
        }
        PerformResult::Error { error, details } => {
            handle_failure(utility, context, Some(error.clone()), details)
        }
        PerformResult::Executed(ExecutionResult::Operation(operation)) => {
            process_operation_result(utility, context, order, operation)
        }
        PerformResult::Executed(ExecutionResult::Value(value_result)) => {
            if value_result.is_error() {
                return process_value_result(utility, context, order, value_result);
            }

            if let Some(multi) = utility.multi_condition() {
                *value_result =
                    fold_multi_condition(utility, multi, value_result, working_dir, context);
            } else if let Some(filter) = utility.file_filter() {
                *value_result = filter_files(utility, filter, value_result, working_dir, context);
            }

            process_value_result(utility, context, order, value_result)?;

            if let Some(loop_spec) = utility.loop_spec() {
                let continue_loop =
                    value_result.value().and_then(UtilityValue::as_bool) == Some(true);
                if continue_loop {
                    let iteration = loop_spec.next_iteration();
                    let iteration_order = format!("{order}.{iteration}");
                    info!(
                        order = %iteration_order,
                        utility = utility.name(),
                        "loop iteration {iteration}"
                    );
                    dispatch(
                        loop_spec.body(),
                        working_dir,
                        context,
                        &format!("{iteration_order}.1"),
                    )?;
                    // Re-evaluate the loop condition at the same order stamp.
                    dispatch(utility, working_dir, context, order)?;
                }
                Ok(())
            } else if utility.is_parent() {
                // Children only run when the parent's own perform produced a
                // value.
                if value_result.value().is_some() {
                    dispatch_children(utility, working_dir, context, order)?;
                }
                Ok(())
            } else if utility.is_manual_instruction() {
                append_instruction(utility, context, value_result);
                Ok(())
            } else {
                Ok(())
            }
        }
    }
}

fn dispatch_children(
    parent: &Utility,
    working_dir: &Path,
    context: &mut TransformationContext,
    order: &str,
) -> Result<(), AbortSignal> {
    let mut child_order = 1usize;
    for child in parent.children() {
        dispatch(child, working_dir, context, &format!("{order}.{child_order}"))?;
        if child.is_operation() || child.is_parent() {
            child_order += 1;
        }
    }
    Ok(())
}

fn process_operation_result(
    utility: &Utility,
    context: &mut TransformationContext,
    order: &str,
    operation: &OperationResult,
) -> Result<(), AbortSignal> {
    let details = operation.details().unwrap_or_default();
    match operation.status() {
        OperationStatus::Success => {
            info!(order, utility = utility.name(), "{}", abbreviate(details, 240));
            Ok(())
        }
        OperationStatus::NoOp => {
            debug!(order, utility = utility.name(), "no-op: {}", abbreviate(details, 240));
            Ok(())
        }
        OperationStatus::Warning => {
            warn!(order, utility = utility.name(), "{}", abbreviate(details, 240));
            for warning in operation.warnings() {
                warn!(order, utility = utility.name(), "{warning}");
            }
            Ok(())
        }
        OperationStatus::Error => {
            handle_failure(utility, context, operation.cause().cloned(), details)
        }
    }
}

fn process_value_result(
    utility: &Utility,
    context: &mut TransformationContext,
    order: &str,
    result: &ValueResult,
) -> Result<(), AbortSignal> {
    match result {
        ValueResult::Null => {
            warn!(order, utility = utility.name(), "utility produced no value");
            Ok(())
        }
        ValueResult::Value(value) => {
            if utility.save_result() {
                context.set_value(utility.context_attribute(), value.clone());
            }
            debug!(
                order,
                utility = utility.name(),
                value = %abbreviate(&value.to_string(), 120),
                "utility completed"
            );
            Ok(())
        }
        ValueResult::Warning { value, warnings } => {
            if utility.save_result() {
                context.set_value(utility.context_attribute(), value.clone());
            }
            warn!(
                order,
                utility = utility.name(),
                value = %abbreviate(&value.to_string(), 120),
                "utility completed with warnings"
            );
            for warning in warnings {
                warn!(order, utility = utility.name(), "{warning}");
            }
            Ok(())
        }
        ValueResult::Error(error) => handle_failure(
            utility,
            context,
            Some(error.clone()),
            "utility returned an error result",
        ),
    }
}

/// Route a failure per the utility's abort policy.
///
/// Aborting records the abort state on the context before unwinding; a
/// non-aborting failure is logged and execution continues with the next
/// sibling.
fn handle_failure(
    utility: &Utility,
    context: &mut TransformationContext,
    error: Option<UtilityError>,
    details: &str,
) -> Result<(), AbortSignal> {
    if utility.aborts_on_failure() {
        let message = utility
            .abort_message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} failed when performing transformation", utility.name()));
        error!(
            utility = utility.name(),
            description = utility.description(),
            "aborting: {}",
            abbreviate(details, 240)
        );
        context.record_abort(AbortDetails {
            message: message.clone(),
            utility: utility.name().to_string(),
            error: error.clone(),
        });
        Err(AbortSignal {
            message,
            utility: utility.name().to_string(),
            error,
        })
    } else {
        error!(
            utility = utility.name(),
            description = utility.description(),
            "{}",
            abbreviate(details, 240)
        );
        Ok(())
    }
}

/// Fold the per-file sub-condition over the utility's file-set value.
///
/// `All` folds with logical and, short-circuiting on the first false; `Any`
/// folds with logical or, short-circuiting on the first true.
fn fold_multi_condition(
    utility: &Utility,
    multi: &MultiCondition,
    current: &ValueResult,
    working_dir: &Path,
    context: &TransformationContext,
) -> ValueResult {
    let Some(files) = current.value().and_then(UtilityValue::as_files) else {
        return ValueResult::Error(UtilityError::new(format!(
            "{} did not produce a file set to evaluate",
            utility.name()
        )));
    };
    for file in files {
        let condition = multi.build_condition(file);
        match evaluate_condition(&condition, file, working_dir, context) {
            Ok(true) if multi.mode() == ConditionMode::Any => {
                debug!(utility = utility.name(), file = %file.display(), "short-circuiting: condition holds");
                return ValueResult::Value(UtilityValue::Bool(true));
            }
            Ok(false) if multi.mode() == ConditionMode::All => {
                debug!(utility = utility.name(), file = %file.display(), "short-circuiting: condition does not hold");
                return ValueResult::Value(UtilityValue::Bool(false));
            }
            Ok(_) => {}
            Err(error) => {
                return ValueResult::Error(UtilityError::with_source(
                    format!("{} failed evaluating {}", utility.name(), file.display()),
                    error,
                ));
            }
        }
    }
    ValueResult::Value(UtilityValue::Bool(multi.mode() == ConditionMode::All))
}

/// Retain the files of the utility's file-set value whose sub-condition
/// holds.
fn filter_files(
    utility: &Utility,
    filter: &FileFilter,
    current: &ValueResult,
    working_dir: &Path,
    context: &TransformationContext,
) -> ValueResult {
    let Some(files) = current.value().and_then(UtilityValue::as_files) else {
        return ValueResult::Error(UtilityError::new(format!(
            "{} did not produce a file set to filter",
            utility.name()
        )));
    };
    let mut retained = Vec::new();
    for file in files {
        let condition = filter.build_condition(file);
        match evaluate_condition(&condition, file, working_dir, context) {
            Ok(true) => retained.push(file.clone()),
            Ok(false) => {}
            Err(error) => {
                return ValueResult::Error(UtilityError::with_source(
                    format!("{} failed evaluating {}", utility.name(), file.display()),
                    error,
                ));
            }
        }
    }
    debug!(
        utility = utility.name(),
        retained = retained.len(),
        total = files.len(),
        "filtered file set"
    );
    ValueResult::Value(UtilityValue::Files(retained))
}

/// Perform a per-file sub-condition and read its boolean.
///
/// Anything that did not execute, or executed without a value, or whose
/// value is not a boolean, is an error for the enclosing utility.
fn evaluate_condition(
    condition: &Utility,
    file: &Path,
    working_dir: &Path,
    context: &TransformationContext,
) -> Result<bool, UtilityError> {
    match condition.perform(working_dir, context) {
        PerformResult::Executed(ExecutionResult::Value(
            ValueResult::Value(value) | ValueResult::Warning { value, .. },
        )) => value.as_bool().ok_or_else(|| {
            UtilityError::new(format!(
                "condition {} did not produce a boolean for {}",
                condition.name(),
                file.display()
            ))
        }),
        PerformResult::Error { error, .. } => Err(UtilityError::with_source(
            format!(
                "condition {} failed for {}",
                condition.name(),
                file.display()
            ),
            error,
        )),
        _ => Err(UtilityError::new(format!(
            "condition {} did not produce a usable result for {}",
            condition.name(),
            file.display()
        ))),
    }
}

fn append_instruction(
    utility: &Utility,
    context: &mut TransformationContext,
    result: &ValueResult,
) {
    match result.value() {
        Some(UtilityValue::Instruction(instruction)) => {
            debug!(
                utility = utility.name(),
                "recorded manual instruction: {}", instruction.summary
            );
            context.add_instruction(instruction.clone());
        }
        _ => {
            error!(
                utility = utility.name(),
                "manual instruction utility did not produce an instruction record"
            );
        }
    }
}
