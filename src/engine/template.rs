//! Template driver: allocates the context and walks the utility list.

use std::path::Path;

use tracing::info;

use super::dispatcher::{self, AbortSignal};
use crate::context::TransformationContext;
use crate::recipe::Template;

/// Run every top-level utility of `template` against the working directory.
///
/// The context is returned even when the template aborts, so the engine can
/// hand it to abort listeners. Operations and parents advance the execution
/// counter; plain utilities run under the current number.
pub(crate) fn run(
    template: &Template,
    working_dir: &Path,
    predecessor: Option<&TransformationContext>,
) -> (TransformationContext, Result<(), AbortSignal>) {
    let mut context = match predecessor {
        Some(previous) => TransformationContext::chained(template.name(), previous),
        None => TransformationContext::new(template.name()),
    };
    info!(
        template = template.name(),
        utilities = template.utilities().len(),
        "applying template"
    );

    let mut order = 1usize;
    for utility in template.utilities() {
        if let Err(abort) =
            dispatcher::dispatch(utility, working_dir, &mut context, &order.to_string())
        {
            return (context, Err(abort));
        }
        if utility.is_operation() || utility.is_parent() {
            order += 1;
        }
    }
    (context, Ok(()))
}
