//! Upgrade driver: walks an upgrade path, chaining contexts across steps.

use std::path::Path;

use tracing::info;

use super::dispatcher::AbortSignal;
use super::template;
use crate::context::TransformationContext;
use crate::recipe::UpgradePath;

/// Run every step of the path in order, threading each step's context into
/// the next. Every step runs unless a prior step aborted.
pub(crate) fn run(
    path: &UpgradePath,
    working_dir: &Path,
    contexts: &mut Vec<TransformationContext>,
) -> Result<(), AbortSignal> {
    for step in path.steps() {
        info!(
            from = step.source_version(),
            to = step.target_version(),
            "upgrading application"
        );
        let (context, outcome) = template::run(step.template(), working_dir, contexts.last());
        contexts.push(context);
        outcome?;
    }
    Ok(())
}
