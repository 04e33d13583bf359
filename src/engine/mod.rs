//! The transformation engine: staging, recipe drivers, and listener fan-out.

mod dispatcher;
mod staging;
mod template;
mod upgrade;

use std::panic::{self, AssertUnwindSafe};

use tracing::{error, info};

use crate::context::TransformationContext;
use crate::error::TransformationError;
use crate::listener::TransformationListener;
use crate::transformation::{Recipe, Transformation, TransformationResult};

/// Drives transformations end-to-end on the calling thread.
///
/// Listeners are registered before the first [`perform`](Self::perform)
/// call; registration takes `&mut self`, so the set is immutable while a
/// transformation runs.
#[derive(Default)]
pub struct TransformationEngine {
    listeners: Vec<Box<dyn TransformationListener>>,
}

impl TransformationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_listener(&mut self, listener: impl TransformationListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Stage the application and drive the recipe against the copy.
    ///
    /// On success the result carries the working-directory location and the
    /// manual instructions aggregated across every context. On abort the
    /// staged folder is left on disk for inspection and the abort message is
    /// raised as [`TransformationError::Aborted`]. Staging failures surface
    /// before any listener is notified.
    pub fn perform(
        &self,
        transformation: &mut Transformation,
    ) -> Result<TransformationResult, TransformationError> {
        let working_dir = staging::stage(transformation)?;
        transformation.set_transformed_location(working_dir.clone());
        info!(
            application = %transformation.application().name(),
            working_dir = %working_dir.display(),
            "beginning transformation"
        );

        let mut contexts = Vec::new();
        let outcome = match transformation.recipe() {
            Recipe::Template(template) => {
                let (context, outcome) = template::run(template, &working_dir, None);
                contexts.push(context);
                outcome
            }
            Recipe::UpgradePath(path) => upgrade::run(path, &working_dir, &mut contexts),
        };

        let instructions: Vec<_> = contexts
            .iter()
            .flat_map(|context| context.manual_instructions().iter().cloned())
            .collect();

        match outcome {
            Ok(()) => {
                info!(working_dir = %working_dir.display(), "transformation completed");
                self.notify(transformation, &contexts, false);
                Ok(TransformationResult::new(working_dir, instructions, false))
            }
            Err(abort) => {
                error!(utility = %abort.utility, "transformation aborted: {}", abort.message);
                self.notify(transformation, &contexts, true);
                Err(TransformationError::Aborted {
                    message: abort.message,
                    utility: abort.utility,
                    source: abort.error,
                    result: TransformationResult::new(working_dir, instructions, true),
                })
            }
        }
    }

    /// Best-effort fan-out: a panicking listener is logged and skipped so
    /// the remaining listeners still fire.
    fn notify(
        &self,
        transformation: &Transformation,
        contexts: &[TransformationContext],
        aborted: bool,
    ) {
        for listener in &self.listeners {
            let call = panic::catch_unwind(AssertUnwindSafe(|| {
                if aborted {
                    listener.post_transformation_abort(transformation, contexts);
                } else {
                    listener.post_transformation(transformation, contexts);
                }
            }));
            if call.is_err() {
                error!("transformation listener panicked; continuing with remaining listeners");
            }
        }
    }
}
