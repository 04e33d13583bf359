//! # uplift - a transformation engine for application source trees
//!
//! `uplift` automates in-place mechanical transformations of a source-code
//! application directory: code migrations, framework upgrades, and
//! linting-style remediations. A transformation is a recipe, a tree of
//! small composable utilities, applied against a staged working copy of
//! the application. The engine copies the application, walks the recipe,
//! executes each utility against the copy, records results and manual
//! follow-ups in a per-template context, and reports success or aborts with
//! diagnostics.
//!
//! ## Architecture
//!
//! - [`result`]: the result algebra utilities and the engine speak.
//! - [`utility`]: utility shapes (operation, parent, loop, multi-condition,
//!   filter, manual instruction) modelled as a core payload plus optional
//!   capabilities.
//! - [`context`]: per-template state, chained across upgrade steps.
//! - [`recipe`]: templates and upgrade paths.
//! - [`engine`]: staging, the dispatch loop, and listener fan-out.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use uplift::{
//!     Application, Configuration, Recipe, Template, Transformation, TransformationEngine,
//! };
//!
//! let template = Template::new("upgrade-build-files").with_utility(/* ... */);
//! let mut transformation = Transformation::new(
//!     Application::new("/path/to/app"),
//!     Configuration::default(),
//!     Recipe::Template(template),
//! );
//! let result = TransformationEngine::new().perform(&mut transformation)?;
//! println!("transformed copy at {}", result.transformed_location().display());
//! ```
//!
//! The engine is strictly single-threaded and synchronous: one `perform`
//! call drives one transformation end-to-end on the invoking thread, and the
//! staged working directory is exclusively owned by that transformation for
//! its duration.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod listener;
pub mod recipe;
pub mod result;
pub mod transformation;
pub mod utility;

pub use config::Configuration;
pub use context::{AbortDetails, ExecutionRecord, ManualInstruction, TransformationContext};
pub use engine::TransformationEngine;
pub use error::{TransformationError, UtilityError};
pub use listener::TransformationListener;
pub use recipe::{Template, UpgradePath, UpgradeStep};
pub use result::{
    ExecutionResult, OperationResult, OperationStatus, PerformResult, UtilityValue, ValueResult,
};
pub use transformation::{Application, Recipe, Transformation, TransformationResult};
pub use utility::{ConditionMode, Execute, FileFilter, LoopSpec, MultiCondition, Utility};
