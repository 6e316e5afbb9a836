//! Form-filling decision engine: descriptors, classification, option
//! matching and the step-by-step orchestrator.

pub mod classifier;
pub mod descriptor;
pub mod orchestrator;
pub mod selection;

pub use classifier::{FieldClassifier, ResolutionStrategy, ResolverPath};
pub use descriptor::{FieldAction, FieldDescriptor, FieldKind};
pub use orchestrator::{FillOutcome, FillState, FormFiller};
