//! Version publishing workflow.
//!
//! A request to move a version into a new state runs through:
//!
//! 1. [`merge::combine`] folds the caller's partial update into the stored version
//! 2. [`validate::validate_version`] checks the candidate has what its state needs
//! 3. [`TransitionTable::check`] decides whether the move is legal for the type
//! 4. a [`handlers::StateHandler`] persists the version and runs the cascade
//!
//! [`StateMachine`] drives the steps under a per-resource lock.

pub mod handlers;
pub mod machine;
pub mod merge;
pub mod persist;
pub mod transitions;
pub mod validate;

pub use handlers::{HandlerRegistry, StateHandler, TransitionContext};
pub use machine::{AmendOptions, StateMachine};
pub use merge::combine;
pub use persist::{persist_version, WritePath};
pub use transitions::{Transition, TransitionTable};
pub use validate::{validate_dataset_type, validate_version};
