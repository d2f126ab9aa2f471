//! # Game Logic Collaborator
//!
//! Everything the navigation core treats as "downstream": the career model,
//! name suggestions, and save-file persistence. The core only ever sees this
//! module through the `ActionExecutor` boundary — named actions in, an
//! `ActionOutcome` with signal flags out.
//!
//! The simulation here is deliberately shallow. It exists to give every
//! navigation path a real destination, not to be an interesting game.

pub mod actions;
pub mod names;
pub mod save;

pub use actions::GameActions;
