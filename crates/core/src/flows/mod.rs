pub mod engine;
pub mod replies;
pub mod states;

pub use engine::{transition, DialogEngine};
pub use states::{DialogAction, DialogState, TransitionOutcome};
