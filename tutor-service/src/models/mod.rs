//! Domain models for the tutor service.

pub mod ask;
pub mod phase;

pub use ask::{AskRequest, AskResponse, Mode};
pub use phase::{next_phase, TransitionError, TurnKind, TutorPhase};
