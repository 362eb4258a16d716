//! Tutoring phase state machine.
//!
//! The service, not the model, decides which phase a turn is in. The client
//! echoes back the phase returned by the previous response together with the
//! kind of turn it is sending; [`next_phase`] validates the pair and yields
//! the phase whose instructions are sent upstream.

use super::ask::Mode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TutorPhase {
    /// First contact: greet, gauge the level, introduce the topic.
    Introducing,
    /// Explain a concept and close with one check question.
    Teaching,
    /// Questions are out; the next turn should be an answer.
    AwaitingAnswer,
    /// Grade the student's answer.
    Evaluating,
    /// The student disputes the grade.
    ReEvaluating,
    /// The student asked something else while an answer was pending.
    HandlingInterruption,
}

impl TutorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TutorPhase::Introducing => "introducing",
            TutorPhase::Teaching => "teaching",
            TutorPhase::AwaitingAnswer => "awaiting_answer",
            TutorPhase::Evaluating => "evaluating",
            TutorPhase::ReEvaluating => "re_evaluating",
            TutorPhase::HandlingInterruption => "handling_interruption",
        }
    }

    /// Whether the tutor left a question open at the end of this phase.
    pub fn expects_answer(&self) -> bool {
        matches!(
            self,
            TutorPhase::Teaching | TutorPhase::AwaitingAnswer | TutorPhase::HandlingInterruption
        )
    }
}

impl fmt::Display for TutorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the student is doing with this message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    #[default]
    Question,
    Answer,
    Dispute,
}

impl TurnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnKind::Question => "question",
            TurnKind::Answer => "answer",
            TurnKind::Dispute => "dispute",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot submit an answer: no question is awaiting an answer")]
    NoPendingQuestion { previous: Option<TutorPhase> },

    #[error("cannot dispute: no answer has been evaluated yet")]
    NothingToDispute { previous: Option<TutorPhase> },
}

/// Decide the phase of the current turn.
///
/// Quiz-mode questions always produce a fresh question set. Everything else
/// follows the chat loop: introduce, teach, evaluate an answer, re-evaluate
/// on dispute, and detour on interruptions while an answer is pending.
pub fn next_phase(
    previous: Option<TutorPhase>,
    turn: TurnKind,
    mode: Mode,
) -> Result<TutorPhase, TransitionError> {
    use TutorPhase::*;

    match (turn, previous) {
        (TurnKind::Question, _) if mode == Mode::Quiz => Ok(AwaitingAnswer),
        (TurnKind::Question, None) => Ok(Introducing),
        (TurnKind::Question, Some(AwaitingAnswer | HandlingInterruption)) => {
            Ok(HandlingInterruption)
        }
        (TurnKind::Question, Some(Introducing | Teaching | Evaluating | ReEvaluating)) => {
            Ok(Teaching)
        }

        (TurnKind::Answer, Some(phase)) if phase.expects_answer() => Ok(Evaluating),
        (TurnKind::Answer, previous) => Err(TransitionError::NoPendingQuestion { previous }),

        (TurnKind::Dispute, Some(Evaluating | ReEvaluating)) => Ok(ReEvaluating),
        (TurnKind::Dispute, previous) => Err(TransitionError::NothingToDispute { previous }),
    }
}
