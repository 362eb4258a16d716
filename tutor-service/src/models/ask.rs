//! Request and response bodies for `POST /ask`.

use super::phase::{TurnKind, TutorPhase};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A student's question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AskRequest {
    /// The question asked by the student, at most 4000 characters.
    #[validate(length(max = 4000))]
    pub user_query: String,

    /// `"quiz"` selects quiz mode; anything else is chat.
    #[serde(default)]
    pub mode: Option<String>,

    /// Prior conversation as free text, passed to the model verbatim.
    #[serde(default)]
    #[validate(length(max = 32000))]
    pub history: Option<String>,

    /// Phase returned by the previous response.
    #[serde(default)]
    pub phase: Option<TutorPhase>,

    /// What the student is doing this turn. Defaults to asking a question.
    #[serde(default)]
    pub turn: Option<TurnKind>,
}

impl AskRequest {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            mode: None,
            history: None,
            phase: None,
            turn: None,
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        self.history = Some(history.into());
        self
    }

    pub fn with_phase(mut self, phase: TutorPhase, turn: TurnKind) -> Self {
        self.phase = Some(phase);
        self.turn = Some(turn);
        self
    }

    pub fn resolved_mode(&self) -> Mode {
        Mode::from_request(self.mode.as_deref())
    }
}

/// The tutor's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    /// Upstream completion text, unmodified.
    pub answer: String,
    pub citation: String,
    pub progress_boost: u32,
    pub mode: Mode,
    /// Phase of this turn; send it back as `phase` on the next request.
    pub phase: TutorPhase,
}

/// Request-level behaviour switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Free-form Socratic tutoring.
    Chat,
    /// Multiple-choice question generation.
    Quiz,
}

impl Mode {
    /// Total over all inputs: only the exact value `"quiz"` selects quiz mode.
    pub fn from_request(mode: Option<&str>) -> Self {
        match mode {
            Some("quiz") => Mode::Quiz,
            _ => Mode::Chat,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Chat => "chat",
            Mode::Quiz => "quiz",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_selection_is_total() {
        assert_eq!(Mode::from_request(Some("quiz")), Mode::Quiz);
        assert_eq!(Mode::from_request(Some("chat")), Mode::Chat);
        assert_eq!(Mode::from_request(Some("Quiz")), Mode::Chat);
        assert_eq!(Mode::from_request(Some("")), Mode::Chat);
        assert_eq!(Mode::from_request(None), Mode::Chat);
    }

    #[test]
    fn deserializes_minimal_body() {
        let request: AskRequest =
            serde_json::from_str(r#"{"user_query": "What is the Preamble?"}"#).unwrap();

        assert_eq!(request.user_query, "What is the Preamble?");
        assert_eq!(request.resolved_mode(), Mode::Chat);
        assert!(request.history.is_none());
        assert!(request.phase.is_none());
        assert!(request.turn.is_none());
    }

    #[test]
    fn deserializes_full_body() {
        let request: AskRequest = serde_json::from_str(
            r#"{
                "user_query": "B",
                "mode": "quiz",
                "history": "Tutor: Which article abolishes untouchability?",
                "phase": "awaiting_answer",
                "turn": "answer"
            }"#,
        )
        .unwrap();

        assert_eq!(request.resolved_mode(), Mode::Quiz);
        assert_eq!(request.phase, Some(TutorPhase::AwaitingAnswer));
        assert_eq!(request.turn, Some(TurnKind::Answer));
    }

    #[test]
    fn rejects_oversized_question() {
        let request = AskRequest::new("x".repeat(4001));
        assert!(request.validate().is_err());

        let request = AskRequest::new("x".repeat(4000));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn rejects_oversized_history() {
        let request = AskRequest::new("What is Article 21?").with_history("h".repeat(32001));
        assert!(request.validate().is_err());
    }

    #[test]
    fn response_serializes_lowercase_mode() {
        let response = AskResponse {
            answer: "T".to_string(),
            citation: "C".to_string(),
            progress_boost: 5,
            mode: Mode::Quiz,
            phase: TutorPhase::AwaitingAnswer,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["mode"], "quiz");
        assert_eq!(json["phase"], "awaiting_answer");
        assert_eq!(json["progress_boost"], 5);
    }
}
