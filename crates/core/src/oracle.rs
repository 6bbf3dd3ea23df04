//! The LLM-backed capabilities the reply workflow depends on.
//!
//! Each capability takes rendered prompt inputs and returns structured text.
//! Scores stay as raw text here; interpreting them is the caller's job (see
//! [`crate::score::parse_realism_score`]).

use async_trait::async_trait;
use std::time::Duration;

/// Errors raised when an oracle could not produce any answer at all.
///
/// An answer that merely contains an unreadable score is *not* an error.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle backend unavailable: {0}")]
    Unavailable(String),
    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not build oracle request: {0}")]
    InvalidRequest(String),
    #[error("oracle returned no content")]
    EmptyResponse,
}

impl OracleError {
    /// The backend could not be reached or did not answer in time.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, OracleError::Unavailable(_) | OracleError::Timeout(_))
    }
}

/// The mood evaluator's verdict on a persona/mood/context combination.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoodAssessment {
    /// Expected to hold a number between 0.0 and 1.0.
    pub realism_score: String,
    pub explanation: String,
    pub suggested_adjustments: Option<String>,
}

/// The reply evaluator's verdict on a generated patient reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplyAssessment {
    /// Expected to hold a number between 0.0 and 1.0.
    pub realism_score: String,
    pub explanation: String,
    pub improvement_suggestions: Option<String>,
}

/// The three prompt capabilities used to produce and vet a patient reply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatientOracle: Send + Sync {
    /// Judges whether `mood` is a realistic state for this persona in this session.
    async fn evaluate_mood(
        &self,
        persona: &str,
        mood: &str,
        context: &str,
    ) -> Result<MoodAssessment, OracleError>;

    /// Produces a patient reply, conventionally prefixed with `Patient:` and
    /// carrying non-verbal cues in parentheses.
    async fn generate_reply(
        &self,
        persona: &str,
        mood: &str,
        context: &str,
        therapist_statement: &str,
    ) -> Result<String, OracleError>;

    /// Scores how realistic `patient_reply` is as an answer to `therapist_statement`.
    async fn evaluate_reply(
        &self,
        persona: &str,
        mood: &str,
        context: &str,
        therapist_statement: &str,
        patient_reply: &str,
    ) -> Result<ReplyAssessment, OracleError>;
}
