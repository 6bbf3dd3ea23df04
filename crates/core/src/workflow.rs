//! Patient Reply Workflow
//!
//! This module implements the generate-until-acceptable loop. A single call
//! evaluates the persona/mood pairing once (advisory only), then alternates
//! reply generation and reply evaluation until a reply clears the realism
//! threshold or the attempt cap is reached. In the latter case the last
//! attempt is returned as-is, with its sub-threshold score.

use crate::{
    oracle::{OracleError, PatientOracle, ReplyAssessment},
    persona::{ConversationContext, InvalidValue, Persona},
    score::{FALLBACK_REALISM_SCORE, parse_realism_score},
};
use std::{future::Future, sync::Arc, time::Duration};
use tracing::{info, instrument, warn};

pub const DEFAULT_REALISM_THRESHOLD: f64 = 0.7;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("invalid workflow configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid workflow input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl From<InvalidValue> for WorkflowError {
    fn from(err: InvalidValue) -> Self {
        WorkflowError::InvalidInput(err.to_string())
    }
}

/// Tuning for [`PatientReplyWorkflow`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    /// Minimum evaluation score for a reply to be accepted.
    pub realism_threshold: f64,
    /// Hard cap on generate/evaluate rounds. Must be at least 1.
    pub max_attempts: usize,
    /// Upper bound on each individual oracle call; `None` waits indefinitely.
    pub oracle_timeout: Option<Duration>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            realism_threshold: DEFAULT_REALISM_THRESHOLD,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            oracle_timeout: None,
        }
    }
}

impl WorkflowConfig {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.max_attempts < 1 {
            return Err(WorkflowError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.realism_threshold) {
            return Err(WorkflowError::InvalidConfig(format!(
                "realism_threshold must be within [0, 1], got {}",
                self.realism_threshold
            )));
        }
        if self.oracle_timeout == Some(Duration::ZERO) {
            return Err(WorkflowError::InvalidConfig(
                "oracle_timeout must be non-zero when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// The mood evaluator's parsed verdict. Only ever logged.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodEvaluation {
    pub realism_score: f64,
    pub explanation: String,
    pub suggested_adjustments: Option<String>,
    /// The raw score was unreadable and `realism_score` holds the fallback.
    pub score_recovered: bool,
}

/// One generate + evaluate round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyAttempt {
    /// 1-based.
    pub attempt: usize,
    pub patient_reply: String,
    pub realism_score: f64,
    pub explanation: String,
    pub improvement_suggestions: Option<String>,
    pub score_recovered: bool,
}

/// The reply handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedReply {
    pub patient_reply: String,
    pub realism_score: f64,
    pub explanation: String,
    /// Number of generate/evaluate rounds spent.
    pub attempts: usize,
    /// Whether `realism_score` cleared the threshold.
    pub accepted: bool,
    /// The evaluator gave no readable score and `realism_score` holds the fallback.
    pub score_recovered: bool,
}

impl GeneratedReply {
    fn from_attempt(attempt: ReplyAttempt, accepted: bool) -> Self {
        Self {
            patient_reply: attempt.patient_reply,
            realism_score: attempt.realism_score,
            explanation: attempt.explanation,
            attempts: attempt.attempt,
            accepted,
            score_recovered: attempt.score_recovered,
        }
    }
}

/// Couples the mood evaluator, reply generator and reply evaluator into one
/// bounded generate-until-acceptable call.
pub struct PatientReplyWorkflow {
    oracle: Arc<dyn PatientOracle>,
    config: WorkflowConfig,
}

impl PatientReplyWorkflow {
    /// Creates a workflow over the given oracle backend.
    ///
    /// Rejects configurations with no attempts, a threshold outside [0, 1]
    /// or a zero timeout.
    pub fn new(
        oracle: Arc<dyn PatientOracle>,
        config: WorkflowConfig,
    ) -> Result<Self, WorkflowError> {
        config.validate()?;
        Ok(Self { oracle, config })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Produces a patient reply to `therapist_statement`.
    ///
    /// Returns the first attempt whose score reaches the threshold, otherwise
    /// the last attempt. Only an unreachable backend, a timeout and invalid
    /// inputs are errors. Any other oracle anomaly is logged: at the mood step
    /// it is ignored, inside the loop it makes that attempt score 0.0.
    #[instrument(name = "patient_reply", skip_all, fields(persona = %persona.name, mood = %mood))]
    pub async fn generate_patient_reply(
        &self,
        persona: &Persona,
        mood: &str,
        context: &ConversationContext,
        therapist_statement: &str,
    ) -> Result<GeneratedReply, WorkflowError> {
        persona.validate()?;
        context.validate()?;
        if therapist_statement.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "therapist statement must not be empty".to_string(),
            ));
        }

        let persona_text = persona.to_string();
        let context_text = context.to_string();

        let mood_eval = self.evaluate_mood(&persona_text, mood, &context_text).await?;
        if mood_eval.realism_score < self.config.realism_threshold {
            warn!(
                score = mood_eval.realism_score,
                score_recovered = mood_eval.score_recovered,
                explanation = %mood_eval.explanation,
                suggested_adjustments = mood_eval.suggested_adjustments.as_deref().unwrap_or("-"),
                "Persona-mood combination may not be realistic"
            );
        }

        let mut last_attempt = None;
        for attempt in 1..=self.config.max_attempts {
            let candidate = self
                .attempt_reply(
                    attempt,
                    &persona_text,
                    mood,
                    &context_text,
                    therapist_statement,
                )
                .await?;

            if candidate.realism_score >= self.config.realism_threshold {
                info!(
                    attempt,
                    score = candidate.realism_score,
                    "Reply accepted"
                );
                return Ok(GeneratedReply::from_attempt(candidate, true));
            }

            warn!(
                attempt,
                score = candidate.realism_score,
                explanation = %candidate.explanation,
                improvement_suggestions = candidate.improvement_suggestions.as_deref().unwrap_or("-"),
                "Reply not realistic enough"
            );
            last_attempt = Some(candidate);
        }

        let last = last_attempt.ok_or_else(|| {
            WorkflowError::InvalidConfig("max_attempts must be at least 1".to_string())
        })?;
        warn!(
            attempts = last.attempt,
            score = last.realism_score,
            "Attempts exhausted, keeping the last reply"
        );
        Ok(GeneratedReply::from_attempt(last, false))
    }

    async fn evaluate_mood(
        &self,
        persona_text: &str,
        mood: &str,
        context_text: &str,
    ) -> Result<MoodEvaluation, OracleError> {
        let assessment = match self
            .bounded(self.oracle.evaluate_mood(persona_text, mood, context_text))
            .await
        {
            Ok(assessment) => assessment,
            Err(err) if err.is_unreachable() => return Err(err),
            Err(err) => {
                warn!(error = %err, "Mood evaluation failed, continuing without it");
                return Ok(MoodEvaluation {
                    realism_score: FALLBACK_REALISM_SCORE,
                    explanation: err.to_string(),
                    suggested_adjustments: None,
                    score_recovered: true,
                });
            }
        };

        let score = parse_realism_score(&assessment.realism_score);
        if score.recovered {
            warn!(raw = %assessment.realism_score, "Invalid mood realism score, using fallback");
        }
        Ok(MoodEvaluation {
            realism_score: score.value,
            explanation: assessment.explanation,
            suggested_adjustments: assessment.suggested_adjustments,
            score_recovered: score.recovered,
        })
    }

    async fn attempt_reply(
        &self,
        attempt: usize,
        persona_text: &str,
        mood: &str,
        context_text: &str,
        therapist_statement: &str,
    ) -> Result<ReplyAttempt, OracleError> {
        let patient_reply = match self
            .bounded(self.oracle.generate_reply(
                persona_text,
                mood,
                context_text,
                therapist_statement,
            ))
            .await
        {
            Ok(reply) => reply,
            Err(err) if err.is_unreachable() => return Err(err),
            Err(err) => {
                warn!(attempt, error = %err, "Reply generation failed, scoring the attempt as fallback");
                return Ok(ReplyAttempt {
                    attempt,
                    patient_reply: String::new(),
                    realism_score: FALLBACK_REALISM_SCORE,
                    explanation: err.to_string(),
                    improvement_suggestions: None,
                    score_recovered: true,
                });
            }
        };

        let assessment = match self
            .bounded(self.oracle.evaluate_reply(
                persona_text,
                mood,
                context_text,
                therapist_statement,
                &patient_reply,
            ))
            .await
        {
            Ok(assessment) => assessment,
            Err(err) if err.is_unreachable() => return Err(err),
            Err(err) => {
                warn!(attempt, error = %err, "Reply evaluation failed");
                ReplyAssessment {
                    realism_score: String::new(),
                    explanation: "evaluator returned no content".to_string(),
                    improvement_suggestions: None,
                }
            }
        };

        let score = parse_realism_score(&assessment.realism_score);
        if score.recovered {
            warn!(attempt, raw = %assessment.realism_score, "Invalid reply realism score, using fallback");
        }
        Ok(ReplyAttempt {
            attempt,
            patient_reply,
            realism_score: score.value,
            explanation: assessment.explanation,
            improvement_suggestions: assessment.improvement_suggestions,
            score_recovered: score.recovered,
        })
    }

    /// Applies the configured per-call timeout to an oracle future.
    async fn bounded<T, F>(&self, call: F) -> Result<T, OracleError>
    where
        F: Future<Output = Result<T, OracleError>>,
    {
        match self.config.oracle_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| OracleError::Timeout(limit))?,
            None => call.await,
        }
    }
}
