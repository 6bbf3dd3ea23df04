use crate::{
    oracle::{MoodAssessment, OracleError, PatientOracle, ReplyAssessment},
    prompts::{PromptTemplates, render},
};
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

const GENERATOR_SYSTEM_PROMPT: &str =
    "You write realistic patient dialogue for synthetic therapy-session transcripts.";
const EVALUATOR_SYSTEM_PROMPT: &str =
    "You are a clinical supervisor who rates the realism of simulated therapy patients.";

const REALISM_SCORE: &str = "Realism Score";
const EXPLANATION: &str = "Explanation";
const SUGGESTED_ADJUSTMENTS: &str = "Suggested Adjustments";
const IMPROVEMENT_SUGGESTIONS: &str = "Improvement Suggestions";

impl From<OpenAIError> for OracleError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::InvalidArgument(message) => OracleError::InvalidRequest(message),
            other => OracleError::Unavailable(other.to_string()),
        }
    }
}

/// An implementation of `PatientOracle` for any OpenAI-compatible API.
///
/// Generation and the two evaluations may use different models.
pub struct OpenAIOracle {
    client: Client<OpenAIConfig>,
    generation_model: String,
    evaluation_model: String,
    prompts: PromptTemplates,
}

impl OpenAIOracle {
    /// Creates a new oracle for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `generation_model` - Model used to write patient replies (e.g., "gpt-4").
    /// * `evaluation_model` - Model used for both realism evaluations.
    /// * `prompts` - The three capability templates.
    pub fn new(
        config: OpenAIConfig,
        generation_model: String,
        evaluation_model: String,
        prompts: PromptTemplates,
    ) -> Self {
        Self {
            client: Client::with_config(config),
            generation_model,
            evaluation_model,
            prompts,
        }
    }

    /// Makes a single, non-streaming completion call and returns its trimmed text.
    ///
    /// A response without any content comes back as an empty string.
    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        prompt: String,
    ) -> Result<String, OracleError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response: CreateChatCompletionResponse = self.client.chat().create(request).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let content = content.trim();
        debug!(model, chars = content.len(), "Oracle completion received");
        Ok(content.to_string())
    }
}

#[async_trait]
impl PatientOracle for OpenAIOracle {
    async fn evaluate_mood(
        &self,
        persona: &str,
        mood: &str,
        context: &str,
    ) -> Result<MoodAssessment, OracleError> {
        let prompt = render(
            &self.prompts.evaluate_mood,
            &[("persona", persona), ("mood", mood), ("context", context)],
        );
        let text = self
            .complete(&self.evaluation_model, EVALUATOR_SYSTEM_PROMPT, prompt)
            .await?;
        Ok(mood_assessment_from_text(&text))
    }

    async fn generate_reply(
        &self,
        persona: &str,
        mood: &str,
        context: &str,
        therapist_statement: &str,
    ) -> Result<String, OracleError> {
        let prompt = render(
            &self.prompts.generate_reply,
            &[
                ("persona", persona),
                ("mood", mood),
                ("context", context),
                ("therapist_statement", therapist_statement),
            ],
        );
        let reply = self
            .complete(&self.generation_model, GENERATOR_SYSTEM_PROMPT, prompt)
            .await?;
        if reply.is_empty() {
            return Err(OracleError::EmptyResponse);
        }
        Ok(reply)
    }

    async fn evaluate_reply(
        &self,
        persona: &str,
        mood: &str,
        context: &str,
        therapist_statement: &str,
        patient_reply: &str,
    ) -> Result<ReplyAssessment, OracleError> {
        let prompt = render(
            &self.prompts.evaluate_reply,
            &[
                ("persona", persona),
                ("mood", mood),
                ("context", context),
                ("therapist_statement", therapist_statement),
                ("patient_reply", patient_reply),
            ],
        );
        let text = self
            .complete(&self.evaluation_model, EVALUATOR_SYSTEM_PROMPT, prompt)
            .await?;
        Ok(reply_assessment_from_text(&text))
    }
}

fn mood_assessment_from_text(text: &str) -> MoodAssessment {
    let mut fields =
        parse_labelled_fields(text, &[REALISM_SCORE, EXPLANATION, SUGGESTED_ADJUSTMENTS]);
    MoodAssessment {
        realism_score: fields.remove(REALISM_SCORE).unwrap_or_default(),
        explanation: explanation_or_whole_text(fields.remove(EXPLANATION), text),
        suggested_adjustments: optional_field(fields.remove(SUGGESTED_ADJUSTMENTS)),
    }
}

fn reply_assessment_from_text(text: &str) -> ReplyAssessment {
    let mut fields =
        parse_labelled_fields(text, &[REALISM_SCORE, EXPLANATION, IMPROVEMENT_SUGGESTIONS]);
    ReplyAssessment {
        realism_score: fields.remove(REALISM_SCORE).unwrap_or_default(),
        explanation: explanation_or_whole_text(fields.remove(EXPLANATION), text),
        improvement_suggestions: optional_field(fields.remove(IMPROVEMENT_SUGGESTIONS)),
    }
}

fn explanation_or_whole_text(explanation: Option<String>, text: &str) -> String {
    explanation
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| text.to_string())
}

fn optional_field(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let v = v.trim_matches(|c: char| c == '.' || c.is_whitespace());
        !(v.is_empty() || v.eq_ignore_ascii_case("none") || v.eq_ignore_ascii_case("n/a"))
    })
}

/// Splits a completion of the form `Label: value` into its labelled fields.
///
/// Labels match case-insensitively and may be wrapped in markdown bullets,
/// headings or bold markers. Lines that start no new label continue the
/// previous field. Text before the first label is ignored.
fn parse_labelled_fields(
    text: &str,
    labels: &[&'static str],
) -> HashMap<&'static str, String> {
    let mut fields: HashMap<&'static str, String> = HashMap::new();
    let mut current: Option<&'static str> = None;

    for line in text.lines() {
        if let Some((label, value)) = match_label(line, labels) {
            fields.insert(label, value.to_string());
            current = Some(label);
        } else if let Some(label) = current {
            if let Some(existing) = fields.get_mut(label) {
                existing.push('\n');
                existing.push_str(line.trim());
            }
        }
    }

    for value in fields.values_mut() {
        *value = value.trim().to_string();
    }
    fields
}

fn match_label<'a>(line: &'a str, labels: &[&'static str]) -> Option<(&'static str, &'a str)> {
    let stripped = line.trim().trim_start_matches(['-', '*', '#', ' ']);
    labels.iter().find_map(|label| {
        let head = stripped.get(..label.len())?;
        if !head.eq_ignore_ascii_case(label) {
            return None;
        }
        let rest = stripped[label.len()..].trim_start_matches('*');
        let value = rest.strip_prefix(':')?;
        Some((*label, value.trim().trim_matches('*').trim()))
    })
}
