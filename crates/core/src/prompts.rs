//! Prompt templates for the three oracle capabilities.

use std::collections::HashMap;

pub const EVALUATE_MOOD: &str = "evaluate_mood";
pub const GENERATE_REPLY: &str = "generate_reply";
pub const EVALUATE_REPLY: &str = "evaluate_reply";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Missing prompt template: '{0}'")]
    Missing(&'static str),
}

/// The validated set of templates an [`crate::llm_oracle::OpenAIOracle`] renders.
///
/// Templates use `{name}` placeholders: `{persona}`, `{mood}`, `{context}`,
/// `{therapist_statement}` and `{patient_reply}`.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub evaluate_mood: String,
    pub generate_reply: String,
    pub evaluate_reply: String,
}

impl PromptTemplates {
    /// Builds the set from a map keyed by template name (usually a file stem).
    ///
    /// Extra keys are ignored; each of the three capability keys is required.
    pub fn from_map(mut prompts: HashMap<String, String>) -> Result<Self, PromptError> {
        let mut take = |key: &'static str| prompts.remove(key).ok_or(PromptError::Missing(key));
        Ok(Self {
            evaluate_mood: take(EVALUATE_MOOD)?,
            generate_reply: take(GENERATE_REPLY)?,
            evaluate_reply: take(EVALUATE_REPLY)?,
        })
    }
}

/// Replaces every `{name}` placeholder in `template` with its value.
///
/// Substitution is a single left-to-right pass, so braces inside inserted
/// values are never expanded. Placeholders without a matching variable are
/// left untouched.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(var, _)| *var == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_map() -> HashMap<String, String> {
        HashMap::from([
            (EVALUATE_MOOD.to_string(), "mood {persona}".to_string()),
            (GENERATE_REPLY.to_string(), "reply {mood}".to_string()),
            (EVALUATE_REPLY.to_string(), "judge {patient_reply}".to_string()),
            ("system_prompt".to_string(), "unused".to_string()),
        ])
    }

    #[test]
    fn test_from_map_picks_the_three_templates() {
        let templates = PromptTemplates::from_map(full_map()).unwrap();
        assert_eq!(templates.evaluate_mood, "mood {persona}");
        assert_eq!(templates.generate_reply, "reply {mood}");
        assert_eq!(templates.evaluate_reply, "judge {patient_reply}");
    }

    #[test]
    fn test_from_map_reports_missing_template() {
        let mut prompts = full_map();
        prompts.remove(EVALUATE_REPLY);

        let err = PromptTemplates::from_map(prompts).unwrap_err();
        assert_eq!(err, PromptError::Missing("evaluate_reply"));
        assert_eq!(err.to_string(), "Missing prompt template: 'evaluate_reply'");
    }

    #[test]
    fn test_render_replaces_all_occurrences() {
        let rendered = render(
            "{mood} / {mood} / {therapist_statement} / {unknown}",
            &[("mood", "sad but hopeful"), ("therapist_statement", "Go on.")],
        );
        assert_eq!(
            rendered,
            "sad but hopeful / sad but hopeful / Go on. / {unknown}"
        );
    }

    #[test]
    fn test_render_does_not_expand_inserted_values() {
        let rendered = render(
            "P={persona} M={mood}",
            &[("persona", "likes {mood} braces"), ("mood", "sad")],
        );
        assert_eq!(rendered, "P=likes {mood} braces M=sad");
    }

    #[test]
    fn test_render_keeps_stray_braces() {
        let rendered = render("{ {mood} } {mood", &[("mood", "calm")]);
        assert_eq!(rendered, "{ calm } {mood");
    }
}
