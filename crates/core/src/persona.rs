//! Patient persona and session context value objects.
//!
//! Both types are plain data supplied by the caller. Their `Display`
//! implementations produce the field-labelled text blocks that every oracle
//! prompt embeds, so the rendering must stay stable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Returned when a persona or context breaks one of its invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {entity} '{name}': {reason}")]
pub struct InvalidValue {
    pub entity: &'static str,
    pub name: String,
    pub reason: String,
}

/// A fixed patient profile: identity, background, personality and clinical history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub age: u32,
    pub occupation: String,
    pub background: String,
    /// Ordered, never empty.
    pub personality_traits: Vec<String>,
    pub mental_health_history: String,
}

impl Persona {
    /// Checks that the age is positive and at least one trait is present.
    pub fn validate(&self) -> Result<(), InvalidValue> {
        let invalid = |reason: &str| InvalidValue {
            entity: "persona",
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.age == 0 {
            return Err(invalid("age must be positive"));
        }
        if self.personality_traits.is_empty() {
            return Err(invalid("at least one personality trait is required"));
        }
        Ok(())
    }

    /// The personality traits joined the way they appear in prompts and records.
    pub fn traits_joined(&self) -> String {
        self.personality_traits.join(", ")
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Age: {}", self.age)?;
        writeln!(f, "Occupation: {}", self.occupation)?;
        writeln!(f, "Background: {}", self.background)?;
        writeln!(f, "Personality Traits: {}", self.traits_joined())?;
        write!(f, "Mental Health History: {}", self.mental_health_history)
    }
}

/// Session metadata framing a single therapist/patient exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub session_number: u32,
    pub therapy_approach: String,
    pub current_topic: String,
    pub previous_patient_statement: String,
}

impl ConversationContext {
    pub fn validate(&self) -> Result<(), InvalidValue> {
        if self.session_number == 0 {
            return Err(InvalidValue {
                entity: "context",
                name: self.current_topic.clone(),
                reason: "session number must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ConversationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session Number: {}", self.session_number)?;
        writeln!(f, "Therapy Approach: {}", self.therapy_approach)?;
        writeln!(f, "Current Topic: {}", self.current_topic)?;
        write!(
            f,
            "Previous Patient Statement: {}",
            self.previous_patient_statement
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn alex() -> Persona {
        Persona {
            name: "Alex".to_string(),
            age: 28,
            occupation: "Software Developer".to_string(),
            background: "Recently divorced, struggling with work-life balance".to_string(),
            personality_traits: vec![
                "introverted".to_string(),
                "analytical".to_string(),
                "perfectionist".to_string(),
            ],
            mental_health_history: "History of mild depression, first time in therapy"
                .to_string(),
        }
    }

    pub(crate) fn cbt_session() -> ConversationContext {
        ConversationContext {
            session_number: 3,
            therapy_approach: "Cognitive Behavioral Therapy".to_string(),
            current_topic: "Work-related stress".to_string(),
            previous_patient_statement: "I feel overwhelmed by my project deadlines.".to_string(),
        }
    }

    #[test]
    fn test_persona_rendering_is_field_labelled() {
        let rendered = alex().to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Name: Alex",
                "Age: 28",
                "Occupation: Software Developer",
                "Background: Recently divorced, struggling with work-life balance",
                "Personality Traits: introverted, analytical, perfectionist",
                "Mental Health History: History of mild depression, first time in therapy",
            ]
        );
    }

    #[test]
    fn test_context_rendering_is_field_labelled() {
        let rendered = cbt_session().to_string();

        assert!(rendered.starts_with("Session Number: 3\n"));
        assert!(rendered.contains("Therapy Approach: Cognitive Behavioral Therapy\n"));
        assert!(rendered.contains("Current Topic: Work-related stress\n"));
        assert!(rendered.ends_with(
            "Previous Patient Statement: I feel overwhelmed by my project deadlines."
        ));
    }

    #[test]
    fn test_persona_validation() {
        assert!(alex().validate().is_ok());

        let mut ageless = alex();
        ageless.age = 0;
        let err = ageless.validate().unwrap_err();
        assert_eq!(err.entity, "persona");
        assert!(err.to_string().contains("age must be positive"));

        let mut traitless = alex();
        traitless.personality_traits.clear();
        assert!(traitless.validate().is_err());
    }

    #[test]
    fn test_context_validation() {
        assert!(cbt_session().validate().is_ok());

        let mut zeroth = cbt_session();
        zeroth.session_number = 0;
        assert_eq!(
            zeroth.validate().unwrap_err().to_string(),
            "invalid context 'Work-related stress': session number must be positive"
        );
    }

    #[test]
    fn test_persona_deserialization() {
        let json = r#"{
            "name": "Sarah",
            "age": 35,
            "occupation": "Elementary School Teacher",
            "background": "Single parent of two, dealing with burnout",
            "personality_traits": ["empathetic", "organized", "anxious"],
            "mental_health_history": "Diagnosed with generalized anxiety disorder"
        }"#;
        let persona: Persona = serde_json::from_str(json).unwrap();
        assert_eq!(persona.name, "Sarah");
        assert_eq!(persona.traits_joined(), "empathetic, organized, anxious");
    }
}
