//! Sample Catalog
//!
//! The pools of personas, moods, session contexts and therapist statements
//! that the dataset runner samples from. A built-in catalog is embedded in
//! the binary; a JSON file with the same shape can replace it.

use anyhow::{Context, Result, bail};
use patient_sim_core::{ConversationContext, Persona};
use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub personas: Vec<Persona>,
    pub moods: Vec<String>,
    pub contexts: Vec<ConversationContext>,
    pub therapist_statements: Vec<String>,
}

/// One randomly drawn combination of catalog entries.
#[derive(Debug, Clone, Copy)]
pub struct Scenario<'a> {
    pub persona: &'a Persona,
    pub mood: &'a str,
    pub context: &'a ConversationContext,
    pub therapist_statement: &'a str,
}

impl Catalog {
    /// The catalog shipped with the generator.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG).context("Built-in catalog is invalid")
    }

    /// Loads and validates a JSON catalog from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid catalog {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Requires every pool to be non-empty and every entry to be well-formed.
    pub fn validate(&self) -> Result<()> {
        if self.personas.is_empty() {
            bail!("catalog has no personas");
        }
        if self.moods.is_empty() {
            bail!("catalog has no moods");
        }
        if self.contexts.is_empty() {
            bail!("catalog has no contexts");
        }
        if self.therapist_statements.is_empty() {
            bail!("catalog has no therapist statements");
        }
        if self.therapist_statements.iter().any(|s| s.trim().is_empty()) {
            bail!("catalog contains an empty therapist statement");
        }
        for persona in &self.personas {
            persona.validate()?;
        }
        for context in &self.contexts {
            context.validate()?;
        }
        Ok(())
    }

    /// Draws one entry from each pool, uniformly and independently.
    ///
    /// Returns `None` only for a catalog that skipped validation and has an empty pool.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Scenario<'_>> {
        Some(Scenario {
            persona: self.personas.choose(rng)?,
            mood: self.moods.choose(rng)?,
            context: self.contexts.choose(rng)?,
            therapist_statement: self.therapist_statements.choose(rng)?,
        })
    }
}
