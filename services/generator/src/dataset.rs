//! Append-only CSV output for generated replies.

use anyhow::{Context, Result};
use patient_sim_core::{GeneratedReply, Persona};
use serde::Serialize;
use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyRecord {
    pub patient_reply: String,
    pub realism_score: f64,
    pub explanation: String,
    pub personality_traits: String,
}

impl ReplyRecord {
    pub fn new(reply: &GeneratedReply, persona: &Persona) -> Self {
        Self {
            patient_reply: reply.patient_reply.clone(),
            realism_score: reply.realism_score,
            explanation: reply.explanation.clone(),
            personality_traits: persona.traits_joined(),
        }
    }
}

/// Appends quoted CSV records to a file, flushing after every record.
///
/// A header row is written only when the file is new or empty, so repeated
/// runs keep extending the same dataset.
pub struct DatasetWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl DatasetWriter {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open dataset file {}", path.display()))?;
        let is_empty = file
            .metadata()
            .with_context(|| format!("Failed to stat dataset file {}", path.display()))?
            .len()
            == 0;

        let writer = csv::WriterBuilder::new()
            .has_headers(is_empty)
            .from_writer(file);
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, record: &ReplyRecord) -> Result<()> {
        self.writer
            .serialize(record)
            .with_context(|| format!("Failed to write record to {}", self.path.display()))?;
        self.writer.flush()?;
        Ok(())
    }
}
