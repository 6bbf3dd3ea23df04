//! Core of the synthetic patient-dialogue generator.
//!
//! The crate is organised leaf-first:
//!
//! - `persona`: the patient profile and session context value objects.
//! - `score`: recovery path for realism scores returned as free text.
//! - `oracle`: the `PatientOracle` trait over the three LLM capabilities.
//! - `prompts` / `llm_oracle`: templates and the OpenAI-compatible oracle.
//! - `workflow`: the bounded generate-until-acceptable loop.

pub mod llm_oracle;
pub mod oracle;
pub mod persona;
pub mod prompts;
pub mod score;
pub mod workflow;

pub use oracle::{OracleError, PatientOracle};
pub use persona::{ConversationContext, Persona};
pub use workflow::{GeneratedReply, PatientReplyWorkflow, WorkflowConfig, WorkflowError};
