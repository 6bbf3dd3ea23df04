//! Drives the workflow over randomly sampled catalog scenarios.

use crate::{
    catalog::Catalog,
    dataset::{DatasetWriter, ReplyRecord},
};
use anyhow::{Context, Result};
use patient_sim_core::PatientReplyWorkflow;
use rand::Rng;
use tracing::{Instrument, info, info_span};

/// Totals for one dataset run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub generated: usize,
    pub accepted: usize,
    pub below_threshold: usize,
}

/// Generates `count` replies and appends each one to `writer` as soon as it is produced.
///
/// An oracle failure stops the run; records written before it are kept.
pub async fn run_dataset<R: Rng + ?Sized>(
    workflow: &PatientReplyWorkflow,
    catalog: &Catalog,
    writer: &mut DatasetWriter,
    count: usize,
    rng: &mut R,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for index in 1..=count {
        let scenario = catalog
            .sample(rng)
            .context("Catalog has an empty pool")?;
        let span = info_span!("datapoint", index, of = count);

        let reply = async {
            info!(
                persona = %scenario.persona.name,
                mood = %scenario.mood,
                session = scenario.context.session_number,
                "Generating datapoint"
            );
            workflow
                .generate_patient_reply(
                    scenario.persona,
                    scenario.mood,
                    scenario.context,
                    scenario.therapist_statement,
                )
                .await
        }
        .instrument(span)
        .await
        .with_context(|| format!("Datapoint {} of {} failed", index, count))?;

        writer.append(&ReplyRecord::new(&reply, scenario.persona))?;

        summary.generated += 1;
        if reply.accepted {
            summary.accepted += 1;
        } else {
            summary.below_threshold += 1;
        }
    }

    Ok(summary)
}
