//! Main Entrypoint for the Patient Dialogue Generator
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment and arguments from the command line.
//! 2. Initializing logging.
//! 3. Building the LLM oracle and the reply workflow.
//! 4. Sampling catalog scenarios and appending each generated reply to the dataset.
//! 5. Stopping cleanly on Ctrl+C between oracle calls.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use clap::Parser;
use patient_sim_core::{PatientOracle, PatientReplyWorkflow, llm_oracle::OpenAIOracle};
use patient_sim_generator::{
    catalog::Catalog, config::Config, dataset::DatasetWriter, prompts::load_templates,
    runner::run_dataset,
};
use rand::{SeedableRng, rngs::StdRng};
use secrecy::ExposeSecret;
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};

/// Generate synthetic therapy-session patient replies.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Number of replies to generate.
    #[arg(short, long, default_value_t = 20)]
    count: usize,

    /// CSV file the replies are appended to.
    #[arg(short, long, default_value = "patient_replies.csv")]
    output: PathBuf,

    /// JSON catalog replacing the built-in personas, moods, contexts and statements.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Seed for reproducible scenario sampling.
    #[arg(long)]
    seed: Option<u64>,
}

/// Listens for the `Ctrl+C` signal to stop the run gracefully.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal. Stopping after the last written record...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing workflow...");

    // --- 3. Initialize the Oracle and Workflow ---
    let templates = load_templates(&config.prompts_path)?;
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.openai_api_key.expose_secret())
        .with_api_base(&config.api_base);
    let oracle: Arc<dyn PatientOracle> = Arc::new(OpenAIOracle::new(
        openai_config,
        config.chat_model.clone(),
        config.evaluator_model.clone(),
        templates,
    ));
    let workflow = PatientReplyWorkflow::new(oracle, config.workflow_config())
        .context("Invalid workflow configuration")?;

    // --- 4. Load the Catalog and Open the Dataset ---
    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::builtin()?,
    };
    let mut writer = DatasetWriter::open(&cli.output)?;
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    // --- 5. Run ---
    info!(
        generation_model = %config.chat_model,
        evaluation_model = %config.evaluator_model,
        threshold = workflow.config().realism_threshold,
        max_attempts = workflow.config().max_attempts,
        count = cli.count,
        output = %writer.path().display(),
        "Workflow configured. Generating replies..."
    );

    tokio::select! {
        result = run_dataset(&workflow, &catalog, &mut writer, cli.count, &mut rng) => {
            let summary = result?;
            info!(
                generated = summary.generated,
                accepted = summary.accepted,
                below_threshold = summary.below_threshold,
                "Dataset run finished."
            );
        }
        _ = shutdown_signal() => {}
    }

    Ok(())
}
