//! Patient Dialogue Generator Library Crate
//!
//! This library contains the driver around the core reply workflow: the
//! environment configuration, the sample catalog, the CSV dataset writer and
//! the sampling loop. The `generate` binary is a thin wrapper around it.

pub mod catalog;
pub mod config;
pub mod dataset;
pub mod prompts;
pub mod runner;
