//! Command-line arguments for the formcheck CLI, declared with clap's
//! derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "formcheck",
    version,
    about = "Accessible form validation harness: run a form definition against a set of field values."
)]
pub struct FormcheckArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate field values against a form definition and print the
    /// resulting error summary.
    Check {
        /// Path to the form definition (JSON or YAML).
        #[arg(required = true)]
        form: PathBuf,
        /// Path to the field values file (JSON or YAML map of id to value).
        #[arg(long)]
        values: Option<PathBuf>,
        /// Override the form's declared language (en or fr).
        #[arg(long)]
        lang: Option<String>,
        /// Emit the report as JSON instead of colored text.
        #[arg(long)]
        json: bool,
    },
    /// List the fields a form definition declares, with their types and
    /// required flags.
    Fields {
        /// Path to the form definition (JSON or YAML).
        #[arg(required = true)]
        form: PathBuf,
    },
}
