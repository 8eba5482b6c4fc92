//! `apisurface`: synthesizes the API surface of a declaration model.
//!
//! Reads a model document (JSON), synthesizes one resource method
//! descriptor per listed handler, assembles the schema namespaces and
//! writes the result as JSON.
//!
//! **Usage:**
//! ```
//! apisurface --model <model.json> [--config <synth.toml>] [--policy <POLICY>] [--out <path>]
//! ```
//!
//! Logging is controlled by `RUST_LOG`. Exits non-zero if the run cannot
//! start or any handler fails to synthesize.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use apisurface_model::ModelDocument;
use apisurface_synth::{
    run, AcceptAll, AccessPolicy, DataType, Diagnostic, ResourceMethodDescriptor,
    SynthesisConfig,
};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Synthesize the API surface of a declaration model.
#[derive(Parser)]
#[command(
    name = "apisurface",
    about = "Synthesize resource method descriptors and schema namespaces from a declaration model"
)]
struct Args {
    /// Model document (JSON) with declarations and handler entries.
    #[arg(long)]
    model: PathBuf,

    /// Synthesis configuration (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Access policy; overrides the configuration file.
    #[arg(long)]
    policy: Option<AccessPolicy>,

    /// Output file (default: standard output).
    #[arg(long)]
    out: Option<PathBuf>,
}

/// One namespace as written out.
#[derive(Serialize)]
struct NamespaceOutput<'a> {
    uri: &'a str,
    types: Vec<&'a DataType>,
}

/// The document written by the driver.
#[derive(Serialize)]
struct Output<'a> {
    resource_methods: &'a [ResourceMethodDescriptor],
    namespaces: Vec<NamespaceOutput<'a>>,
    diagnostics: Vec<&'a Diagnostic>,
    failures: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("apisurface=info".parse().context("invalid log directive")?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SynthesisConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => SynthesisConfig::default(),
    };
    if let Some(policy) = args.policy {
        config.access_policy = Some(policy);
    }

    let text = fs::read_to_string(&args.model)
        .with_context(|| format!("Failed to read model {}", args.model.display()))?;
    let document: ModelDocument = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse model {}", args.model.display()))?;
    let (model, handlers) = document
        .into_model()
        .context("Model document is inconsistent")?;
    info!(
        declarations = model.len(),
        handlers = handlers.len(),
        "model loaded"
    );

    let surface = run(&model, &handlers, &config).context("Synthesis failed")?;

    let output = Output {
        resource_methods: &surface.report.descriptors,
        namespaces: surface
            .namespaces
            .iter()
            .map(|ns| NamespaceOutput {
                uri: ns.uri(),
                types: ns.types(&AcceptAll),
            })
            .collect(),
        diagnostics: surface.report.diagnostics().collect(),
        failures: surface.report.failures.iter().map(ToString::to_string).collect(),
    };
    let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;

    match &args.out {
        Some(path) => {
            fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "surface written");
        }
        None => println!("{json}"),
    }

    for failure in &surface.report.failures {
        eprintln!("FAIL  {failure}");
    }
    if !surface.report.all_succeeded() {
        process::exit(1);
    }
    Ok(())
}
