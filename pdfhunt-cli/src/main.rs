//! Command line entry point: runs one PDF through the analysis pipeline.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use futures::StreamExt;
use pdfhunt::observability::init_tracing;
use pdfhunt::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pdfhunt")]
#[command(version)]
#[command(about = "Static threat analysis orchestration for PDF files", long_about = None)]
struct Cli {
    /// PDF file to analyze
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Candidates tried in order when PATH is omitted
    #[arg(long, value_name = "FILE", default_value = "./hello_world_js.pdf")]
    fallback: Vec<PathBuf>,

    /// External analyzer program speaking line-delimited JSON
    #[arg(long, value_name = "CMD", env = "PDFHUNT_ANALYZER")]
    analyzer: String,

    /// Argument passed to the analyzer (repeatable)
    #[arg(long = "analyzer-arg", value_name = "ARG", allow_hyphen_values = true)]
    analyzer_args: Vec<String>,

    /// Working directory for the analyzer
    #[arg(long, value_name = "DIR")]
    analyzer_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for the report artifacts
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Iteration budget for the analyzer
    #[arg(long, value_name = "NUM")]
    max_iterations: Option<u32>,

    /// Enable debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs);

    let config = load_config(&cli)?;
    let Some(input) = resolve_input(cli.path.as_deref(), &cli.fallback) else {
        bail!("No PDF found. Pass a PATH or a --fallback file that exists");
    };

    println!("PDF THREAT HUNTER");
    println!("Target: {}", display_name(&input));

    let mut analysis = ProcessAnalysis::new(&cli.analyzer).with_args(&cli.analyzer_args);
    if let Some(ref dir) = cli.analyzer_dir {
        analysis = analysis.with_working_dir(dir);
    }
    let sink: Arc<dyn EventSink> = if cli.verbose {
        Arc::new(LoggingEventSink::debug())
    } else {
        Arc::new(LoggingEventSink::info())
    };
    let materializer = ReportMaterializer::from_config(&config);

    let pipeline = analysis_pipeline(Arc::new(analysis), config)
        .with_event_sink(sink)
        .build()
        .context("Failed to assemble the analysis pipeline")?;

    let mut updates = pipeline.run_incremental(StateRecord::new(&input));
    let mut last = None;
    while let Some(update) = updates.next().await {
        let update = update?;
        info!(stage = %update.stage, "Stage {} complete", update.stage);
        last = Some(update.record);
    }

    let Some(record) = last else {
        warn!("Pipeline produced no output");
        return Ok(());
    };

    println!();
    println!("SUMMARY:");
    match record.run_id() {
        Some(run_id) => {
            println!("Analysis ID: {run_id}");
            if let Some(report) = record.report() {
                println!("Report: {} chars", report.chars().count());
            }
            println!(
                "Files: {}, {}",
                materializer.json_file_name(run_id),
                materializer.markdown_file_name(run_id)
            );
        }
        None => println!("Analysis ID: unknown"),
    }
    println!("Done!");

    Ok(())
}

fn load_config(cli: &Cli) -> Result<HuntConfig> {
    let mut config = match cli.config {
        Some(ref path) => HuntConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => HuntConfig::default(),
    };

    if let Some(ref dir) = cli.output_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(max_iterations) = cli.max_iterations {
        config = config.with_max_iterations(max_iterations);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// An explicit path is used as given; validation reports its problems.
fn resolve_input(path: Option<&Path>, fallback: &[PathBuf]) -> Option<PathBuf> {
    match path {
        Some(path) => Some(path.to_path_buf()),
        None => fallback.iter().find(|candidate| candidate.is_file()).cloned(),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_analyzer_args() {
        let cli = Cli::try_parse_from([
            "pdfhunt",
            "--analyzer",
            "python3",
            "--analyzer-arg",
            "analyzer.py",
            "--analyzer-arg",
            "--fast",
            "--max-iterations",
            "4",
            "doc.pdf",
        ])
        .unwrap();

        assert_eq!(cli.path, Some(PathBuf::from("doc.pdf")));
        assert_eq!(cli.analyzer, "python3");
        assert_eq!(cli.analyzer_args, vec!["analyzer.py", "--fast"]);
        assert_eq!(cli.max_iterations, Some(4));
        assert_eq!(cli.analyzer_dir, None);
        assert_eq!(cli.fallback, vec![PathBuf::from("./hello_world_js.pdf")]);
    }

    #[test]
    fn test_resolve_input_prefers_explicit_path() {
        let resolved = resolve_input(Some(Path::new("missing.pdf")), &[]);
        assert_eq!(resolved, Some(PathBuf::from("missing.pdf")));
    }

    #[test]
    fn test_resolve_input_uses_first_existing_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("fallback.pdf");
        std::fs::write(&existing, b"%PDF-1.4").unwrap();

        let resolved = resolve_input(None, &[dir.path().join("nope.pdf"), existing.clone()]);

        assert_eq!(resolved, Some(existing));
        assert_eq!(resolve_input(None, &[PathBuf::from("nope.pdf")]), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/docs/a.pdf")), "a.pdf");
    }
}
