//! Batch processing command for multiple invoice files.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use invex_core::models::invoice::ExtractionResult;

use super::{format_result, load_config, FileExtractor, InputKind, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Result of processing a single file.
struct FileOutcome {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path, args.model_dir.as_deref())?;
    tokio::task::spawn_blocking(move || run_blocking(args, FileExtractor::new(config))).await?
}

fn run_blocking(args: BatchArgs, mut extractor: FileExtractor) -> anyhow::Result<()> {
    let start = Instant::now();

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| InputKind::from_path(p).is_some())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let names = output_names(&files, args.format);
    let mut outcomes = Vec::with_capacity(files.len());

    for (path, output_name) in files.into_iter().zip(names) {
        let file_start = Instant::now();
        let extracted = extractor.extract(&path).and_then(|result| {
            if let Some(output_dir) = &args.output_dir {
                write_output(&output_dir.join(&output_name), &result, args.format)?;
            }
            Ok(result)
        });
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match extracted {
            Ok(result) => {
                outcomes.push(FileOutcome {
                    path,
                    result: Some(result),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = format!("{:#}", e);
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    outcomes.push(FileOutcome {
                        path,
                        result: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    overall_pb.abandon();
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = outcomes.iter().filter(|o| o.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(outcomes.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            println!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Output file name for each input, in order.
///
/// Inputs are named `<stem>.<ext>`. Inputs whose stem is shared with another
/// input keep their own extension as well (`a.pdf.json`, `a.txt.json`).
fn output_names(files: &[PathBuf], format: OutputFormat) -> Vec<String> {
    let stem = |path: &PathBuf| {
        path.file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or("invoice")
            .to_string()
    };

    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for path in files {
        *stem_counts.entry(stem(path)).or_default() += 1;
    }

    files
        .iter()
        .map(|path| {
            let stem = stem(path);
            match path.extension().and_then(OsStr::to_str) {
                Some(ext) if stem_counts[&stem] > 1 => {
                    format!("{}.{}.{}", stem, ext, format.extension())
                }
                _ => format!("{}.{}", stem, format.extension()),
            }
        })
        .collect()
}

fn write_output(output_path: &Path, result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<()> {
    fs::write(output_path, format_result(result, format)?)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    debug!("Wrote output to {}", output_path.display());

    Ok(())
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename", "status"];
    header.extend(ExtractionResult::FIELD_NAMES);
    header.extend(["processing_time_ms", "error"]);
    wtr.write_record(&header)?;

    for outcome in outcomes {
        let filename = outcome
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = outcome.processing_time_ms.to_string();

        let mut record = vec![filename];
        match &outcome.result {
            Some(result) => {
                record.push("success");
                record.extend(result.fields().map(|(_, value)| value.unwrap_or_default()));
                record.extend([time.as_str(), ""]);
            }
            None => {
                record.push("error");
                record.extend([""; 7]);
                record.extend([time.as_str(), outcome.error.as_deref().unwrap_or("")]);
            }
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names_unique_stems() {
        let files = vec![PathBuf::from("in/acme.pdf"), PathBuf::from("in/globex.txt")];
        assert_eq!(output_names(&files, OutputFormat::Json), ["acme.json", "globex.json"]);
    }

    #[test]
    fn test_output_names_shared_stem() {
        let files = vec![
            PathBuf::from("in/a.pdf"),
            PathBuf::from("in/a.txt"),
            PathBuf::from("in/b.png"),
        ];
        assert_eq!(
            output_names(&files, OutputFormat::Csv),
            ["a.pdf.csv", "a.txt.csv", "b.csv"]
        );
    }
}
