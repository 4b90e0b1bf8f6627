//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;
pub mod serve;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use invex_core::models::config::InvexConfig;
use invex_core::models::invoice::ExtractionResult;
use invex_core::{
    DocumentProcessor, HeuristicInvoiceParser, InvoiceParser, InvoicePipeline, LopdfRasterizer,
    PureOcrEngine,
};

/// Pipeline used by every command that reads PDFs or images.
pub type NativePipeline = InvoicePipeline<LopdfRasterizer, PureOcrEngine>;

/// Output format for extracted fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension for outputs in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Kind of input file, decided by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Image,
    /// Text that was already recognized.
    Text,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "pdf" => Some(InputKind::Pdf),
            "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp" => Some(InputKind::Image),
            "txt" => Some(InputKind::Text),
            _ => None,
        }
    }
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invex")
        .join("config.json")
}

/// Load the configuration from `path`, or defaults when no path is given.
pub fn load_config(path: Option<&str>, model_dir: Option<&Path>) -> anyhow::Result<InvexConfig> {
    let mut config = match path {
        Some(path) => InvexConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to read config file {}", path))?,
        None => InvexConfig::default(),
    };

    if let Some(dir) = model_dir {
        config.models.model_dir = dir.to_path_buf();
    }

    Ok(config)
}

/// Build the PDF/image pipeline, loading OCR models from the configured directory.
pub fn build_pipeline(config: &InvexConfig) -> anyhow::Result<NativePipeline> {
    let ocr = PureOcrEngine::from_config(&config.models, config.ocr.clone()).with_context(|| {
        format!(
            "Failed to load OCR models from {}",
            config.models.model_dir.display()
        )
    })?;

    Ok(InvoicePipeline::with_config(
        LopdfRasterizer::new(),
        ocr,
        config.pdf.clone(),
        &config.extraction,
    ))
}

/// Extracts fields from files, loading OCR models only once a PDF or image shows up.
pub struct FileExtractor {
    config: InvexConfig,
    parser: HeuristicInvoiceParser,
    pipeline: Option<NativePipeline>,
}

impl FileExtractor {
    pub fn new(config: InvexConfig) -> Self {
        let parser = HeuristicInvoiceParser::from_config(&config.extraction);
        Self {
            config,
            parser,
            pipeline: None,
        }
    }

    fn pipeline(&mut self) -> anyhow::Result<&NativePipeline> {
        let pipeline = match self.pipeline.take() {
            Some(pipeline) => pipeline,
            None => build_pipeline(&self.config)?,
        };
        Ok(&*self.pipeline.insert(pipeline))
    }

    pub fn extract(&mut self, path: &Path) -> anyhow::Result<ExtractionResult> {
        let kind = InputKind::from_path(path)
            .with_context(|| format!("Unsupported file format: {}", path.display()))?;
        debug!("Extracting {:?} input {}", kind, path.display());

        let result = match kind {
            InputKind::Text => {
                let text = fs::read_to_string(path)?;
                self.parser.parse(&text)
            }
            InputKind::Pdf => {
                let data = fs::read(path)?;
                self.pipeline()?.process_document(&data)?
            }
            InputKind::Image => {
                let image = image::open(path)?;
                self.pipeline()?.process_image(&image)?
            }
        };

        Ok(result)
    }
}

/// Render a result in the requested format.
pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(ExtractionResult::FIELD_NAMES)?;
    wtr.write_record(result.fields().map(|(_, value)| value.unwrap_or_default()))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    for (name, value) in result.fields() {
        match value {
            Some(value) if value.contains('\n') => {
                output.push_str(&format!("{}:\n", name));
                for line in value.lines() {
                    output.push_str(&format!("  {}\n", line));
                }
            }
            Some(value) => output.push_str(&format!("{}: {}\n", name, value)),
            None => output.push_str(&format!("{}: -\n", name)),
        }
    }

    output
}
