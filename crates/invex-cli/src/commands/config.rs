//! Config command - inspect and edit the configuration file.
//!
//! Every subcommand works on the file named by the global `--config` flag,
//! falling back to `<config_dir>/invex/config.json`. Keys are dotted paths
//! into the serialized [`InvexConfig`], e.g. `extraction.amount_window`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;
use tracing::debug;

use invex_core::models::config::InvexConfig;

use super::default_config_path;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write a configuration file with default values
    Init {
        /// Where to write the file (defaults to the active config path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one value, e.g. `extraction.amount_window`
    Get { key: String },

    /// Change one value. Lists take JSON or comma-separated items.
    Set { key: String, value: String },

    /// Print the active configuration file path
    Path,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show => {
            let file = ConfigFile::open(&path)?;
            if !file.exists {
                println!(
                    "{} {} does not exist, showing defaults.",
                    style("ℹ").blue(),
                    path.display()
                );
            }
            println!("{}", serde_json::to_string_pretty(&file.values)?);
        }
        ConfigCommand::Init { output, force } => {
            let target = output.unwrap_or(path);
            if target.exists() && !force {
                bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    target.display()
                );
            }
            ConfigFile::defaults(&target)?.save()?;
            println!(
                "{} Created configuration file at {}",
                style("✓").green(),
                target.display()
            );
        }
        ConfigCommand::Get { key } => {
            let file = ConfigFile::open(&path)?;
            println!("{}", serde_json::to_string_pretty(file.get(&key)?)?);
        }
        ConfigCommand::Set { key, value } => {
            let mut file = ConfigFile::open(&path)?;
            let stored = file.set(&key, &value)?;
            file.save()?;
            println!(
                "{} {} = {} ({})",
                style("✓").green(),
                key,
                stored,
                path.display()
            );
        }
        ConfigCommand::Path => {
            let status = if path.exists() {
                style("exists").green()
            } else {
                style("not created, run 'invex config init'").yellow()
            };
            println!("{} [{}]", path.display(), status);
        }
    }

    Ok(())
}

/// A configuration file held as JSON so single keys can be read and edited.
///
/// Edits are checked against [`InvexConfig`] before they are accepted, so
/// the held values always deserialize.
struct ConfigFile {
    path: PathBuf,
    exists: bool,
    values: Value,
}

impl ConfigFile {
    /// Load `path`, or the defaults when the file does not exist yet.
    fn open(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Self::defaults(path);
        }
        let config = InvexConfig::from_file(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            exists: true,
            values: serde_json::to_value(config)?,
        })
    }

    fn defaults(path: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            exists: false,
            values: serde_json::to_value(InvexConfig::default())?,
        })
    }

    fn get(&self, key: &str) -> anyhow::Result<&Value> {
        self.values
            .pointer(&json_pointer(key))
            .ok_or_else(|| unknown_key(&self.values, key))
    }

    /// Replace the value at `key`, returning what was stored.
    fn set(&mut self, key: &str, raw: &str) -> anyhow::Result<Value> {
        let current = self.get(key)?;
        if let Value::Object(section) = current {
            bail!(
                "`{}` is a section; set one of: {}",
                key,
                key_list(section)
            );
        }

        let value = coerce(current, raw);
        let mut candidate = self.values.clone();
        if let Some(slot) = candidate.pointer_mut(&json_pointer(key)) {
            *slot = value.clone();
        }
        serde_json::from_value::<InvexConfig>(candidate.clone())
            .map_err(|e| anyhow!("Invalid value for `{}`: {}", key, e))?;

        debug!("Config {} set to {}", key, value);
        self.values = candidate;
        Ok(value)
    }

    fn save(&self) -> anyhow::Result<()> {
        let config: InvexConfig = serde_json::from_value(self.values.clone())?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        config
            .save(&self.path)
            .with_context(|| format!("Failed to write config file {}", self.path.display()))
    }
}

fn json_pointer(key: &str) -> String {
    if key.is_empty() {
        String::new()
    } else {
        format!("/{}", key.replace('.', "/"))
    }
}

fn key_list(section: &serde_json::Map<String, Value>) -> String {
    section.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn unknown_key(values: &Value, key: &str) -> anyhow::Error {
    let parent = key.rsplit_once('.').map_or("", |(parent, _)| parent);
    match values.pointer(&json_pointer(parent)).and_then(Value::as_object) {
        Some(section) => anyhow!(
            "Unknown configuration key `{}`; valid keys here: {}",
            key,
            key_list(section)
        ),
        None => anyhow!("Unknown configuration key `{}`", key),
    }
}

/// Interpret a command-line value against the type currently stored.
///
/// JSON is taken as is; anything else is a string, or for list fields a
/// comma-separated list of strings.
fn coerce(current: &Value, raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(parsed) if !current.is_array() || parsed.is_array() => parsed,
        _ if current.is_array() => raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect(),
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invex_core::models::config::CustomerFallback;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scratch() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        (dir, path)
    }

    #[test]
    fn test_missing_file_reads_defaults() {
        let (_dir, path) = scratch();
        let file = ConfigFile::open(&path).unwrap();

        assert!(!file.exists);
        assert_eq!(file.get("extraction.amount_window").unwrap(), &json!(3));
        assert_eq!(file.get("server.bind").unwrap(), &json!("127.0.0.1:5000"));
    }

    #[test]
    fn test_set_and_save() {
        let (_dir, path) = scratch();
        let mut file = ConfigFile::open(&path).unwrap();
        file.set("extraction.customer_fallback", "second_paragraph").unwrap();
        file.set("pdf.render_dpi", "150").unwrap();
        file.save().unwrap();

        let config = InvexConfig::from_file(&path).unwrap();
        assert_eq!(config.pdf.render_dpi, 150);
        assert_eq!(config.extraction.customer_fallback, CustomerFallback::SecondParagraph);
        assert!(ConfigFile::open(&path).unwrap().exists);
    }

    #[test]
    fn test_list_from_comma_separated_value() {
        let (_dir, path) = scratch();
        let mut file = ConfigFile::open(&path).unwrap();

        let stored = file
            .set("extraction.total_keywords", "grand total, amount due")
            .unwrap();
        assert_eq!(stored, json!(["grand total", "amount due"]));

        file.set("extraction.total_keywords", r#"["total"]"#).unwrap();
        assert_eq!(file.get("extraction.total_keywords").unwrap(), &json!(["total"]));
    }

    #[test]
    fn test_unknown_key_lists_section_keys() {
        let (_dir, path) = scratch();
        let mut file = ConfigFile::open(&path).unwrap();

        let err = file.set("server.port", "8080").unwrap_err().to_string();
        assert!(err.contains("server.port"));
        assert!(err.contains("bind"));
        assert!(err.contains("max_upload_bytes"));

        assert!(file.get("nope.missing").is_err());
    }

    #[test]
    fn test_section_cannot_be_replaced() {
        let (_dir, path) = scratch();
        let mut file = ConfigFile::open(&path).unwrap();

        let err = file.set("pdf", "{}").unwrap_err().to_string();
        assert!(err.contains("is a section"));
        assert!(err.contains("render_dpi"));
    }

    #[test]
    fn test_wrong_type_leaves_values_untouched() {
        let (_dir, path) = scratch();
        let mut file = ConfigFile::open(&path).unwrap();

        assert!(file.set("pdf.render_dpi", "high").is_err());
        assert!(file.set("extraction.customer_fallback", "third_paragraph").is_err());
        assert_eq!(file.get("pdf.render_dpi").unwrap(), &json!(300));
        assert_eq!(file.get("extraction.customer_fallback").unwrap(), &json!("absent"));
    }
}
