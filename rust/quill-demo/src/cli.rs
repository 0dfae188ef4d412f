use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use quill_capability::Settings;

/// Command-line flags.
#[derive(Debug, Parser)]
#[command(name = "quill-demo")]
#[command(bin_name = "quill-demo")]
#[command(about = "Delegate write access to a document and use it", long_about = None)]
pub struct DemoCli {
    /// TOML file with verifier and issuer settings.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Value written to the document's `foo` field.
    #[arg(long, default_value = "bar")]
    pub foo: String,

    /// Namespace to derive the document under. Random when omitted.
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Let the capability expire before the write reaches the store.
    #[arg(long)]
    pub expired: bool,
}

impl DemoCli {
    /// The settings named by `--config`, or the defaults.
    pub fn settings(&self) -> Result<Settings> {
        match &self.config {
            Some(path) => load_settings(path),
            None => Ok(Settings::default()),
        }
    }
}

/// Read [`Settings`] from a TOML file.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
