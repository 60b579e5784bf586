/// Command-line front end for STL volume and mass estimation
use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use stlvol_core::{estimate_file, CountByteOrder, CountPolicy, EstimateOptions, MaterialSelection, Unit};
use tracing::{info, warn};

pub mod config;
pub mod report;

pub use config::{default_config_path, load_config, Config};
pub use report::{OutputFormat, Reporter};

#[derive(Parser, Debug, Clone)]
#[command(name = "stlvol")]
#[command(about = "Volume and printed mass of a binary STL mesh")]
#[command(version)]
pub struct Cli {
    /// Binary STL file to measure
    pub file: PathBuf,

    /// ABS, PLA, CFRP or Plexiglass (anything else is treated as ABS)
    pub material: Option<String>,

    /// Volume unit: cm or inch. The JSON volume field is only emitted for cm
    #[arg(short, long)]
    pub unit: Option<Unit>,

    /// Byte order of the facet count field: native, little or big
    #[arg(long = "count-order", value_name = "ORDER")]
    pub count_order: Option<CountByteOrder>,

    /// Stop reading once the declared facet count has been reached
    #[arg(long)]
    pub strict_count: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Config file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Colorize text output
    #[arg(long)]
    pub color: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve estimate options. Flags win over the config file, which wins
    /// over the built-in defaults.
    pub fn options(&self, config: &Config) -> EstimateOptions {
        let selector = self.material.as_deref().or_else(|| config.material());
        let material = selector
            .map(MaterialSelection::from_selector)
            .unwrap_or_default();

        let count_policy = if self.strict_count {
            CountPolicy::Strict
        } else {
            config.count_policy().unwrap_or_default()
        };

        EstimateOptions {
            material,
            unit: self.unit.or_else(|| config.unit()).unwrap_or_default(),
            count_byte_order: self
                .count_order
                .or_else(|| config.count_byte_order())
                .unwrap_or_default(),
            count_policy,
        }
    }

    pub fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) if !path.exists() => {
                anyhow::bail!("Config file not found: {}", path.display())
            }
            Some(path) => load_config(path),
            None => match default_config_path() {
                Ok(path) => load_config(&path),
                Err(_) => Ok(Config::default()),
            },
        }
    }
}

/// Run one estimate and write its outcome. Returns whether a result (rather
/// than an error object) was written.
pub fn run<W: Write>(cli: &Cli, config: &Config, out: &mut W) -> Result<bool> {
    let options = cli.options(config);
    if options.material.used_default {
        warn!(
            selector = cli.material.as_deref().or_else(|| config.material()).unwrap_or(""),
            fallback = %options.material.material,
            "unrecognized material, using default"
        );
    }

    info!(file = %cli.file.display(), ?options, "estimating");
    let outcome = estimate_file(&cli.file, &options);
    if let Err(err) = &outcome {
        warn!(error = %err, "estimate failed");
    }

    Reporter::new(cli.format, cli.color).write(out, &cli.file, &outcome)?;
    Ok(outcome.is_ok())
}
