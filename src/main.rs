use anyhow::{Context, Result};
use benchguard::{
    baseline::{load_records, BaselineSource},
    cli::{Cli, OutputFormat, Preset},
    detector::{DetectionConfig, Detector, InMemoryHistory, RegressionDetectionResult},
};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(args: &Cli) -> Result<DetectionConfig> {
    let preset = match args.preset {
        Preset::Default => DetectionConfig::default(),
        Preset::Strict => DetectionConfig::strict(),
        Preset::Permissive => DetectionConfig::permissive(),
    };
    match &args.config {
        Some(path) => preset.merge_file(path),
        None => Ok(preset),
    }
}

/// Read the history file; a missing file starts an empty history
fn load_history(path: &Path) -> Result<InMemoryHistory> {
    if !path.exists() {
        tracing::debug!("No history at {}, starting empty", path.display());
        return Ok(InMemoryHistory::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid history file {}", path.display()))
}

fn save_history(path: &Path, history: &InMemoryHistory) -> Result<()> {
    let json = serde_json::to_string_pretty(history).context("Failed to serialize history")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write history {}", path.display()))
}

fn print_result(result: &RegressionDetectionResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", result.to_report_string()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(result).context("Failed to serialize detection result")?
        ),
    }
    Ok(())
}

/// Run detection; returns whether the run should fail
fn run(args: &Cli) -> Result<bool> {
    let config = load_config(args)?;

    let history = match &args.history {
        Some(path) => load_history(path)?,
        None => InMemoryHistory::default(),
    };

    let current = load_records(&args.current)
        .with_context(|| format!("Failed to load current results {}", args.current.display()))?;
    let baseline = BaselineSource::file(&args.baseline);

    let mut detector = Detector::with_history(config, history)?;
    let result = detector.detect(&current, &baseline, args.threshold)?;

    if let Some(path) = &args.history {
        save_history(path, detector.history())?;
    }
    if let Some(path) = &args.output {
        result.write_json(path)?;
    }
    print_result(&result, args.format)?;

    Ok(args
        .fail_on
        .severity()
        .is_some_and(|severity| result.has_alerts_at_or_above(severity)))
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    if run(&args)? {
        std::process::exit(1);
    }
    Ok(())
}
