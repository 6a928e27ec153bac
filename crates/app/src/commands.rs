use std::path::{Path, PathBuf};

use almoner_core::{ReconcileConfig, RunContext};
use almoner_import::{export, InputDir};
use almoner_reconcile::{reconcile, ReconcileOutput};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

/// CLI-only sections of the run file. The reconciliation settings in the
/// same file are read by [`ReconcileConfig::from_toml`].
#[derive(Debug, Default, Deserialize)]
struct RunFile {
    #[serde(default)]
    inputs: Option<DirSection>,
    #[serde(default)]
    output: Option<DirSection>,
}

#[derive(Debug, Deserialize)]
struct DirSection {
    dir: PathBuf,
}

/// Everything a run needs after the config file and flags are combined.
#[derive(Debug)]
pub struct RunSettings {
    pub config: ReconcileConfig,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

const DEFAULT_OUTPUT_DIR: &str = "out";

/// Flags win over the file. Relative directories in the file are resolved
/// against the file's own directory.
pub fn load_settings(
    config_path: &Path,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<RunSettings> {
    let text = std::fs::read_to_string(config_path)
        .with_context(|| format!("reading config {}", config_path.display()))?;
    let config = ReconcileConfig::from_toml(&text)
        .with_context(|| format!("invalid config {}", config_path.display()))?;
    let file: RunFile = toml::from_str(&text)
        .with_context(|| format!("invalid config {}", config_path.display()))?;

    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let input_dir = input_dir
        .or_else(|| file.inputs.map(|s| base.join(s.dir)))
        .context("no input directory: pass --input-dir or set [inputs] dir")?;
    let output_dir = output_dir
        .or_else(|| file.output.map(|s| base.join(s.dir)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    Ok(RunSettings {
        config,
        input_dir,
        output_dir,
    })
}

/// Loads the inputs and runs every stage without writing anything.
pub fn reconcile_dir(settings: &RunSettings, as_of: NaiveDate) -> Result<ReconcileOutput> {
    let input = InputDir::new(&settings.input_dir)
        .load()
        .with_context(|| format!("loading inputs from {}", settings.input_dir.display()))?;
    let output = reconcile(&settings.config, input, RunContext::new(), as_of)
        .context("reconciliation aborted")?;
    Ok(output)
}

pub fn cmd_run(settings: &RunSettings, as_of: NaiveDate) -> Result<ReconcileOutput> {
    let output = reconcile_dir(settings, as_of)?;
    let written = export::write_all(&settings.output_dir, &output)
        .with_context(|| format!("writing outputs to {}", settings.output_dir.display()))?;
    for path in &written {
        tracing::debug!("wrote {}", path.display());
    }
    Ok(output)
}

/// Human-readable summary printed after a run.
pub fn summarize(output: &ReconcileOutput) -> String {
    let mut lines = vec![
        format!(
            "{} donation row(s), {} family(ies), {} individual(s)",
            output.ledger.len(),
            output.families.len(),
            output.individuals.len()
        ),
        output.report.summary(),
    ];
    lines.extend(output.report.match_errors.iter().map(|e| format!("  {e}")));
    lines.extend(output.report.warnings.iter().map(|w| format!("  {w}")));
    lines.join("\n")
}
