//! Audit command implementation
//!
//! Handles `h5-audit audit`, which loads one or more unpacked creatives,
//! runs the pipeline on each and prints a console or JSON report.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::bundle::BundleLoader;
use crate::checks::RuntimeMetrics;
use crate::config::{ConfigLoader, Profile, Settings};
use crate::error::{AuditError, ErrorFormatter};
use crate::findings::Verdict;
use crate::fmt::{emoji, MICROSCOPE};
use crate::infra::{FileSystem, RealFileSystem};
use crate::pipeline::{Auditor, LogCollector, MetricsCollector, NoOpCollector};
use crate::report::{self, ConsoleReport};
use crate::result::BundleResult;

/// Options for the audit command
#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    /// Creative directories
    pub paths: Vec<PathBuf>,
    /// Profile names from the command line; empty keeps the config selection
    pub profiles: Vec<String>,
    /// Print JSON instead of the console report
    pub json: bool,
    /// Explicit config file
    pub config: Option<PathBuf>,
    /// Runtime measurements to merge into every result
    pub runtime: Option<PathBuf>,
    /// Show details of passing findings
    pub verbose: bool,
}

/// Run the audit and return the process exit code
///
/// Exit codes: 0 when no bundle has FAIL status, 1 when any does. A bundle
/// that cannot be audited at all prints its error and the run exits with
/// that error's code.
///
/// # Examples
///
/// ```no_run
/// use h5_audit::cmd::audit::{cmd_audit, AuditOptions};
///
/// let code = cmd_audit(&AuditOptions {
///     paths: vec!["creatives/300x250".into()],
///     profiles: vec!["iab".to_string()],
///     ..AuditOptions::default()
/// })?;
/// std::process::exit(code);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn cmd_audit(options: &AuditOptions) -> Result<i32> {
    let settings = load_settings(options.config.as_deref(), &options.profiles)?;
    let runtime = match &options.runtime {
        Some(path) => Some(load_runtime(path)?),
        None => None,
    };
    let debug = log::log_enabled!(target: "h5_audit", log::Level::Debug);
    let auditor = Auditor::new(settings).with_collector(collector_for(debug));

    if !options.json {
        println!(
            "{} {} {} bundle(s), profiles: {}",
            emoji(MICROSCOPE),
            style("h5-audit").bold(),
            options.paths.len(),
            auditor
                .settings()
                .profiles
                .iter()
                .map(Profile::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!();
    }

    // A single bundle reports its error directly
    if let [path] = options.paths.as_slice() {
        let mut result = audit_path(&auditor, path)?;
        if let Some(runtime) = &runtime {
            result.apply_runtime(runtime, auditor.settings());
        }
        emit(options, std::slice::from_ref(&result))?;
        return Ok(exit_code(std::slice::from_ref(&result)));
    }

    let progress = progress_bar(options.paths.len() as u64, options.json);
    let outcomes: Vec<Result<BundleResult>> = options
        .paths
        .par_iter()
        .map(|path| {
            let outcome = audit_path(&auditor, path);
            progress.inc(1);
            outcome
        })
        .collect();
    progress.finish_and_clear();

    let mut results = Vec::new();
    let mut first_error_code = None;
    for outcome in outcomes {
        match outcome {
            Ok(mut result) => {
                if let Some(runtime) = &runtime {
                    result.apply_runtime(runtime, auditor.settings());
                }
                results.push(result);
            }
            Err(e) => {
                eprintln!("{}", ErrorFormatter::format(&e));
                first_error_code.get_or_insert(ErrorFormatter::exit_code(&e));
            }
        }
    }

    emit(options, &results)?;
    if !options.json {
        let errors = options.paths.len() - results.len();
        print!("{}", report::console::render_totals(&results, errors));
    }

    Ok(first_error_code.unwrap_or_else(|| exit_code(&results)))
}

/// Settings from the config file with the command-line profile override
pub fn load_settings(config: Option<&Path>, profiles: &[String]) -> Result<Settings> {
    let file = match config {
        Some(path) => ConfigLoader::load_file(path)?,
        None => ConfigLoader::load(&env::current_dir()?)?,
    };

    let selected = profiles
        .iter()
        .map(|p| p.parse::<Profile>())
        .collect::<Result<Vec<_>, AuditError>>()?;

    Ok(Settings::from_config(&file).with_profiles(selected))
}

/// Stage timings and events go to the log only when it would show them
pub(crate) fn collector_for(debug: bool) -> Arc<dyn MetricsCollector> {
    if debug {
        Arc::new(LogCollector)
    } else {
        Arc::new(NoOpCollector)
    }
}

fn load_runtime(path: &Path) -> Result<RuntimeMetrics> {
    load_runtime_with_fs(path, &RealFileSystem)
}

/// Read runtime measurements (JSON) through the given filesystem
pub fn load_runtime_with_fs<FS: FileSystem>(path: &Path, fs: &FS) -> Result<RuntimeMetrics> {
    let contents = fs.read_to_string(path).map_err(|source| AuditError::Io {
        context: format!("reading runtime metrics {}", path.display()),
        source,
    })?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid runtime metrics in {}", path.display()))
}

fn audit_path(auditor: &Auditor, path: &Path) -> Result<BundleResult> {
    let bundle = BundleLoader::new(path).load()?;
    let result = auditor.audit(&bundle).map_err(AuditError::from)?;
    Ok(result)
}

fn emit(options: &AuditOptions, results: &[BundleResult]) -> Result<()> {
    if options.json {
        println!("{}", report::to_json(results)?);
        return Ok(());
    }

    let console = ConsoleReport::new().verbose(options.verbose);
    for result in results {
        console.print(result);
    }
    Ok(())
}

fn progress_bar(len: u64, hidden: bool) -> ProgressBar {
    if hidden || len < 2 {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} bundles") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// 1 when any bundle failed, 0 otherwise
pub fn exit_code(results: &[BundleResult]) -> i32 {
    if results.iter().any(|r| r.summary.status == Verdict::Fail) {
        1
    } else {
        0
    }
}
