//! Batch scrambling of a stimulus directory
//!
//! Every class is discovered, pre-verified and balanced before the first
//! image is touched. Items then run strictly in order through one shared
//! phase source, so a fixed seed reproduces the batch byte for byte.

use crate::BatchArgs;
use crate::naming::{sort_stimuli, StimulusFile};
use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use stim_io::{Format, FsStore, ImageStore};
use stim_ops::{ScrambleParams, SeededPhase};
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

/// Policy for classes that end up with different numbers of usable images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BalancePolicy {
    /// Proceed with unequal counts (logs a warning).
    Allow,
    /// Abort before any work.
    Fail,
    /// Drop the highest-indexed extras so every class has the same count.
    Truncate,
}

/// Everything a batch run needs besides the store.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub output_dir: PathBuf,
    pub params: ScrambleParams,
    pub seed: Option<u64>,
    pub balance: BalancePolicy,
    pub format: Option<String>,
}

/// Candidate inputs for one class, in processing order.
#[derive(Debug, Clone)]
pub struct ClassInputs {
    pub class: String,
    pub files: Vec<StimulusFile>,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Seed the phase source ran with.
    pub seed: u64,
    /// `(input, output)` for every written image.
    pub processed: Vec<(PathBuf, PathBuf)>,
    /// Inputs skipped as unreadable, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Inputs whose processing or output failed, with the error.
    pub failed: Vec<(PathBuf, String)>,
}

pub fn run(args: BatchArgs, verbose: u8) -> Result<()> {
    trace!(input_dir = %args.input_dir.display(), classes = ?args.classes, "batch::run");

    if let Some(ext) = args.format.as_deref() {
        if !Format::is_supported_extension(ext) {
            bail!("Unsupported output format: {}", ext);
        }
    }

    let candidates = args
        .classes
        .iter()
        .map(|class| discover(&args.input_dir, class))
        .collect::<Result<Vec<_>>>()?;

    let output_dir = args.output_dir.unwrap_or_else(|| args.input_dir.clone());
    let config = BatchConfig {
        output_dir,
        params: ScrambleParams::new(args.mix)?,
        seed: args.seed,
        balance: args.balance,
        format: args.format,
    };

    let mut store = FsStore::new(args.quality);
    let report = run_batch(&mut store, &config, candidates)?;

    for (path, reason) in &report.skipped {
        println!("[SKIP] {} ({})", display_name(path), reason);
    }
    if verbose > 0 {
        for (input, output) in &report.processed {
            println!("[OK] {} -> {}", display_name(input), display_name(output));
        }
    }
    for (path, reason) in &report.failed {
        eprintln!("Error: {}: {}", path.display(), reason);
    }
    println!(
        "Processed: {} success, {} skipped, {} failed (mix={}, seed={})",
        report.processed.len(),
        report.skipped.len(),
        report.failed.len(),
        config.params.mix,
        report.seed
    );

    if !report.failed.is_empty() {
        bail!("{} files failed", report.failed.len());
    }

    Ok(())
}

/// Lists `<class>_<n>.<ext>` images in `dir` with a supported extension.
pub fn discover(dir: &Path, class: &str) -> Result<ClassInputs> {
    let pattern = format!(
        "{}/{}_*",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(class)
    );

    let mut files = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("Bad class name: {}", class))? {
        let path = entry?;
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(Format::is_supported_extension);
        if !supported {
            debug!(path = %path.display(), "ignoring unsupported extension");
            continue;
        }
        match StimulusFile::from_path(path.clone(), class) {
            Some(file) => files.push(file),
            None => debug!(path = %path.display(), "ignoring name without numeric index"),
        }
    }
    sort_stimuli(&mut files);

    debug!(class, count = files.len(), "discovered");
    Ok(ClassInputs {
        class: class.to_string(),
        files,
    })
}

/// Runs the batch against `store`.
///
/// Unreadable inputs are skipped. Inputs that cannot be opened and outputs
/// that cannot be written are recorded as failed. Neither stops the loop. Errors returned here are batch-level: nothing usable to process,
/// or an imbalance rejected by [`BalancePolicy::Fail`].
pub fn run_batch<S: ImageStore + ?Sized>(
    store: &mut S,
    config: &BatchConfig,
    candidates: Vec<ClassInputs>,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    // Pre-verify every candidate before any output is written
    let mut classes = Vec::with_capacity(candidates.len());
    for class in candidates {
        let mut valid = Vec::with_capacity(class.files.len());
        for file in class.files {
            match store.verify(&file.path) {
                Ok(()) => valid.push(file),
                Err(e) if e.is_unreadable() => {
                    warn!(path = %file.path.display(), error = %e, "skipping unreadable image");
                    report.skipped.push((file.path, e.to_string()));
                }
                Err(e) => {
                    error!(path = %file.path.display(), error = %e, "cannot open input");
                    report.failed.push((file.path, e.to_string()));
                }
            }
        }
        classes.push(ClassInputs {
            class: class.class,
            files: valid,
        });
    }

    if classes.iter().all(|c| c.files.is_empty()) {
        let names: Vec<&str> = classes.iter().map(|c| c.class.as_str()).collect();
        if let Some((path, reason)) = report.failed.first() {
            bail!(
                "No valid inputs for classes: {} ({} files failed to open, first {}: {})",
                names.join(", "),
                report.failed.len(),
                path.display(),
                reason
            );
        }
        bail!("No valid inputs for classes: {}", names.join(", "));
    }

    apply_balance(&mut classes, config.balance)?;

    let counts: Vec<String> = classes
        .iter()
        .map(|c| format!("{}={}", c.class, c.files.len()))
        .collect();
    info!(inputs = %counts.join(" "), mix = config.params.mix, "Starting batch");

    let mut phase = SeededPhase::new(config.seed);
    report.seed = phase.seed();
    info!(seed = report.seed, "phase source ready");

    for class in &classes {
        for file in &class.files {
            let output = config
                .output_dir
                .join(file.name.output_name(config.format.as_deref()));

            let image = match store.load(&file.path) {
                Ok(image) => image,
                Err(e) if e.is_unreadable() => {
                    warn!(path = %file.path.display(), error = %e, "skipping unreadable image");
                    report.skipped.push((file.path.clone(), e.to_string()));
                    continue;
                }
                Err(e) => {
                    error!(path = %file.path.display(), error = %e, "load failed");
                    report.failed.push((file.path.clone(), e.to_string()));
                    continue;
                }
            };

            let result = super::scramble_image(&image, &config.params, &mut phase)
                .and_then(|scrambled| super::save_image(&mut *store, &output, &scrambled));
            match result {
                Ok(()) => {
                    info!(input = %file.path.display(), output = %output.display(), "scrambled");
                    report.processed.push((file.path.clone(), output));
                }
                Err(e) => {
                    error!(path = %file.path.display(), error = %format!("{:#}", e), "item failed");
                    report.failed.push((file.path.clone(), format!("{:#}", e)));
                }
            }
        }
    }

    info!(
        success = report.processed.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Batch processing complete"
    );
    Ok(report)
}

fn apply_balance(classes: &mut [ClassInputs], policy: BalancePolicy) -> Result<()> {
    let min = classes.iter().map(|c| c.files.len()).min().unwrap_or(0);
    let max = classes.iter().map(|c| c.files.len()).max().unwrap_or(0);
    if min == max {
        return Ok(());
    }

    let counts: Vec<String> = classes
        .iter()
        .map(|c| format!("{}={}", c.class, c.files.len()))
        .collect();
    match policy {
        BalancePolicy::Allow => {
            warn!(counts = %counts.join(" "), "classes are unbalanced");
        }
        BalancePolicy::Fail => {
            bail!("Unbalanced classes: {}", counts.join(" "));
        }
        BalancePolicy::Truncate => {
            if min == 0 {
                let empty: Vec<&str> = classes
                    .iter()
                    .filter(|c| c.files.is_empty())
                    .map(|c| c.class.as_str())
                    .collect();
                bail!("Cannot truncate to an empty class: {} has no valid inputs", empty.join(", "));
            }
            warn!(counts = %counts.join(" "), keep = min, "truncating classes");
            for class in classes.iter_mut() {
                class.files.truncate(min);
            }
        }
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
