//! Single-image scramble command

use crate::ScrambleArgs;
use crate::naming::output_name;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use stim_io::FsStore;
use stim_ops::{ScrambleParams, SeededPhase};
use tracing::{debug, info, trace};

pub fn run(args: ScrambleArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), output = ?args.output, "scramble::run");

    let output = match args.output {
        Some(path) => path,
        None => default_output(&args.input)?,
    };

    let params = ScrambleParams::new(args.mix)?;
    let mut phase = SeededPhase::new(args.seed);
    info!(seed = phase.seed(), mix = params.mix, "Scrambling");

    let image = super::load_image(&args.input)?;
    debug!(width = image.width, height = image.height, channels = image.channels, "loaded");

    let scrambled = super::scramble_image(&image, &params, &mut phase)?;
    super::save_image(&mut FsStore::new(args.quality), &output, &scrambled)?;

    if verbose > 0 {
        println!(
            "{} -> {} (mix={}, seed={})",
            args.input.display(),
            output.display(),
            params.mix,
            phase.seed()
        );
    }

    Ok(())
}

/// `media/face_3.jpg` -> `media/scrambled_face_3.jpg`.
fn default_output(input: &Path) -> Result<PathBuf> {
    let file_name = input.file_name().and_then(|n| n.to_str());
    let name = file_name
        .and_then(|n| {
            let stem = Path::new(n).file_stem()?.to_str()?;
            let (class, _) = stem.rsplit_once('_')?;
            output_name(n, class, None)
        })
        .with_context(|| {
            format!(
                "Cannot derive an output name from {} (expected <class>_<n>.<ext>), pass -o",
                input.display()
            )
        })?;
    Ok(input.with_file_name(name))
}
