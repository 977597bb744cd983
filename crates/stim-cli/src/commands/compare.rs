//! Original vs scrambled comparison (histogram and spectrum check)

use crate::CompareArgs;
use anyhow::{Result, bail};
use serde::Serialize;
use stim_ops::stats::{compare_channels, ChannelReport};
use tracing::trace;

const CHANNEL_NAMES: [&str; 3] = ["R", "G", "B"];

#[derive(Serialize)]
struct CompareOutput {
    original: String,
    scrambled: String,
    width: u32,
    height: u32,
    channels: Vec<ChannelOutput>,
}

#[derive(Serialize)]
struct ChannelOutput {
    name: &'static str,
    histogram_max_deviation: f32,
    spectrum_relative_error: f64,
    changed_pixels: usize,
    changed_fraction: f64,
}

pub fn run(args: CompareArgs, verbose: u8) -> Result<()> {
    trace!(original = %args.original.display(), scrambled = %args.scrambled.display(), "compare::run");

    let original = super::load_image(&args.original)?;
    let scrambled = super::load_image(&args.scrambled)?;

    if original.width != scrambled.width || original.height != scrambled.height {
        bail!(
            "Image dimensions don't match: {}x{} vs {}x{}",
            original.width,
            original.height,
            scrambled.width,
            scrambled.height
        );
    }

    let reports = compare_channels(
        &original.to_rgb_f32()?,
        &scrambled.to_rgb_f32()?,
        original.width as usize,
        original.height as usize,
    )?;
    let pixels = original.pixel_count() as f64;

    if args.json {
        let out = CompareOutput {
            original: args.original.display().to_string(),
            scrambled: args.scrambled.display().to_string(),
            width: original.width,
            height: original.height,
            channels: reports.iter().map(|r| to_output(r, pixels)).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Comparing {} vs {}", args.original.display(), args.scrambled.display());
        if verbose > 0 {
            println!("  Size: {}x{}", original.width, original.height);
        }
        for r in &reports {
            println!(
                "  {}: histogram max dev {:.6}, spectrum rel err {:.4}, changed {:.1}%",
                CHANNEL_NAMES[r.channel],
                r.histogram_max_deviation,
                r.spectrum_relative_error,
                100.0 * r.changed_pixels as f64 / pixels
            );
        }
    }

    if let Some(tolerance) = args.tolerance {
        let worst = reports
            .iter()
            .map(|r| r.histogram_max_deviation)
            .fold(0.0f32, f32::max);
        if worst > tolerance {
            bail!("FAIL: histogram deviation {} exceeds tolerance {}", worst, tolerance);
        }
    }

    Ok(())
}

fn to_output(report: &ChannelReport, pixels: f64) -> ChannelOutput {
    ChannelOutput {
        name: CHANNEL_NAMES[report.channel],
        histogram_max_deviation: report.histogram_max_deviation,
        spectrum_relative_error: report.spectrum_relative_error,
        changed_pixels: report.changed_pixels,
        changed_fraction: report.changed_pixels as f64 / pixels,
    }
}
