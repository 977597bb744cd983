//! CLI command implementations

pub mod batch;
pub mod compare;
pub mod scramble;

use anyhow::{Context, Result};
use std::path::Path;
use stim_io::{ImageData, ImageStore};
use stim_ops::{PhaseSource, ScrambleParams};

/// Load image from path
pub fn load_image(path: &Path) -> Result<ImageData> {
    stim_io::read(path).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Scrambles one loaded image into a new RGB image of the same size.
pub fn scramble_image<S: PhaseSource + ?Sized>(
    image: &ImageData,
    params: &ScrambleParams,
    phase: &mut S,
) -> Result<ImageData> {
    let rgb = image.to_rgb_f32()?;
    let out = stim_ops::scramble(
        &rgb,
        image.width as usize,
        image.height as usize,
        params,
        phase,
    )?;
    Ok(ImageData::from_f32(image.width, image.height, 3, out))
}

/// Save image through a store
pub fn save_image<S: ImageStore + ?Sized>(store: &mut S, path: &Path, image: &ImageData) -> Result<()> {
    store
        .save(path, image)
        .with_context(|| format!("Failed to save: {}", path.display()))
}
