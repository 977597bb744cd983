//! Narrow load/save interface between the batch driver and the codecs.
//!
//! The scrambler only ever needs "give me the pixels at this path" and "put
//! these pixels at that path". Keeping that behind [`ImageStore`] lets the
//! batch logic run against an in-memory map in tests.

use crate::{ImageData, IoResult};
use std::path::Path;

/// Load/save access to images addressed by path.
pub trait ImageStore {
    /// Loads the image stored at `path`.
    fn load(&mut self, path: &Path) -> IoResult<ImageData>;

    /// Stores `image` at `path`, replacing anything already there.
    fn save(&mut self, path: &Path, image: &ImageData) -> IoResult<()>;

    /// Checks that `path` decodes, discarding the pixels.
    fn verify(&mut self, path: &Path) -> IoResult<()> {
        self.load(path).map(|_| ())
    }
}

/// [`ImageStore`] backed by the filesystem.
#[derive(Debug, Clone)]
pub struct FsStore {
    /// Quality used whenever a JPEG is written.
    pub jpeg_quality: u8,
}

impl FsStore {
    /// Creates a store writing JPEGs at the given quality.
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }
}

impl Default for FsStore {
    fn default() -> Self {
        Self::new(crate::DEFAULT_JPEG_QUALITY)
    }
}

impl ImageStore for FsStore {
    fn load(&mut self, path: &Path) -> IoResult<ImageData> {
        crate::read(path)
    }

    fn save(&mut self, path: &Path, image: &ImageData) -> IoResult<()> {
        crate::write_with_quality(path, image, self.jpeg_quality)
    }
}
