//! Stimulus file naming.
//!
//! Inputs are named `<class>_<n>.<ext>` (`face_12.jpg`, `car_3.png`).
//! Scrambled outputs are named `scrambled_<class>_<n>.<ext>`, carrying the
//! class label and the numeric index over unchanged.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Prefix marking a scrambled control stimulus.
pub const SCRAMBLED_PREFIX: &str = "scrambled";

/// A parsed `<class>_<n>.<ext>` file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulusName {
    /// Class label, e.g. `face`.
    pub class: String,
    /// Numeric index exactly as written, leading zeros included.
    pub index: String,
    /// File extension without the dot.
    pub ext: String,
}

impl StimulusName {
    /// Parses `file_name` as a stimulus of `class`.
    ///
    /// Returns `None` unless the stem is exactly `<class>_<digits>` and an
    /// extension is present.
    pub fn parse(file_name: &str, class: &str) -> Option<Self> {
        let path = Path::new(file_name);
        let stem = path.file_stem()?.to_str()?;
        let ext = path.extension()?.to_str()?;

        let index = stem.strip_prefix(class)?.strip_prefix('_')?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            class: class.to_string(),
            index: index.to_string(),
            ext: ext.to_string(),
        })
    }

    /// Name of the scrambled counterpart, optionally with another extension.
    pub fn output_name(&self, ext: Option<&str>) -> String {
        format!(
            "{}_{}_{}.{}",
            SCRAMBLED_PREFIX,
            self.class,
            self.index,
            ext.unwrap_or(&self.ext)
        )
    }

    /// Orders by numeric index value, then by the index text.
    pub fn cmp_index(&self, other: &Self) -> Ordering {
        let a = self.index.trim_start_matches('0');
        let b = other.index.trim_start_matches('0');
        a.len()
            .cmp(&b.len())
            .then_with(|| a.cmp(b))
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Maps an input file name to its scrambled output name.
///
/// `output_name("face_12.jpg", "face", None)` is `Some("scrambled_face_12.jpg")`.
pub fn output_name(input_name: &str, class: &str, ext: Option<&str>) -> Option<String> {
    StimulusName::parse(input_name, class).map(|n| n.output_name(ext))
}

/// An input file together with its parsed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulusFile {
    /// Full input path.
    pub path: PathBuf,
    /// Parsed file name.
    pub name: StimulusName,
}

impl StimulusFile {
    /// Builds from a path, if its file name parses for `class`.
    pub fn from_path(path: PathBuf, class: &str) -> Option<Self> {
        let name = StimulusName::parse(path.file_name()?.to_str()?, class)?;
        Some(Self { path, name })
    }
}

/// Sorts stimuli into processing order: numeric index, then path.
pub fn sort_stimuli(files: &mut [StimulusFile]) {
    files.sort_by(|a, b| a.name.cmp_index(&b.name).then_with(|| a.path.cmp(&b.path)));
}
