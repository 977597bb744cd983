//! # stim-ops
//!
//! Pixel transforms for preparing visual control stimuli.
//!
//! # Modules
//!
//! - [`scramble`] - colour-preserving phase scrambling
//! - [`histogram`] - order-statistic histogram matching
//! - [`phase`] - random phase fields and their sources
//! - [`fft`] - 2-D DFT helpers
//! - [`stats`] - checks run against scrambled output
//!
//! # Example
//!
//! ```rust,ignore
//! use stim_ops::{scramble, PhaseSource, SeededPhase, ScrambleParams};
//!
//! let mut phase = SeededPhase::new(Some(1234));
//! let out = scramble(&rgb, width, height, &ScrambleParams::default(), &mut phase)?;
//! ```
//!
//! Images are interleaved RGB `f32` slices in [0, 1], passed together with
//! their width and height.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod fft;
pub mod histogram;
pub mod phase;
pub mod scramble;
pub mod stats;

pub use error::{OpsError, OpsResult};
pub use phase::{PhaseField, PhaseSource, SeededPhase};
pub use scramble::{phase_scramble, scramble, ScrambleParams};
