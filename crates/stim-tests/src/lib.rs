//! Integration tests for stimscram crates.
//!
//! End-to-end checks across decoding, scrambling and encoding.
