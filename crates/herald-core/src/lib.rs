//! herald-core — Pure types and text processing.
//!
//! No async runtime, no I/O, no platform dependencies.

pub mod text_prep;
pub mod types;
