//! herald-lib — Voice command engine.
//!
//! Speech fallback chain, process runner, application launcher, news and
//! assistant clients, command resolution, and HTTP API.
//! Depends on herald-core for pure types and text processing.

pub mod assistant;
pub mod command;
pub mod error;
pub mod launcher;
pub mod music;
pub mod news;
pub mod process;
pub mod server;
pub mod speech;

#[cfg(test)]
mod testing;

// Re-export herald-core for convenience
pub use herald_core;
