//! Build configuration (`chainexp.toml`).

pub mod manifest;

pub use manifest::{Defaults, Manifest, ProgramSpec, Source, MANIFEST_FILE};
