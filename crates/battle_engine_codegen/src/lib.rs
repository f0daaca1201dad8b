//! Code generation helpers for battle_engine.
//!
//! This crate parses the JSON type chart in `data/` and generates the
//! `Type` enum and effectiveness matrix used by the damage calculator.

mod helpers;
mod models;
mod types;

use std::path::Path;
use std::println;

/// Generate all code from the data directory into the output directory.
///
/// This is the main entry point called from battle_engine's build.rs.
pub fn generate_all(out_dir: &Path, data_dir: &Path) {
    for file in &["typechart.json"] {
        println!("cargo:rerun-if-changed={}", data_dir.join(file).display());
    }

    types::generate(out_dir, data_dir);
}
