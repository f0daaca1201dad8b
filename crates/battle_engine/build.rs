//! Build script: compiles `data/typechart.json` into the `Type` enum and
//! type chart included by `src/lib.rs`.

use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let data_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("data");

    println!("cargo:rerun-if-changed=build.rs");
    battle_engine_codegen::generate_all(&out_dir, &data_dir);
}
