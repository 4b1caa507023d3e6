//! Embeds a default WWDR intermediate certificate when `AIRPRESS_WWDR_CERT`
//! names one.

use std::env;
use std::fs;
use std::path::PathBuf;

const WWDR_ENV: &str = "AIRPRESS_WWDR_CERT";

fn main() {
    println!("cargo:rerun-if-env-changed={WWDR_ENV}");
    println!("cargo:rustc-check-cfg=cfg(airpress_bundled_wwdr)");

    let Some(source) = env::var_os(WWDR_ENV).filter(|value| !value.is_empty()) else {
        return;
    };
    let source = PathBuf::from(source);
    println!("cargo:rerun-if-changed={}", source.display());

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    if let Err(e) = fs::copy(&source, out_dir.join("wwdr.cer")) {
        panic!("failed to read {WWDR_ENV} ({}): {e}", source.display());
    }
    println!("cargo:rustc-cfg=airpress_bundled_wwdr");
}
