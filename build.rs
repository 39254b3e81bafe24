//! Set up the linker script and the panel configuration for the firmware

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

const PANEL_ENV: &str = "panel.env";

fn main() {
    // Put the linker script somewhere the linker can find it
    let out = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    println!("cargo:rustc-link-search={}", out.display());

    // The file `memory.x` is loaded by cortex-m-rt's `link.x` script, which
    // is what we specify in `.cargo/config.toml` for Arm builds
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();
    println!("cargo:rerun-if-changed=memory.x");

    println!("cargo:rerun-if-changed=build.rs");

    load_panel_config();

    println!("cargo:rerun-if-changed={}", PANEL_ENV);
}

/// Re-exports every entry of `panel.env` to rustc so `const_env` can pick it up.
/// A variable already present in the build environment wins over the file.
fn load_panel_config() {
    let entries = match dotenvy::from_path_iter(PANEL_ENV) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries {
        let (key, value) = entry.unwrap();
        println!("cargo:rerun-if-env-changed={}", key);
        let value = env::var(&key).unwrap_or(value);
        println!("cargo:rustc-env={}={}", key, value);
    }
}
