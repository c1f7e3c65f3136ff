// Build script: compile the WASM bundle when targeting wasm32, then stage the
// static site (markup, styles, generated pkg/) into `dist/`.
use std::process::Command;
use std::{env, fs, path::Path};

fn main() {
    // Only run the heavy wasm-pack build when targeting wasm32.
    let target = env::var("TARGET").unwrap_or_default();
    if target == "wasm32-unknown-unknown" {
        // wasm-pack is assumed available. If not, emit warning.
        let status = Command::new("wasm-pack")
            .args(["build", "--release", "--target", "web"])
            .status();

        if let Ok(st) = status {
            if !st.success() {
                println!("cargo:warning=wasm-pack build failed");
            }
        } else {
            println!("cargo:warning=wasm-pack not installed – skipping");
        }
    }

    // Stage static/ into dist/
    let out_dir = Path::new("dist");
    if out_dir.exists() {
        fs::remove_dir_all(out_dir).ok();
    }
    fs::create_dir_all(out_dir).ok();

    let static_dir = Path::new("static");
    if static_dir.exists() {
        let mut opts = fs_extra::dir::CopyOptions::new();
        opts.content_only = true;
        opts.overwrite = true;
        if let Err(err) = fs_extra::dir::copy(static_dir, out_dir, &opts) {
            println!("cargo:warning=failed to stage static/: {}", err);
        }
    }

    println!("cargo:rerun-if-changed=static");
}
