//! Build script for tilt-dodge-simulator.
//!
//! On Windows, links against a vendored SDL2 (`../vendor/sdl2`) and places
//! `SDL2.dll` next to the executable. Other platforms use the system SDL2.

use std::path::{Path, PathBuf};
use std::{env, fs};

fn main() {
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }

    let Some(sdl2_dir) = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .and_then(|manifest| manifest.parent().map(|root| root.join("vendor").join("sdl2")))
    else {
        return;
    };
    println!("cargo:rerun-if-changed={}", sdl2_dir.display());

    if !sdl2_dir.exists() {
        println!("cargo:warning=SDL2 not found at {}; install SDL2 or vendor it there", sdl2_dir.display());
        return;
    }
    println!("cargo:rustc-link-search=native={}", sdl2_dir.display());

    if let Some(profile_dir) = profile_dir() {
        copy_dll(&sdl2_dir.join("SDL2.dll"), &profile_dir.join("SDL2.dll"));
    }
}

/// `target/<profile>` directory, found by walking up from `OUT_DIR`.
fn profile_dir() -> Option<PathBuf> {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR")?);
    out_dir
        .ancestors()
        .find(|dir| dir.file_name().is_some_and(|name| name == "release" || name == "debug"))
        .map(Path::to_path_buf)
}

fn copy_dll(
    from: &Path,
    to: &Path,
) {
    if !from.exists() || to.exists() {
        return;
    }
    if let Err(e) = fs::copy(from, to) {
        println!("cargo:warning=Failed to copy SDL2.dll: {e}");
    }
}
