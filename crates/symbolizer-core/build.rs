//! Build script for symbolizer-core
//!
//! This script checks build requirements before compilation:
//! - Minimum Rust version (raw borrows `&raw mut` = Rust 1.82.0+)
//! - Target platform (the DbgEng backend only exists on Windows)
//!
//! ## Requirements
//!
//! - **Rust**: 1.82.0 or newer
//! - **Windows**: Debugging Tools for Windows installed, or the DbgEng
//!   libraries shipped next to the executable
//! - **Other targets**: the crate builds, but `create_engine()` always fails

use std::env;

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 82, 0);

        if rustc_version < min_rust_version {
            panic!(
                "symbolizer-core requires Rust {} or newer, found {}",
                min_rust_version, rustc_version
            );
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }

    // Build scripts run on the host, so look at the target through cargo's env
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" {
        println!(
            "cargo:warning=symbolizer-core targets {}; no debugging engine backend is available there",
            if target_os.is_empty() { "an unknown OS" } else { target_os.as_str() }
        );
    }
}
