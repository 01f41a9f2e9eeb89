//! Build script for spotstats.
//!
//! Copies the `.env.example` configuration template into the local data
//! directory (`<data_local_dir>/spotstats/.env.example`) so users find it
//! next to the place the application reads its `.env` from:
//! - Linux: `~/.local/share/spotstats/.env.example`
//! - macOS: `~/Library/Application Support/spotstats/.env.example`
//! - Windows: `%LOCALAPPDATA%/spotstats/.env.example`
//!
//! A missing template only produces a cargo warning.

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("spotstats");

    if !env_example_path.is_file() {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
        return Ok(());
    }

    // read-only build environments should not fail the build
    if let Err(e) = fs::create_dir_all(&out_dir)
        .and_then(|_| fs::copy(&env_example_path, out_dir.join(".env.example")))
    {
        println!(
            "cargo:warning=could not copy .env.example to {}: {}",
            out_dir.display(),
            e
        );
    }

    Ok(())
}
