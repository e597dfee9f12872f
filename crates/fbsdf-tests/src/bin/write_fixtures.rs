//! Writes every registered fixture to disk as `<name>.bsdf.zst`.
//!
//! The files are the same bytes the integration tests read from memory,
//! so they can be fed to the `fbsdf` CLI or used as fuzz seeds.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin write_fixtures -p fbsdf-tests -- target/fixtures
//! ```
//!
//! With no argument the files land in `tests/fixtures/` under this crate.

use std::path::PathBuf;

use anyhow::{Context, Result};
use fbsdf_tests::FIXTURES;

fn main() -> Result<()> {
    let out_dir = std::env::args_os().nth(1).map_or_else(
        || PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"),
        PathBuf::from,
    );
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;

    for fixture in &FIXTURES {
        let path = out_dir.join(format!("{}.bsdf.zst", fixture.name));
        let bytes = fixture
            .compressed()
            .with_context(|| format!("cannot compress fixture {}", fixture.name))?;
        std::fs::write(&path, bytes).with_context(|| format!("cannot write {}", path.display()))?;
        println!("{:<18} {:>6} B  {}", fixture.name, bytes.len(), path.display());
    }

    println!("All fixtures written to {}", out_dir.display());
    Ok(())
}
