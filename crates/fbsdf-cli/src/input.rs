use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

/// Open `path` for reading, decompressing on the fly when it ends in `.zst`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the zstd frame header
/// is unreadable.
pub fn open(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;

    if is_zstd(path) {
        info!("reading {} through zstd", path.display());
        let decoder = zstd::Decoder::new(file)
            .with_context(|| format!("cannot start zstd stream for {}", path.display()))?;
        Ok(Box::new(decoder))
    } else {
        info!("reading {}", path.display());
        Ok(Box::new(BufReader::new(file)))
    }
}

fn is_zstd(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zst")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zstd_detection_uses_the_last_extension() {
        assert!(is_zstd(Path::new("paint.bsdf.zst")));
        assert!(!is_zstd(Path::new("paint.bsdf")));
        assert!(!is_zstd(Path::new("zst")));
    }
}
