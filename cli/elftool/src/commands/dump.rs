//! `solo5-elftool dump`: print the manifest embedded in an image.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use solo5_mft::{manifest_from_image, ManifestDump};

/// Validate the manifest of `binary` and print it as JSON.
pub fn run(binary: &Path) -> Result<()> {
    println!("{}", render(binary)?);
    Ok(())
}

pub(crate) fn render(binary: &Path) -> Result<String> {
    let image = fs::read(binary).with_context(|| format!("{}: could not open", binary.display()))?;
    let table = manifest_from_image(&image).with_context(|| binary.display().to_string())?;
    Ok(ManifestDump::from_table(&table).to_json()?)
}
