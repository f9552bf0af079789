//! `solo5-elftool gen`: compile a manifest source into C.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use solo5_mft::{compile_with, document, CompileOptions};
use tracing::info;

/// Compile `source` and write the generated C source to `output`.
///
/// `output` is only written once the whole source has compiled; a rejected
/// source leaves it untouched.
pub fn run(source: &Path, output: &Path, strict: bool) -> Result<()> {
    let root = document::load(source).with_context(|| format!("reading {}", source.display()))?;
    let manifest = compile_with(&root, &CompileOptions { strict })
        .with_context(|| source.display().to_string())?;

    let text = manifest.render(env!("CARGO_PKG_VERSION"));
    fs::write(output, text).with_context(|| format!("writing {}", output.display()))?;

    info!(
        "wrote {} ({} entries)",
        output.display(),
        manifest.entry_count()
    );
    Ok(())
}
