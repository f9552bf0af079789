//! `solo5-elftool abi`: print the ABI target and version of an image.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use solo5_mft::{abi_from_image, AbiInfo};

/// Print the ABI descriptor of `binary`.
pub fn run(binary: &Path) -> Result<()> {
    println!("{}", read(binary)?);
    Ok(())
}

pub(crate) fn read(binary: &Path) -> Result<AbiInfo> {
    let image = fs::read(binary).with_context(|| format!("{}: could not open", binary.display()))?;
    abi_from_image(&image).with_context(|| binary.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solo5_elf::ImageWriter;
    use solo5_mft::abi::{ABI1_NOTE_ALIGN, ABI1_NOTE_TYPE};
    use solo5_mft::layout::SOLO5_NOTE_NAME;
    use solo5_mft::{AbiTarget, ExtractError};

    #[test]
    fn reads_abi_note() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unikernel.hvt");
        let info = AbiInfo {
            target: AbiTarget::Hvt,
            version: 2,
        };
        let image = ImageWriter::new()
            .note(SOLO5_NOTE_NAME, ABI1_NOTE_TYPE, ABI1_NOTE_ALIGN, info.to_bytes().to_vec())
            .to_bytes();
        fs::write(&path, image).unwrap();

        let read_back = read(&path).unwrap();
        assert_eq!(read_back, info);
        assert_eq!(read_back.to_string(), "ABI target: hvt\nABI version: 2");
    }

    #[test]
    fn unknown_target_still_prints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unikernel.bin");
        let image = ImageWriter::new()
            .note(SOLO5_NOTE_NAME, ABI1_NOTE_TYPE, ABI1_NOTE_ALIGN, vec![99, 0, 0, 0, 1, 0, 0, 0])
            .to_bytes();
        fs::write(&path, image).unwrap();

        let info = read(&path).unwrap();
        assert!(info.to_string().starts_with("ABI target: unknown\n"));
    }

    #[test]
    fn missing_note() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.elf");
        fs::write(&path, ImageWriter::new().to_bytes()).unwrap();

        let err = read(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExtractError>(),
            Some(ExtractError::AbiNotFound)
        ));
    }
}
