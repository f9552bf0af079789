//! Reading the manifest and ABI notes out of an image.
//!
//! Absence of a note and a note that is present but unusable are separate
//! error variants so callers can report them differently.

use thiserror::Error;
use tracing::info;

use solo5_elf::{find_note, ElfImage, ImageError};

use crate::abi::{AbiError, AbiInfo, ABI1_NOTE};
use crate::layout::{MftTable, MFT1_NOTE};
use crate::validate::{validate, ValidationError};

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The image could not be read as an ELF64 image.
    #[error("{0}")]
    Image(#[from] ImageError),

    #[error("no Solo5 manifest found in executable")]
    ManifestNotFound,

    #[error("no Solo5 ABI information found in executable")]
    AbiNotFound,

    #[error("manifest validation failed: {0}")]
    InvalidManifest(#[from] ValidationError),

    #[error("invalid ABI information: {0}")]
    InvalidAbi(#[from] AbiError),
}

impl ExtractError {
    /// Whether the note was simply not there, as opposed to unreadable.
    pub fn is_absent(&self) -> bool {
        matches!(self, ExtractError::ManifestNotFound | ExtractError::AbiNotFound)
    }
}

/// Locate and validate the application manifest of `image`.
pub fn manifest_from_image(image: &[u8]) -> Result<MftTable, ExtractError> {
    let image = ElfImage::parse(image)?;
    let raw = find_note(&image, &MFT1_NOTE)?.ok_or(ExtractError::ManifestNotFound)?;
    let table = validate(raw)?;
    info!(
        "manifest note: {} bytes, {} entries",
        raw.len(),
        table.entry_count()
    );
    Ok(table)
}

/// Locate and decode the ABI descriptor of `image`.
pub fn abi_from_image(image: &[u8]) -> Result<AbiInfo, ExtractError> {
    let image = ElfImage::parse(image)?;
    let raw = find_note(&image, &ABI1_NOTE)?.ok_or(ExtractError::AbiNotFound)?;
    Ok(AbiInfo::from_bytes(raw)?)
}
