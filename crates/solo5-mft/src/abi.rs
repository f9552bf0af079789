//! ABI descriptor note.
//!
//! Records which Solo5 target (tender) and target ABI version an image was
//! built for. Only reading is supported; the toolchain writes it.

use std::fmt;

use solo5_elf::NoteQuery;
use thiserror::Error;

use crate::layout::SOLO5_NOTE_NAME;

/// "ABI1"
pub const ABI1_NOTE_TYPE: u32 = 0x3149_4241;
pub const ABI1_NOTE_ALIGN: usize = 4;
/// `abi_target: u32 | abi_version: u32`
pub const ABI1_NOTE_MAX_SIZE: usize = 8;

/// Note carrying the ABI descriptor.
pub const ABI1_NOTE: NoteQuery = NoteQuery {
    owner: SOLO5_NOTE_NAME,
    note_type: ABI1_NOTE_TYPE,
    align: ABI1_NOTE_ALIGN,
    max_size: ABI1_NOTE_MAX_SIZE,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("ABI descriptor truncated: {len} bytes, need {}", ABI1_NOTE_MAX_SIZE)]
    Truncated { len: usize },
}

/// Execution target an image was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiTarget {
    Hvt,
    Spt,
    Virtio,
    Muen,
    Genode,
    /// A target identifier this tool does not know.
    Unknown(u32),
}

impl AbiTarget {
    pub fn from_id(id: u32) -> Self {
        match id {
            1 => AbiTarget::Hvt,
            2 => AbiTarget::Spt,
            3 => AbiTarget::Virtio,
            4 => AbiTarget::Muen,
            5 => AbiTarget::Genode,
            other => AbiTarget::Unknown(other),
        }
    }

    pub fn id(self) -> u32 {
        match self {
            AbiTarget::Hvt => 1,
            AbiTarget::Spt => 2,
            AbiTarget::Virtio => 3,
            AbiTarget::Muen => 4,
            AbiTarget::Genode => 5,
            AbiTarget::Unknown(id) => id,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AbiTarget::Hvt => "hvt",
            AbiTarget::Spt => "spt",
            AbiTarget::Virtio => "virtio",
            AbiTarget::Muen => "muen",
            AbiTarget::Genode => "genode",
            AbiTarget::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for AbiTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded ABI descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiInfo {
    pub target: AbiTarget,
    pub version: u32,
}

impl AbiInfo {
    /// Decode a note descriptor. Bytes past the eighth are ignored.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, AbiError> {
        if raw.len() < ABI1_NOTE_MAX_SIZE {
            return Err(AbiError::Truncated { len: raw.len() });
        }
        let target = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let version = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
        Ok(Self {
            target: AbiTarget::from_id(target),
            version,
        })
    }

    pub fn to_bytes(&self) -> [u8; ABI1_NOTE_MAX_SIZE] {
        let mut out = [0u8; ABI1_NOTE_MAX_SIZE];
        out[0..4].copy_from_slice(&self.target.id().to_le_bytes());
        out[4..8].copy_from_slice(&self.version.to_le_bytes());
        out
    }
}

impl fmt::Display for AbiInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ABI target: {}", self.target)?;
        write!(f, "ABI version: {}", self.version)
    }
}
