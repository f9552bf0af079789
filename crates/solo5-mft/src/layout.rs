//! Binary manifest layout.
//!
//! A manifest is a fixed header followed by `entries` fixed-size entries.
//! Entry 0 is always a reserved sentinel; declared devices follow it in
//! declaration order. All integers are little-endian.

use std::fmt;

use solo5_elf::NoteQuery;
use thiserror::Error;

/// The only manifest format version this crate reads and writes.
pub const MFT_VERSION: u32 = 1;

/// Size of an entry's name buffer, including the terminating NUL.
pub const MFT_NAME_SIZE: usize = 68;

/// Longest device name that fits in an entry.
pub const MFT_NAME_MAX: usize = MFT_NAME_SIZE - 1;

/// Maximum number of entries, the reserved entry included.
pub const MFT_MAX_ENTRIES: usize = 64;

/// First reserved type tag. Every tag at or above it is reserved.
pub const MFT_RESERVED_FIRST: u32 = 1 << 30;

/// `version: u32 | entries: u32`
pub const MFT_HEADER_SIZE: usize = 8;

/// `name | type: u32 | payload: [u8; 16] | hostfd: i32 | attached: u8 | pad`
pub const MFT_ENTRY_SIZE: usize = 96;

pub(crate) const ENTRY_TYPE_OFFSET: usize = MFT_NAME_SIZE;

/// Owner name of every Solo5 note.
pub const SOLO5_NOTE_NAME: &str = "Solo5";

/// "MFT1"
pub const MFT1_NOTE_TYPE: u32 = 0x3154_464d;
pub const MFT1_NOTE_ALIGN: usize = 8;
pub const MFT1_NOTE_MAX_SIZE: usize = encoded_size(MFT_MAX_ENTRIES);

/// Note carrying the application manifest.
pub const MFT1_NOTE: NoteQuery = NoteQuery {
    owner: SOLO5_NOTE_NAME,
    note_type: MFT1_NOTE_TYPE,
    align: MFT1_NOTE_ALIGN,
    max_size: MFT1_NOTE_MAX_SIZE,
};

/// Size in bytes of a manifest holding `entries` entries.
pub const fn encoded_size(entries: usize) -> usize {
    MFT_HEADER_SIZE + entries * MFT_ENTRY_SIZE
}

/// Device kinds a manifest entry can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DeviceType {
    BlockBasic = 1,
    NetBasic = 2,
}

impl DeviceType {
    pub const ALL: [DeviceType; 2] = [DeviceType::BlockBasic, DeviceType::NetBasic];

    pub fn tag(self) -> u32 {
        self as u32
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// Canonical name, also the suffix of the `MFT_DEV_*` constant.
    pub fn name(self) -> &'static str {
        match self {
            DeviceType::BlockBasic => "BLOCK_BASIC",
            DeviceType::NetBasic => "NET_BASIC",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Reserved tag (`>= MFT_RESERVED_FIRST`), never a device.
    Reserved(u32),
    Device(DeviceType),
}

impl EntryKind {
    pub fn tag(self) -> u32 {
        match self {
            EntryKind::Reserved(tag) => tag,
            EntryKind::Device(device) => device.tag(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MftEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl MftEntry {
    fn reserved_first() -> Self {
        Self {
            name: String::new(),
            kind: EntryKind::Reserved(MFT_RESERVED_FIRST),
        }
    }
}

/// Errors building a table in memory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("too many entries, maximum {max}")]
    TooManyEntries { max: usize },

    #[error("name too long: {name:?} (maximum {max})")]
    NameTooLong { name: String, max: usize },
}

/// An application manifest table.
///
/// Always holds the reserved entry at index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MftTable {
    entries: Vec<MftEntry>,
}

impl Default for MftTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MftTable {
    /// A table holding only the reserved entry.
    pub fn new() -> Self {
        Self {
            entries: vec![MftEntry::reserved_first()],
        }
    }

    /// Caller guarantees `entries[0]` is reserved.
    pub(crate) fn from_entries(entries: Vec<MftEntry>) -> Self {
        debug_assert!(matches!(
            entries.first().map(|e| e.kind),
            Some(EntryKind::Reserved(_))
        ));
        Self { entries }
    }

    /// Append a device entry.
    pub fn push_device(&mut self, name: &str, device: DeviceType) -> Result<(), LayoutError> {
        if self.entries.len() >= MFT_MAX_ENTRIES {
            return Err(LayoutError::TooManyEntries {
                max: MFT_MAX_ENTRIES,
            });
        }
        if name.len() > MFT_NAME_MAX {
            return Err(LayoutError::NameTooLong {
                name: name.to_string(),
                max: MFT_NAME_MAX,
            });
        }
        self.entries.push(MftEntry {
            name: name.to_string(),
            kind: EntryKind::Device(device),
        });
        Ok(())
    }

    pub fn entries(&self) -> &[MftEntry] {
        &self.entries
    }

    /// Number of entries, the reserved entry included.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Device entries in table order, reserved entries skipped.
    pub fn devices(&self) -> impl Iterator<Item = (&str, DeviceType)> + '_ {
        self.entries.iter().filter_map(|e| match e.kind {
            EntryKind::Device(device) => Some((e.name.as_str(), device)),
            EntryKind::Reserved(_) => None,
        })
    }

    /// Encode the table in its binary note-descriptor form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(encoded_size(self.entries.len()));
        out.extend_from_slice(&MFT_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());

        for entry in &self.entries {
            let mut raw = [0u8; MFT_ENTRY_SIZE];
            raw[..entry.name.len()].copy_from_slice(entry.name.as_bytes());
            raw[ENTRY_TYPE_OFFSET..ENTRY_TYPE_OFFSET + 4]
                .copy_from_slice(&entry.kind.tag().to_le_bytes());
            out.extend_from_slice(&raw);
        }
        out
    }
}
