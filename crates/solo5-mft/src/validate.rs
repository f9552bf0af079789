//! Validation of manifest note descriptors read back from an image.
//!
//! The bytes come from an untrusted image, so every structural property is
//! checked before any entry is decoded: header present, version supported,
//! entry count within bounds and consistent with the buffer length, entry 0
//! reserved, names terminated.

use thiserror::Error;

use crate::layout::{
    encoded_size, DeviceType, EntryKind, MftEntry, MftTable, ENTRY_TYPE_OFFSET, MFT_ENTRY_SIZE,
    MFT_HEADER_SIZE, MFT_MAX_ENTRIES, MFT_NAME_SIZE, MFT_RESERVED_FIRST, MFT_VERSION,
};

/// Reasons a manifest buffer is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("manifest too small: {len} bytes")]
    TooSmall { len: usize },

    #[error("unsupported manifest version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid entry count {entries} (must be 1..={max})")]
    BadEntryCount { entries: u32, max: usize },

    #[error("size mismatch: {entries} entries need {expected} bytes, got {actual}")]
    SizeMismatch {
        entries: u32,
        expected: usize,
        actual: usize,
    },

    #[error("entry 0 has type {tag:#x}, expected a reserved type")]
    FirstEntryNotReserved { tag: u32 },

    #[error("entry {index}: name is not NUL-terminated")]
    UnterminatedName { index: usize },

    #[error("entry {index}: name is not valid UTF-8")]
    InvalidName { index: usize },

    /// A tag below the reserved range that no known device kind uses. This
    /// points at a mismatched toolchain rather than a user error.
    #[error("entry {index}: unknown device type tag {tag}")]
    UnknownDeviceType { index: usize, tag: u32 },
}

/// Check a raw manifest and decode it into a table.
pub fn validate(raw: &[u8]) -> Result<MftTable, ValidationError> {
    if raw.len() < MFT_HEADER_SIZE {
        return Err(ValidationError::TooSmall { len: raw.len() });
    }

    let version = le_u32(&raw[0..4]);
    if version != MFT_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            found: version,
            expected: MFT_VERSION,
        });
    }

    let entries = le_u32(&raw[4..8]);
    let count = entries as usize;
    if count == 0 || count > MFT_MAX_ENTRIES {
        return Err(ValidationError::BadEntryCount {
            entries,
            max: MFT_MAX_ENTRIES,
        });
    }

    let expected = encoded_size(count);
    if raw.len() != expected {
        return Err(ValidationError::SizeMismatch {
            entries,
            expected,
            actual: raw.len(),
        });
    }

    let mut decoded = Vec::with_capacity(count);
    for (index, entry) in raw[MFT_HEADER_SIZE..].chunks_exact(MFT_ENTRY_SIZE).enumerate() {
        decoded.push(decode_entry(index, entry)?);
    }

    if let EntryKind::Device(device) = decoded[0].kind {
        return Err(ValidationError::FirstEntryNotReserved { tag: device.tag() });
    }

    Ok(MftTable::from_entries(decoded))
}

fn decode_entry(index: usize, raw: &[u8]) -> Result<MftEntry, ValidationError> {
    let tag = le_u32(&raw[ENTRY_TYPE_OFFSET..ENTRY_TYPE_OFFSET + 4]);
    let kind = if tag >= MFT_RESERVED_FIRST {
        EntryKind::Reserved(tag)
    } else {
        match DeviceType::from_tag(tag) {
            Some(device) => EntryKind::Device(device),
            // Entry 0 gets the more specific error.
            None if index == 0 => return Err(ValidationError::FirstEntryNotReserved { tag }),
            None => return Err(ValidationError::UnknownDeviceType { index, tag }),
        }
    };

    let name_buf = &raw[..MFT_NAME_SIZE];
    let len = name_buf
        .iter()
        .position(|b| *b == 0)
        .ok_or(ValidationError::UnterminatedName { index })?;
    let name = std::str::from_utf8(&name_buf[..len])
        .map_err(|_| ValidationError::InvalidName { index })?
        .to_string();

    Ok(MftEntry { name, kind })
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use crate::document::{parse, SourceFormat};

    fn sample() -> MftTable {
        let mut table = MftTable::new();
        table.push_device("disk", DeviceType::BlockBasic).unwrap();
        table.push_device("net0", DeviceType::NetBasic).unwrap();
        table
    }

    fn entry_offset(index: usize) -> usize {
        MFT_HEADER_SIZE + index * MFT_ENTRY_SIZE
    }

    #[test]
    fn accepts_encoded_table() {
        let table = sample();
        let decoded = validate(&table.to_bytes()).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn reserved_only_table() {
        let decoded = validate(&MftTable::new().to_bytes()).unwrap();
        assert_eq!(decoded.entry_count(), 1);
        assert_eq!(decoded.devices().count(), 0);
    }

    #[test]
    fn compile_then_validate_round_trip() {
        let source = parse(
            r#"{"version": 1, "devices": [
                {"name": "net0", "type": "NET_BASIC"},
                {"name": "storage", "type": "BLOCK_BASIC"},
                {"name": "net1", "type": "NET_BASIC"}
            ]}"#,
            SourceFormat::Json,
        )
        .unwrap();
        let compiled = compile(&source).unwrap();
        let bytes = compiled.to_table().unwrap().to_bytes();

        let table = validate(&bytes).unwrap();
        let pairs: Vec<_> = table
            .devices()
            .map(|(name, device)| (name.to_string(), device.name().to_string()))
            .collect();
        let declared: Vec<_> = compiled
            .devices()
            .iter()
            .map(|d| (d.name.clone(), d.type_name.clone()))
            .collect();
        assert_eq!(pairs, declared);
    }

    #[test]
    fn rejects_short_buffer() {
        assert_eq!(
            validate(&[1, 0, 0]),
            Err(ValidationError::TooSmall { len: 3 })
        );
    }

    #[test]
    fn rejects_other_version_even_when_well_sized() {
        let mut bytes = sample().to_bytes();
        bytes[0..4].copy_from_slice(&2u32.to_le_bytes());
        assert_eq!(
            validate(&bytes),
            Err(ValidationError::UnsupportedVersion {
                found: 2,
                expected: 1
            })
        );
    }

    #[test]
    fn rejects_size_mismatch() {
        let mut bytes = sample().to_bytes();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            validate(&bytes),
            Err(ValidationError::SizeMismatch { entries: 3, .. })
        ));

        let mut bytes = sample().to_bytes();
        bytes.extend_from_slice(&[0; MFT_ENTRY_SIZE]);
        assert!(matches!(
            validate(&bytes),
            Err(ValidationError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn rejects_count_claiming_more_entries() {
        let mut bytes = sample().to_bytes();
        bytes[4..8].copy_from_slice(&4u32.to_le_bytes());
        assert_eq!(
            validate(&bytes),
            Err(ValidationError::SizeMismatch {
                entries: 4,
                expected: encoded_size(4),
                actual: encoded_size(3),
            })
        );
    }

    #[test]
    fn rejects_zero_and_excessive_counts() {
        let mut bytes = MFT_VERSION.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            validate(&bytes),
            Err(ValidationError::BadEntryCount { entries: 0, .. })
        ));

        let mut bytes = sample().to_bytes();
        bytes[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            validate(&bytes),
            Err(ValidationError::BadEntryCount { .. })
        ));
    }

    #[test]
    fn rejects_device_in_first_entry() {
        let mut bytes = sample().to_bytes();
        let at = entry_offset(0) + ENTRY_TYPE_OFFSET;
        bytes[at..at + 4].copy_from_slice(&DeviceType::NetBasic.tag().to_le_bytes());
        assert_eq!(
            validate(&bytes),
            Err(ValidationError::FirstEntryNotReserved { tag: 2 })
        );
    }

    #[test]
    fn rejects_unterminated_name() {
        let mut bytes = sample().to_bytes();
        let at = entry_offset(1);
        bytes[at..at + MFT_NAME_SIZE].fill(b'a');
        assert_eq!(
            validate(&bytes),
            Err(ValidationError::UnterminatedName { index: 1 })
        );
    }

    #[test]
    fn rejects_non_utf8_name() {
        let mut bytes = sample().to_bytes();
        let at = entry_offset(2);
        bytes[at] = 0xff;
        assert_eq!(
            validate(&bytes),
            Err(ValidationError::InvalidName { index: 2 })
        );
    }

    #[test]
    fn unknown_tag_is_distinct() {
        let mut bytes = sample().to_bytes();
        let at = entry_offset(2) + ENTRY_TYPE_OFFSET;
        bytes[at..at + 4].copy_from_slice(&77u32.to_le_bytes());
        assert_eq!(
            validate(&bytes),
            Err(ValidationError::UnknownDeviceType { index: 2, tag: 77 })
        );
    }

    #[test]
    fn later_reserved_entries_are_skipped() {
        let mut bytes = sample().to_bytes();
        let at = entry_offset(1) + ENTRY_TYPE_OFFSET;
        bytes[at..at + 4].copy_from_slice(&(MFT_RESERVED_FIRST + 1).to_le_bytes());

        let table = validate(&bytes).unwrap();
        assert_eq!(table.entry_count(), 3);
        let devices: Vec<_> = table.devices().collect();
        assert_eq!(devices, [("net0", DeviceType::NetBasic)]);
    }
}
