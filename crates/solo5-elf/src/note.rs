//! Note lookup inside `PT_NOTE` segments.
//!
//! Each note is a 12-byte header (`n_namesz`, `n_descsz`, `n_type`, all
//! little-endian `u32`) followed by the owner name and the descriptor. Both
//! the descriptor and the next note start at the next multiple of the
//! segment alignment, counted from the start of the note.

use tracing::debug;

use crate::error::{ImageError, Result};
use crate::image::{read_u32, ElfImage};

/// Size of an ELF note header.
pub const NOTE_HEADER_SIZE: usize = 12;

/// Identifies one note: owner name, type, alignment and maximum descriptor
/// size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteQuery {
    /// Owner name without the trailing NUL.
    pub owner: &'static str,
    pub note_type: u32,
    /// Required `p_align` of the carrying segment.
    pub align: usize,
    /// Largest descriptor accepted, in bytes.
    pub max_size: usize,
}

/// Find the descriptor of the first note matching `query`.
///
/// Returns `Ok(None)` when no `PT_NOTE` segment with the requested alignment
/// carries such a note. A matching note whose descriptor exceeds
/// `query.max_size` is an error, as is any note header that runs past the
/// end of its segment.
pub fn find_note<'a>(image: &ElfImage<'a>, query: &NoteQuery) -> Result<Option<&'a [u8]>> {
    let align = query.align.max(1);

    for phdr in image.program_headers()? {
        if !phdr.is_note() {
            continue;
        }
        if phdr.p_align != align as u64 {
            debug!(
                "skipping PT_NOTE segment at {:#x}: alignment {} (want {})",
                phdr.p_offset, phdr.p_align, align
            );
            continue;
        }

        let segment = image.segment_data(&phdr)?;
        if let Some(desc) = scan_segment(segment, align, query)? {
            debug!(
                "found note type {:#x} ({} bytes) in segment at {:#x}",
                query.note_type,
                desc.len(),
                phdr.p_offset
            );
            return Ok(Some(desc));
        }
    }

    debug!("no note of type {:#x} owned by {}", query.note_type, query.owner);
    Ok(None)
}

fn scan_segment<'a>(segment: &'a [u8], align: usize, query: &NoteQuery) -> Result<Option<&'a [u8]>> {
    let mut offset = 0;

    while offset < segment.len() {
        let malformed = move |detail: &str| ImageError::MalformedNote {
            offset,
            detail: detail.to_string(),
        };

        if segment.len() - offset < NOTE_HEADER_SIZE {
            return Err(malformed("truncated note header"));
        }
        let namesz = read_u32(segment, offset)? as usize;
        let descsz = read_u32(segment, offset + 4)? as usize;
        let note_type = read_u32(segment, offset + 8)?;

        let name_start = offset + NOTE_HEADER_SIZE;
        let name = name_start
            .checked_add(namesz)
            .and_then(|end| segment.get(name_start..end))
            .ok_or_else(|| malformed("name extends past segment"))?;

        let desc_start = align_up(NOTE_HEADER_SIZE + namesz, align)
            .and_then(|rel| offset.checked_add(rel))
            .ok_or_else(|| malformed("name size overflows"))?;
        let desc_end = desc_start
            .checked_add(descsz)
            .filter(|end| *end <= segment.len())
            .ok_or_else(|| malformed("descriptor extends past segment"))?;

        if note_type == query.note_type && owner_matches(name, query.owner) {
            if descsz > query.max_size {
                return Err(ImageError::NoteTooLarge {
                    note_type,
                    size: descsz,
                    max: query.max_size,
                });
            }
            return Ok(Some(&segment[desc_start..desc_end]));
        }

        offset = match align_up(desc_end, align) {
            Some(next) => next,
            None => return Err(malformed("descriptor size overflows")),
        };
    }

    Ok(None)
}

fn owner_matches(name: &[u8], owner: &str) -> bool {
    name.strip_suffix(&[0]) == Some(owner.as_bytes())
}

fn align_up(value: usize, align: usize) -> Option<usize> {
    value.checked_next_multiple_of(align)
}
