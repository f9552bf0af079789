//! Assembles minimal ELF64 images that carry notes.
//!
//! The images produced here contain a file header, a program header table and
//! one `PT_NOTE` segment per [`ImageWriter::note`] (or per
//! [`ImageWriter::shared_segment`]). There is no loadable code; the images are
//! only meant for note extraction, e.g. to embed a compiled manifest without
//! running the full unikernel toolchain.

use crate::image::{
    ElfHeader, ProgramHeader, ELFCLASS64, ELFDATA2LSB, ELF_MAGIC, EM_X86_64, ET_EXEC, EV_CURRENT,
    PT_NOTE,
};

const PF_R: u32 = 4;

#[derive(Debug, Clone)]
struct NoteSegment {
    align: usize,
    notes: Vec<(String, u32, Vec<u8>)>,
}

/// Builder for a note-carrying ELF64 little-endian image.
#[derive(Debug, Clone)]
pub struct ImageWriter {
    segments: Vec<NoteSegment>,
}

impl Default for ImageWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Add a note in its own `PT_NOTE` segment aligned to `align`.
    pub fn note(self, owner: &str, note_type: u32, align: usize, desc: Vec<u8>) -> Self {
        self.shared_segment(align, vec![(owner, note_type, desc)])
    }

    /// Add several notes packed into a single `PT_NOTE` segment.
    pub fn shared_segment(mut self, align: usize, notes: Vec<(&str, u32, Vec<u8>)>) -> Self {
        self.segments.push(NoteSegment {
            align: align.max(1),
            notes: notes
                .into_iter()
                .map(|(owner, note_type, desc)| (owner.to_string(), note_type, desc))
                .collect(),
        });
        self
    }

    /// Serialize the image.
    pub fn to_bytes(&self) -> Vec<u8> {
        let phoff = ElfHeader::SIZE;
        let mut out = vec![0u8; phoff + self.segments.len() * ProgramHeader::SIZE];

        let mut phdrs = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            pad_to(&mut out, segment.align);
            let start = out.len();
            for (owner, note_type, desc) in &segment.notes {
                encode_note(&mut out, owner, *note_type, desc, segment.align);
            }
            phdrs.push((start, out.len() - start, segment.align));
        }

        out[0..4].copy_from_slice(&ELF_MAGIC);
        out[4] = ELFCLASS64;
        out[5] = ELFDATA2LSB;
        out[6] = EV_CURRENT;
        put_u16(&mut out, 16, ET_EXEC);
        put_u16(&mut out, 18, EM_X86_64);
        put_u32(&mut out, 20, u32::from(EV_CURRENT));
        put_u64(&mut out, 32, phoff as u64);
        put_u16(&mut out, 52, ElfHeader::SIZE as u16);
        put_u16(&mut out, 54, ProgramHeader::SIZE as u16);
        put_u16(&mut out, 56, phdrs.len() as u16);
        put_u16(&mut out, 58, 64);

        for (i, (offset, size, align)) in phdrs.into_iter().enumerate() {
            let base = phoff + i * ProgramHeader::SIZE;
            put_u32(&mut out, base, PT_NOTE);
            put_u32(&mut out, base + 4, PF_R);
            put_u64(&mut out, base + 8, offset as u64);
            put_u64(&mut out, base + 16, offset as u64);
            put_u64(&mut out, base + 24, offset as u64);
            put_u64(&mut out, base + 32, size as u64);
            put_u64(&mut out, base + 40, size as u64);
            put_u64(&mut out, base + 48, align as u64);
        }

        out
    }
}

fn encode_note(out: &mut Vec<u8>, owner: &str, note_type: u32, desc: &[u8], align: usize) {
    out.extend_from_slice(&(owner.len() as u32 + 1).to_le_bytes());
    out.extend_from_slice(&(desc.len() as u32).to_le_bytes());
    out.extend_from_slice(&note_type.to_le_bytes());
    out.extend_from_slice(owner.as_bytes());
    out.push(0);
    pad_to(out, align);
    out.extend_from_slice(desc);
    pad_to(out, align);
}

fn pad_to(out: &mut Vec<u8>, align: usize) {
    let len = out.len().next_multiple_of(align);
    out.resize(len, 0);
}

fn put_u16(out: &mut [u8], offset: usize, value: u16) {
    out[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut [u8], offset: usize, value: u32) {
    out[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut [u8], offset: usize, value: u64) {
    out[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ElfImage;

    #[test]
    fn segments_are_aligned() {
        let data = ImageWriter::new()
            .note("Solo5", 1, 4, vec![1; 3])
            .note("Solo5", 2, 8, vec![2; 8])
            .to_bytes();
        let image = ElfImage::parse(&data).unwrap();
        let phdrs = image.program_headers().unwrap();
        assert_eq!(phdrs.len(), 2);
        for phdr in &phdrs {
            assert_eq!(phdr.p_offset % phdr.p_align, 0);
            assert_eq!(phdr.p_filesz % phdr.p_align, 0);
        }
    }

    #[test]
    fn note_layout_matches_gabi() {
        let data = ImageWriter::new()
            .note("Solo5", 0x31494241, 4, vec![1, 0, 0, 0, 2, 0, 0, 0])
            .to_bytes();
        let image = ElfImage::parse(&data).unwrap();
        let phdr = image.program_headers().unwrap()[0];
        let segment = image.segment_data(&phdr).unwrap();
        // namesz, descsz, type, "Solo5\0" padded to 8, descriptor
        assert_eq!(&segment[0..4], &6u32.to_le_bytes());
        assert_eq!(&segment[4..8], &8u32.to_le_bytes());
        assert_eq!(&segment[8..12], &0x31494241u32.to_le_bytes());
        assert_eq!(&segment[12..20], b"Solo5\0\0\0");
        assert_eq!(&segment[20..28], &[1, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(segment.len(), 28);
    }

    #[test]
    fn empty_image_has_no_program_headers() {
        let data = ImageWriter::new().to_bytes();
        assert_eq!(data.len(), ElfHeader::SIZE);
        let image = ElfImage::parse(&data).unwrap();
        assert!(image.program_headers().unwrap().is_empty());
    }
}
