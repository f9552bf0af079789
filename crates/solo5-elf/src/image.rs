//! ELF64 image header and program header parsing.
//!
//! Only the parts needed to reach `PT_NOTE` segments are decoded: the
//! identification bytes, the fixed ELF header fields that locate the program
//! header table, and the program headers themselves. Section headers are
//! never consulted.

use crate::error::{ImageError, Result};

/// `\x7fELF`
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

pub const EI_CLASS: usize = 4;
pub const EI_DATA: usize = 5;
pub const EI_VERSION: usize = 6;

pub const ELFCLASS64: u8 = 2;
pub const ELFDATA2LSB: u8 = 1;
pub const EV_CURRENT: u8 = 1;

pub const ET_EXEC: u16 = 2;
pub const EM_X86_64: u16 = 62;
pub const PT_NOTE: u32 = 4;

/// Decoded ELF64 file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfHeader {
    pub e_type: u16,
    pub e_phoff: u64,
    pub e_phentsize: u16,
    pub e_phnum: u16,
}

impl ElfHeader {
    pub const SIZE: usize = 64;
}

/// Decoded ELF64 program header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHeader {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl ProgramHeader {
    pub const SIZE: usize = 56;

    #[inline]
    pub fn is_note(&self) -> bool {
        self.p_type == PT_NOTE
    }
}

/// A borrowed view over the bytes of an ELF64 little-endian image.
#[derive(Debug, Clone, Copy)]
pub struct ElfImage<'a> {
    data: &'a [u8],
    header: ElfHeader,
}

impl<'a> ElfImage<'a> {
    /// Check the identification bytes and decode the file header.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < 4 || data[0..4] != ELF_MAGIC {
            return Err(ImageError::NotElf);
        }
        if data.len() < ElfHeader::SIZE {
            return Err(ImageError::Truncated { what: "ELF header" });
        }
        if data[EI_CLASS] != ELFCLASS64 {
            return Err(ImageError::Unsupported {
                detail: format!("ELF class {}, expected ELFCLASS64", data[EI_CLASS]),
            });
        }
        if data[EI_DATA] != ELFDATA2LSB {
            return Err(ImageError::Unsupported {
                detail: format!("ELF data encoding {}, expected ELFDATA2LSB", data[EI_DATA]),
            });
        }
        if data[EI_VERSION] != EV_CURRENT {
            return Err(ImageError::Unsupported {
                detail: format!("ELF version {}", data[EI_VERSION]),
            });
        }

        let header = ElfHeader {
            e_type: read_u16(data, 16)?,
            e_phoff: read_u64(data, 32)?,
            e_phentsize: read_u16(data, 54)?,
            e_phnum: read_u16(data, 56)?,
        };
        if header.e_phnum > 0 && usize::from(header.e_phentsize) != ProgramHeader::SIZE {
            return Err(ImageError::Unsupported {
                detail: format!(
                    "program header entry size {}, expected {}",
                    header.e_phentsize,
                    ProgramHeader::SIZE
                ),
            });
        }

        Ok(Self { data, header })
    }

    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// Decode the whole program header table.
    pub fn program_headers(&self) -> Result<Vec<ProgramHeader>> {
        let count = usize::from(self.header.e_phnum);
        let base = to_usize(self.header.e_phoff, "program header table")?;
        let table_len = count * ProgramHeader::SIZE;
        let table = slice(self.data, base, table_len, "program header table")?;

        let mut headers = Vec::with_capacity(count);
        for raw in table.chunks_exact(ProgramHeader::SIZE) {
            headers.push(ProgramHeader {
                p_type: read_u32(raw, 0)?,
                p_flags: read_u32(raw, 4)?,
                p_offset: read_u64(raw, 8)?,
                p_vaddr: read_u64(raw, 16)?,
                p_paddr: read_u64(raw, 24)?,
                p_filesz: read_u64(raw, 32)?,
                p_memsz: read_u64(raw, 40)?,
                p_align: read_u64(raw, 48)?,
            });
        }
        Ok(headers)
    }

    /// File-backed bytes of a segment.
    pub fn segment_data(&self, phdr: &ProgramHeader) -> Result<&'a [u8]> {
        let offset = to_usize(phdr.p_offset, "segment")?;
        let len = to_usize(phdr.p_filesz, "segment")?;
        slice(self.data, offset, len, "segment")
    }
}

fn to_usize(value: u64, what: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| ImageError::Truncated { what })
}

fn slice<'a>(data: &'a [u8], offset: usize, len: usize, what: &'static str) -> Result<&'a [u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(ImageError::Truncated { what })
}

pub(crate) fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    let bytes = slice(data, offset, 2, "field")?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let bytes = slice(data, offset, 4, "field")?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub(crate) fn read_u64(data: &[u8], offset: usize) -> Result<u64> {
    let bytes = slice(data, offset, 8, "field")?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ImageWriter;

    #[test]
    fn rejects_non_elf() {
        let err = ElfImage::parse(b"#!/bin/sh\necho hi\n").unwrap_err();
        assert!(matches!(err, ImageError::NotElf));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(ElfImage::parse(&[]), Err(ImageError::NotElf)));
    }

    #[test]
    fn rejects_truncated_header() {
        let mut data = ELF_MAGIC.to_vec();
        data.extend_from_slice(&[ELFCLASS64, ELFDATA2LSB, EV_CURRENT]);
        let err = ElfImage::parse(&data).unwrap_err();
        assert!(matches!(err, ImageError::Truncated { .. }));
    }

    #[test]
    fn rejects_32bit_class() {
        let mut data = ImageWriter::new().to_bytes();
        data[EI_CLASS] = 1;
        let err = ElfImage::parse(&data).unwrap_err();
        assert!(matches!(err, ImageError::Unsupported { .. }));
        assert!(err.to_string().contains("ELFCLASS64"));
    }

    #[test]
    fn rejects_big_endian() {
        let mut data = ImageWriter::new().to_bytes();
        data[EI_DATA] = 2;
        assert!(matches!(
            ElfImage::parse(&data),
            Err(ImageError::Unsupported { .. })
        ));
    }

    #[test]
    fn parses_written_header() {
        let data = ImageWriter::new()
            .note("Solo5", 0x1234, 4, vec![1, 2, 3, 4])
            .to_bytes();
        let image = ElfImage::parse(&data).unwrap();
        assert_eq!(image.header().e_type, ET_EXEC);
        assert_eq!(image.header().e_phnum, 1);

        let phdrs = image.program_headers().unwrap();
        assert_eq!(phdrs.len(), 1);
        assert!(phdrs[0].is_note());
        assert_eq!(phdrs[0].p_align, 4);
    }

    #[test]
    fn program_table_out_of_bounds() {
        let mut data = ImageWriter::new()
            .note("Solo5", 1, 4, vec![0; 8])
            .to_bytes();
        // Point e_phoff past the end of the file.
        data[32..40].copy_from_slice(&(u64::MAX / 2).to_le_bytes());
        let image = ElfImage::parse(&data).unwrap();
        assert!(matches!(
            image.program_headers(),
            Err(ImageError::Truncated { .. })
        ));
    }
}
