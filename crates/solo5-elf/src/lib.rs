//! Note extraction for Solo5 executable images.
//!
//! Solo5 toolchains embed build metadata (the application manifest, the ABI
//! descriptor) as ELF notes. This crate locates one such note by owner name,
//! type, alignment and maximum size, and hands back its descriptor bytes.
//! Nothing else about the image is interpreted.
//!
//! ## Note Layout
//!
//! ```text
//! PT_NOTE segment (p_align = A):
//! ┌──────────────────────────────┐
//! │ n_namesz: u32                │
//! │ n_descsz: u32                │
//! │ n_type:   u32                │
//! ├──────────────────────────────┤
//! │ name (NUL-terminated)        │  padded to A
//! ├──────────────────────────────┤
//! │ descriptor                   │  padded to A
//! ├──────────────────────────────┤
//! │ next note ...                │
//! └──────────────────────────────┘
//! ```

mod error;
pub mod image;
pub mod note;
pub mod writer;

pub use error::{ImageError, Result};
pub use image::ElfImage;
pub use note::{find_note, NoteQuery};
pub use writer::ImageWriter;
