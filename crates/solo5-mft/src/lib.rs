//! Solo5 application manifest compiler and validator.
//!
//! A manifest lists the devices a unikernel expects from its tender. It is
//! authored as a JSON (or TOML) source, compiled into a C source file that
//! the Solo5 toolchain links into the image, and embedded there as the
//! `MFT1` note. This crate compiles sources, validates manifests read back
//! out of built images, and decodes the companion `ABI1` note.
//!
//! ## Manifest Layout
//!
//! ```text
//! MFT1 note descriptor:
//! ┌──────────────────────────────┐
//! │ version: u32                 │  4 bytes
//! │ entries: u32                 │  4 bytes
//! ├──────────────────────────────┤
//! │ entry 0 (reserved)           │  96 bytes
//! │   name: [u8; 68] (NUL-term.) │
//! │   type: u32                  │
//! │   device payload, host state │  24 bytes
//! ├──────────────────────────────┤
//! │ entry 1..N (devices)         │  96 bytes each
//! └──────────────────────────────┘
//! ```

pub mod abi;
pub mod compile;
pub mod document;
pub mod dump;
pub mod extract;
pub mod layout;
mod render;
pub mod validate;

pub use abi::{AbiInfo, AbiTarget};
pub use compile::{compile, compile_with, CompileError, CompileOptions, CompiledManifest, DeviceDecl};
pub use document::{DocumentError, Node, NodeKind, SourceFormat};
pub use dump::ManifestDump;
pub use extract::{abi_from_image, manifest_from_image, ExtractError};
pub use layout::{DeviceType, EntryKind, MftEntry, MftTable};
pub use render::MFT_DEV_PREFIX;
pub use validate::{validate, ValidationError};
