//! Manifest source compilation.
//!
//! Walks a source [`Node`] tree once, checking the shape rules of a manifest
//! source, and produces a [`CompiledManifest`]: the ordered device
//! declarations that become entries 1..N of the binary table. The reserved
//! entry 0 is implicit and never appears in the source.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{info, warn};

use crate::document::{Node, NodeKind};
use crate::layout::{DeviceType, LayoutError, MftTable, MFT_MAX_ENTRIES, MFT_NAME_MAX, MFT_VERSION};

/// Errors that can occur while compiling a manifest source.
///
/// The first defect found aborts compilation; locations use the source path
/// syntax `(root)`, `.version`, `.devices[N]`.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{location}: expected {expected}, got {found}")]
    UnexpectedType {
        location: String,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("{location}: unknown key: {key}")]
    UnknownKey { location: String, key: String },

    #[error("missing .version")]
    MissingVersion,

    #[error("missing .devices[]")]
    MissingDevices,

    #[error(".version: invalid version {found}, expected {expected}")]
    InvalidVersion { found: i128, expected: u32 },

    #[error(".devices[]: too many entries, maximum {max}")]
    TooManyEntries { max: usize },

    #[error(".devices[{index}]: missing .{key}")]
    MissingDeviceKey { index: usize, key: &'static str },

    #[error(".devices[{index}]: .name may not be empty")]
    EmptyName { index: usize },

    #[error(".devices[{index}]: name too long: {name:?} (maximum {max})")]
    NameTooLong {
        index: usize,
        name: String,
        max: usize,
    },

    #[error(".devices[{index}]: name is not alphanumeric: {name:?}")]
    NameNotAlphanumeric { index: usize, name: String },

    #[error(".devices[{index}]: unknown device type: {type_name}")]
    UnknownDeviceType { index: usize, type_name: String },

    #[error(".devices[{index}]: duplicate name {name:?}, first declared at .devices[{first}]")]
    DuplicateName {
        index: usize,
        name: String,
        first: usize,
    },

    #[error("{0}")]
    Layout(#[from] LayoutError),
}

/// Compilation knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Reject device types outside [`DeviceType`] and duplicate device
    /// names instead of passing them through with a warning.
    pub strict: bool,
}

/// One declared device, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDecl {
    pub name: String,
    /// Emitted verbatim as the `MFT_DEV_*` suffix.
    pub type_name: String,
}

/// A compiled manifest source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledManifest {
    devices: Vec<DeviceDecl>,
}

impl CompiledManifest {
    pub fn devices(&self) -> &[DeviceDecl] {
        &self.devices
    }

    /// Number of table entries, the reserved entry included.
    pub fn entry_count(&self) -> usize {
        1 + self.devices.len()
    }

    /// Resolve declared types and build the binary table.
    ///
    /// Fails on a type name that does not name a [`DeviceType`].
    pub fn to_table(&self) -> Result<MftTable, CompileError> {
        let mut table = MftTable::new();
        for (index, decl) in self.devices.iter().enumerate() {
            let device = DeviceType::from_name(&decl.type_name).ok_or_else(|| {
                CompileError::UnknownDeviceType {
                    index,
                    type_name: decl.type_name.clone(),
                }
            })?;
            table.push_device(&decl.name, device)?;
        }
        Ok(table)
    }
}

/// Compile with default (permissive) options.
pub fn compile(root: &Node) -> Result<CompiledManifest, CompileError> {
    compile_with(root, &CompileOptions::default())
}

/// Compile a manifest source tree.
pub fn compile_with(root: &Node, options: &CompileOptions) -> Result<CompiledManifest, CompileError> {
    let members = expect_object(root, "(root)")?;

    let mut version = None;
    let mut devices = None;
    let mut entries = 1;

    for (key, value) in members {
        match key.as_str() {
            "version" => {
                let Node::Integer(v) = value else {
                    return Err(unexpected(".version", NodeKind::Integer, value));
                };
                version = Some(*v);
            }
            "devices" => {
                let Node::Array(items) = value else {
                    return Err(unexpected(".devices", NodeKind::Array, value));
                };
                for (index, item) in items.iter().enumerate() {
                    expect_object(item, &format!(".devices[{index}]"))?;
                    entries += 1;
                }
                devices = Some(items);
            }
            _ => {
                return Err(CompileError::UnknownKey {
                    location: "(root)".to_string(),
                    key: key.clone(),
                })
            }
        }
    }

    let version = version.ok_or(CompileError::MissingVersion)?;
    let devices = devices.ok_or(CompileError::MissingDevices)?;

    if version != i128::from(MFT_VERSION) {
        return Err(CompileError::InvalidVersion {
            found: version,
            expected: MFT_VERSION,
        });
    }
    if entries > MFT_MAX_ENTRIES {
        return Err(CompileError::TooManyEntries {
            max: MFT_MAX_ENTRIES,
        });
    }

    let mut decls = Vec::with_capacity(devices.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (index, item) in devices.iter().enumerate() {
        let decl = compile_device(index, item)?;

        if DeviceType::from_name(&decl.type_name).is_none() {
            if options.strict {
                return Err(CompileError::UnknownDeviceType {
                    index,
                    type_name: decl.type_name,
                });
            }
            warn!(
                ".devices[{index}]: device type {} is not known to this tool, emitting MFT_DEV_{} as is",
                decl.type_name, decl.type_name
            );
        }

        if let Some(&first) = seen.get(&decl.name) {
            if options.strict {
                return Err(CompileError::DuplicateName {
                    index,
                    name: decl.name,
                    first,
                });
            }
            warn!(
                ".devices[{index}]: duplicate name {:?}, first declared at .devices[{first}]",
                decl.name
            );
        } else {
            seen.insert(decl.name.clone(), index);
        }

        decls.push(decl);
    }

    info!("compiled manifest with {entries} entries");
    Ok(CompiledManifest { devices: decls })
}

fn compile_device(index: usize, item: &Node) -> Result<DeviceDecl, CompileError> {
    let location = format!(".devices[{index}]");
    let members = expect_object(item, &location)?;

    let mut name = None;
    let mut type_name = None;

    for (key, value) in members {
        match key.as_str() {
            "name" => name = Some(expect_string(value, &format!("{location}.name"))?),
            "type" => type_name = Some(expect_string(value, &format!("{location}.type"))?),
            _ => {
                return Err(CompileError::UnknownKey {
                    location,
                    key: key.clone(),
                })
            }
        }
    }

    let name = name.ok_or(CompileError::MissingDeviceKey { index, key: "name" })?;
    if name.is_empty() {
        return Err(CompileError::EmptyName { index });
    }
    if name.len() > MFT_NAME_MAX {
        return Err(CompileError::NameTooLong {
            index,
            name: name.to_string(),
            max: MFT_NAME_MAX,
        });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CompileError::NameNotAlphanumeric {
            index,
            name: name.to_string(),
        });
    }
    let type_name = type_name.ok_or(CompileError::MissingDeviceKey { index, key: "type" })?;

    Ok(DeviceDecl {
        name: name.to_string(),
        type_name: type_name.to_string(),
    })
}

fn expect_object<'a>(node: &'a Node, location: &str) -> Result<&'a [(String, Node)], CompileError> {
    match node {
        Node::Object(members) => Ok(members),
        other => Err(unexpected(location, NodeKind::Object, other)),
    }
}

fn expect_string<'a>(node: &'a Node, location: &str) -> Result<&'a str, CompileError> {
    match node {
        Node::String(s) => Ok(s),
        other => Err(unexpected(location, NodeKind::String, other)),
    }
}

fn unexpected(location: &str, expected: NodeKind, found: &Node) -> CompileError {
    CompileError::UnexpectedType {
        location: location.to_string(),
        expected,
        found: found.kind(),
    }
}
