//! Structured rendering of a validated manifest.
//!
//! The dump has the same shape as a manifest source, so it can be fed back
//! to the compiler.

use serde::ser::Error as _;
use serde::{Deserialize, Serialize};

use crate::layout::{MftTable, MFT_VERSION};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDump {
    pub version: u32,
    pub devices: Vec<DumpedDevice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpedDevice {
    pub name: String,
    /// Canonical type name, e.g. `NET_BASIC`.
    #[serde(rename = "type")]
    pub device_type: String,
}

impl ManifestDump {
    /// Device entries of `table` in table order; reserved entries are left out.
    pub fn from_table(table: &MftTable) -> Self {
        Self {
            version: MFT_VERSION,
            devices: table
                .devices()
                .map(|(name, device)| DumpedDevice {
                    name: name.to_string(),
                    device_type: device.name().to_string(),
                })
                .collect(),
        }
    }

    /// Pretty-printed JSON, four-space indented.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        String::from_utf8(buf).map_err(serde_json::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use crate::document::{parse, SourceFormat};
    use crate::layout::DeviceType;

    #[test]
    fn dump_shape() {
        let mut table = MftTable::new();
        table.push_device("net0", DeviceType::NetBasic).unwrap();
        let json = ManifestDump::from_table(&table).to_json().unwrap();
        assert_eq!(
            json,
            r#"{
    "version": 1,
    "devices": [
        {
            "name": "net0",
            "type": "NET_BASIC"
        }
    ]
}"#
        );
    }

    #[test]
    fn empty_table_dumps_empty_list() {
        let dump = ManifestDump::from_table(&MftTable::new());
        assert_eq!(dump.version, 1);
        assert!(dump.devices.is_empty());
        assert!(dump.to_json().unwrap().contains("\"devices\": []"));
    }

    #[test]
    fn non_ascii_text_survives_serialization() {
        let dump = ManifestDump {
            version: 1,
            devices: vec![DumpedDevice {
                name: "dísk".to_string(),
                device_type: "BLOCK_BASIC".to_string(),
            }],
        };
        let json = dump.to_json().unwrap();
        assert!(json.contains("\"dísk\""), "{json}");
        assert_eq!(serde_json::from_str::<ManifestDump>(&json).unwrap(), dump);
    }

    #[test]
    fn dump_is_a_valid_source() {
        let mut table = MftTable::new();
        table.push_device("disk", DeviceType::BlockBasic).unwrap();
        table.push_device("net0", DeviceType::NetBasic).unwrap();
        let json = ManifestDump::from_table(&table).to_json().unwrap();

        let compiled = compile(&parse(&json, SourceFormat::Json).unwrap()).unwrap();
        assert_eq!(compiled.to_table().unwrap(), table);
    }
}
