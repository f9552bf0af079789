//! Generated C source for a compiled manifest.
//!
//! The output is compiled by the Solo5 toolchain against `mft_abi.h`, which
//! supplies `MFT_VERSION`, the `MFT_DEV_*` constants and the
//! `MFT1_NOTE_DECLARE_*` macros that place the table in its note section.

use crate::compile::CompiledManifest;

/// Prefix of the symbolic device type constants.
pub const MFT_DEV_PREFIX: &str = "MFT_DEV";

impl CompiledManifest {
    /// Render the manifest as a C source file defining the static table.
    ///
    /// `tool_version` is recorded in the header comment.
    pub fn render(&self, tool_version: &str) -> String {
        let entries = self.entry_count();
        let mut out = format!(
            "/* Generated by solo5-elftool version {tool_version}, do not edit */\n\
             \n\
             #define MFT_ENTRIES {entries}\n\
             #include \"mft_abi.h\"\n\
             \n\
             MFT1_NOTE_DECLARE_BEGIN\n\
             {{\n\
             \x20 .version = MFT_VERSION, .entries = {entries},\n\
             \x20 .e = {{\n\
             \x20   {{ .name = \"\", .type = MFT_RESERVED_FIRST }},\n"
        );
        for device in self.devices() {
            out += &format!(
                "    {{ .name = \"{}\", .type = {MFT_DEV_PREFIX}_{} }},\n",
                device.name, device.type_name
            );
        }
        out.push_str("  }\n}\nMFT1_NOTE_DECLARE_END\n");
        out
    }
}
