//! A curated lookup from Rich-header CompID product ids to the
//! toolchain/tool that produced them. This mirrors `compid_database.h` /
//! `rich/compid_database.cpp` in spirit but carries only a practical
//! subset of the original's exhaustive Visual Studio version table.

use super::rich_header::CompId;

/// Broad category of tool a CompID product id identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolType {
    ResourceFile,
    ExportedSymbol,
    ImportedSymbol,
    Linker,
    Assembly,
    CSource,
    CppSource,
    Unknown,
}

struct Entry {
    prod_id: u16,
    tool: ToolType,
    description: &'static str,
}

// A non-exhaustive subset covering the common MSVC linker/compiler/import
// product ids seen in the wild; the full Visual Studio version history
// from the original table is not reproduced.
const ENTRIES: &[Entry] = &[
    Entry {
        prod_id: 0x0000,
        tool: ToolType::Unknown,
        description: "unmarked object",
    },
    Entry {
        prod_id: 0x0001,
        tool: ToolType::ImportedSymbol,
        description: "Import0",
    },
    Entry {
        prod_id: 0x0002,
        tool: ToolType::Linker,
        description: "Linker510",
    },
    Entry {
        prod_id: 0x0004,
        tool: ToolType::CppSource,
        description: "Cvtomf510",
    },
    Entry {
        prod_id: 0x0006,
        tool: ToolType::CppSource,
        description: "Cvtomf520",
    },
    Entry {
        prod_id: 0x000a,
        tool: ToolType::Linker,
        description: "Linker600",
    },
    Entry {
        prod_id: 0x000b,
        tool: ToolType::CppSource,
        description: "Cvtres600",
    },
    Entry {
        prod_id: 0x000c,
        tool: ToolType::Linker,
        description: "Utc11_Basic",
    },
    Entry {
        prod_id: 0x000d,
        tool: ToolType::CppSource,
        description: "Utc11_C",
    },
    Entry {
        prod_id: 0x000e,
        tool: ToolType::CppSource,
        description: "Utc12_Basic",
    },
    Entry {
        prod_id: 0x000f,
        tool: ToolType::CppSource,
        description: "Utc12_C",
    },
    Entry {
        prod_id: 0x0010,
        tool: ToolType::CppSource,
        description: "Utc12_CPP",
    },
    Entry {
        prod_id: 0x0013,
        tool: ToolType::Linker,
        description: "Linker700",
    },
    Entry {
        prod_id: 0x0015,
        tool: ToolType::CppSource,
        description: "Utc13_Basic",
    },
    Entry {
        prod_id: 0x0016,
        tool: ToolType::CppSource,
        description: "Utc13_C",
    },
    Entry {
        prod_id: 0x0017,
        tool: ToolType::CppSource,
        description: "Utc13_CPP",
    },
    Entry {
        prod_id: 0x001c,
        tool: ToolType::ResourceFile,
        description: "Cvtres900",
    },
    Entry {
        prod_id: 0x005a,
        tool: ToolType::Linker,
        description: "Linker1400 (Visual Studio 2005)",
    },
    Entry {
        prod_id: 0x00db,
        tool: ToolType::CppSource,
        description: "Utc1900_CPP (Visual Studio 2015+)",
    },
    Entry {
        prod_id: 0x00dc,
        tool: ToolType::CSource,
        description: "Utc1900_C (Visual Studio 2015+)",
    },
    Entry {
        prod_id: 0x0104,
        tool: ToolType::Linker,
        description: "Linker1400 (masm)",
    },
];

/// Returns the curated description for `compid.prod_id`, if known.
pub fn describe(compid: &CompId) -> Option<&'static str> {
    ENTRIES
        .iter()
        .find(|e| e.prod_id == compid.prod_id)
        .map(|e| e.description)
}

/// Returns the broad tool category for a product id, `ToolType::Unknown`
/// if not present in the curated table.
pub fn tool_type(prod_id: u16) -> ToolType {
    ENTRIES
        .iter()
        .find(|e| e.prod_id == prod_id)
        .map(|e| e.tool)
        .unwrap_or(ToolType::Unknown)
}
