//! In-place mutation of a loaded resource tree: the `try_emplace_*`
//! chains from `type -> id/name -> language` down to a data leaf.

use crate::buffer::RefBuffer;
use crate::error::Result;

use super::directory::ResourceDirectory;
use super::entry::ResourceDataEntry;
use super::reader::ResourceType;

/// Creates (or reuses) the `type -> id -> language` subdirectory chain
/// and installs `data` at the language leaf, replacing whatever was
/// there before.
pub fn try_emplace_resource_data_by_id(
    root: &mut ResourceDirectory,
    ty: ResourceType,
    id: u32,
    language: u32,
    code_page: u32,
    data: RefBuffer,
) -> Result<()> {
    let type_dir = root.try_emplace_entry_by_id(ty as u32)?.get_directory_mut()?;
    let id_dir = type_dir.try_emplace_entry_by_id(id)?.get_directory_mut()?;
    id_dir.try_emplace_data_by_id(
        language,
        ResourceDataEntry {
            code_page,
            reserved: 0,
            data,
        },
    )
}

/// As [`try_emplace_resource_data_by_id`], keyed by name at the second
/// level instead of id.
pub fn try_emplace_resource_data_by_name(
    root: &mut ResourceDirectory,
    ty: ResourceType,
    name: &str,
    language: u32,
    code_page: u32,
    data: RefBuffer,
) -> Result<()> {
    let type_dir = root.try_emplace_entry_by_id(ty as u32)?.get_directory_mut()?;
    let name_dir = type_dir.try_emplace_entry_by_name(name)?.get_directory_mut()?;
    name_dir.try_emplace_data_by_id(
        language,
        ResourceDataEntry {
            code_page,
            reserved: 0,
            data,
        },
    )
}
