//! Navigation helpers over a loaded [`super::directory::ResourceDirectory`]:
//! type/name/id/language chains and a visiting iterator, mirroring the
//! original's free functions built on `entry_by_id`/`entry_by_name`.

use crate::buffer::RefBuffer;
use crate::error::{PeError, Result};

use super::directory::ResourceDirectory;
use super::entry::NameOrId;

/// The well-known top-level resource type ids (`RT_*` in the Windows SDK).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ResourceType {
    Cursor = 1,
    Bitmap = 2,
    Icon = 3,
    Menu = 4,
    Dialog = 5,
    String = 6,
    FontDir = 7,
    Font = 8,
    Accelerator = 9,
    RcData = 10,
    MessageTable = 11,
    CursorGroup = 12,
    IconGroup = 14,
    Version = 16,
    DlgInclude = 17,
    PlugPlay = 19,
    Vxd = 20,
    AniCursor = 21,
    AniIcon = 22,
    Html = 23,
    Manifest = 24,
}

fn directory_by_type(root: &ResourceDirectory, ty: ResourceType) -> Result<&ResourceDirectory> {
    root.entry_by_id(ty as u32)?.get_directory()
}

fn directory_by_name<'a>(root: &'a ResourceDirectory, name: &str) -> Result<&'a ResourceDirectory> {
    root.entry_by_name(name)?.get_directory()
}

/// `type -> id -> language` chain, returning the resource payload.
pub fn get_resource_data_by_id<'a>(
    root: &'a ResourceDirectory,
    ty: ResourceType,
    id: u32,
    language: u32,
) -> Result<&'a RefBuffer> {
    let type_dir = directory_by_type(root, ty)?;
    let id_dir = type_dir.entry_by_id(id)?.get_directory()?;
    let lang_entry = id_dir.entry_by_id(language)?;
    Ok(lang_entry.get_data()?.raw_data())
}

/// `type -> name -> language` chain, returning the resource payload.
pub fn get_resource_data_by_name<'a>(
    root: &'a ResourceDirectory,
    ty: ResourceType,
    name: &str,
    language: u32,
) -> Result<&'a RefBuffer> {
    let type_dir = directory_by_type(root, ty)?;
    let name_dir = directory_by_name(type_dir, name)?;
    let lang_entry = name_dir.entry_by_id(language)?;
    Ok(lang_entry.get_data()?.raw_data())
}

/// As [`get_resource_data_by_id`], but selects the language entry by
/// position rather than by language id — for resources that carry a
/// single, unnamed language variant.
pub fn get_resource_data_by_id_at_language_index<'a>(
    root: &'a ResourceDirectory,
    ty: ResourceType,
    id: u32,
    language_index: usize,
) -> Result<&'a RefBuffer> {
    let type_dir = directory_by_type(root, ty)?;
    let id_dir = type_dir.entry_by_id(id)?.get_directory()?;
    let entry = id_dir
        .entries()
        .get(language_index)
        .ok_or(PeError::EntryDoesNotExist)?;
    Ok(entry.get_data()?.raw_data())
}

/// Visits every `(name_or_id, language_id, data)` leaf under the given
/// top-level type. Returns `false` if the type directory doesn't exist.
pub fn for_each_resource<F>(root: &ResourceDirectory, ty: ResourceType, mut func: F) -> bool
where
    F: FnMut(&NameOrId, u32, &RefBuffer) -> bool,
{
    let Some(type_entry) = root.try_entry_by_id(ty as u32) else {
        return false;
    };
    let Ok(type_dir) = type_entry.get_directory() else {
        return false;
    };

    for name_id_entry in type_dir.entries() {
        if !name_id_entry.has_directory() {
            continue;
        }
        let Ok(lang_dir) = name_id_entry.get_directory() else {
            continue;
        };
        for lang_entry in lang_dir.entries() {
            let Some(lang_id) = lang_entry.id() else {
                continue;
            };
            let Ok(data) = lang_entry.get_data() else {
                continue;
            };
            if func(&name_id_entry.name_or_id, lang_id, data.raw_data()) {
                return true;
            }
        }
    }
    false
}

/// All top-level resource type ids present in the tree, in directory order.
pub fn list_resource_types(root: &ResourceDirectory) -> Vec<u32> {
    root.entries().iter().filter_map(|e| e.id()).collect()
}
