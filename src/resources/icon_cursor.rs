//! Icon and cursor resource group reader and `.ico`/`.cur` file-format
//! writer, built on the directory engine's navigation helpers.
//!
//! On-disk, an icon or cursor group directory entry points at a small
//! group descriptor (not the image data itself): a header followed by
//! one fixed-size record per image, each carrying the resource id of
//! the actual `RT_ICON`/`RT_CURSOR` leaf. `to_file_format` repackages
//! that indirection into the flat layout Windows `.ico`/`.cur` files use.

use crate::buffer::RefBuffer;
use crate::error::{PeError, Result};
use crate::packed::PackedLayout;
use crate::packed_struct;

use super::directory::ResourceDirectory;
use super::reader::{get_resource_data_by_id_at_language_index, ResourceType};

pub const ICON_TYPE: u16 = 1;
pub const CURSOR_TYPE: u16 = 2;

packed_struct! {
    pub struct GroupHeaderRaw {
        pub reserved: u16,
        pub group_type: u16,
        pub count: u16,
    }
}

packed_struct! {
    pub struct IconGroupEntryRaw {
        pub width: u8,
        pub height: u8,
        pub color_count: u8,
        pub reserved: u8,
        pub planes: u16,
        pub bit_count: u16,
        pub size_in_bytes: u32,
        pub number: u16,
    }
}

packed_struct! {
    pub struct CursorGroupEntryRaw {
        pub width: u16,
        pub height: u16,
        pub planes: u16,
        pub bit_count: u16,
        pub size_in_bytes: u32,
        pub number: u16,
    }
}

/// A loaded icon group: the group header plus one entry/data pair per
/// image, fetched from the sibling `RT_ICON` directory.
pub struct IconGroup {
    pub entries: Vec<IconGroupEntryRaw>,
    pub data: Vec<RefBuffer>,
}

/// As [`IconGroup`], for `RT_CURSOR_GROUP`/`RT_CURSOR`. Each `data`
/// buffer still carries its 4-byte `{hotspot_x, hotspot_y}` prefix.
pub struct CursorGroup {
    pub entries: Vec<CursorGroupEntryRaw>,
    pub data: Vec<RefBuffer>,
}

fn read_group_header(descriptor: &RefBuffer) -> Result<(u16, u16)> {
    let mut bytes = vec![0u8; GroupHeaderRaw::packed_size()];
    descriptor.read(0, &mut bytes)?;
    let header = GroupHeaderRaw::read_fields(&bytes);
    Ok((header.group_type, header.count))
}

pub fn icon_group_from_resource(
    root: &ResourceDirectory,
    language_index: usize,
    icon_group_id: u32,
) -> Result<IconGroup> {
    let descriptor = get_resource_data_by_id_at_language_index(
        root,
        ResourceType::IconGroup,
        icon_group_id,
        language_index,
    )?;
    let (group_type, count) = read_group_header(descriptor)?;
    if group_type != ICON_TYPE {
        return Err(PeError::InvalidResourceDirectoryEntry);
    }

    let entry_size = IconGroupEntryRaw::packed_size();
    let mut entries = Vec::with_capacity(count as usize);
    let mut data = Vec::with_capacity(count as usize);
    for i in 0..count as u64 {
        let pos = GroupHeaderRaw::packed_size() as u64 + i * entry_size as u64;
        let mut bytes = vec![0u8; entry_size];
        descriptor.read(pos, &mut bytes)?;
        let entry = IconGroupEntryRaw::read_fields(&bytes);
        let image = get_resource_data_by_id_at_language_index(
            root,
            ResourceType::Icon,
            entry.number as u32,
            language_index,
        )?;
        entries.push(entry);
        data.push(image.clone());
    }

    Ok(IconGroup { entries, data })
}

pub fn cursor_group_from_resource(
    root: &ResourceDirectory,
    language_index: usize,
    cursor_group_id: u32,
) -> Result<CursorGroup> {
    let descriptor = get_resource_data_by_id_at_language_index(
        root,
        ResourceType::CursorGroup,
        cursor_group_id,
        language_index,
    )?;
    let (group_type, count) = read_group_header(descriptor)?;
    if group_type != CURSOR_TYPE {
        return Err(PeError::InvalidResourceDirectoryEntry);
    }

    let entry_size = CursorGroupEntryRaw::packed_size();
    let mut entries = Vec::with_capacity(count as usize);
    let mut data = Vec::with_capacity(count as usize);
    for i in 0..count as u64 {
        let pos = GroupHeaderRaw::packed_size() as u64 + i * entry_size as u64;
        let mut bytes = vec![0u8; entry_size];
        descriptor.read(pos, &mut bytes)?;
        let entry = CursorGroupEntryRaw::read_fields(&bytes);
        let image = get_resource_data_by_id_at_language_index(
            root,
            ResourceType::Cursor,
            entry.number as u32,
            language_index,
        )?;
        entries.push(entry);
        data.push(image.clone());
    }

    Ok(CursorGroup { entries, data })
}

/// Packs an [`IconGroup`] into the bytes of a standalone `.ico` file.
pub fn icon_to_file_format(group: &IconGroup) -> Result<Vec<u8>> {
    if group.entries.len() != group.data.len() {
        return Err(PeError::DifferentNumberOfHeadersAndData);
    }

    let header_size = 6usize;
    let dir_entry_size = 16usize;
    let mut image_offset = header_size + dir_entry_size * group.entries.len();
    let mut dir_entries = Vec::with_capacity(group.entries.len());
    let mut images = Vec::with_capacity(group.entries.len());
    for (entry, data) in group.entries.iter().zip(&group.data) {
        let bytes = data.to_vec()?;
        dir_entries.push((
            entry.width,
            entry.height,
            entry.color_count,
            entry.reserved,
            entry.planes,
            entry.bit_count,
            bytes.len() as u32,
            image_offset as u32,
        ));
        image_offset += bytes.len();
        images.push(bytes);
    }

    let mut out = Vec::with_capacity(image_offset);
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&ICON_TYPE.to_le_bytes());
    out.extend_from_slice(&(group.entries.len() as u16).to_le_bytes());
    for (w, h, cc, r, planes, bc, size, off) in &dir_entries {
        out.push(*w);
        out.push(*h);
        out.push(*cc);
        out.push(*r);
        out.extend_from_slice(&planes.to_le_bytes());
        out.extend_from_slice(&bc.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&off.to_le_bytes());
    }
    for image in images {
        out.extend_from_slice(&image);
    }
    Ok(out)
}

/// Packs a [`CursorGroup`] into the bytes of a standalone `.cur` file.
/// Strips each image's 4-byte hotspot prefix, lifts it into the
/// directory entry, and halves the group-recorded height (group headers
/// store the mask-doubled height).
pub fn cursor_to_file_format(group: &CursorGroup) -> Result<Vec<u8>> {
    if group.entries.len() != group.data.len() {
        return Err(PeError::DifferentNumberOfHeadersAndData);
    }

    let header_size = 6usize;
    let dir_entry_size = 16usize;
    let mut image_offset = header_size + dir_entry_size * group.entries.len();
    let mut dir_entries = Vec::with_capacity(group.entries.len());
    let mut images = Vec::with_capacity(group.entries.len());
    for (entry, data) in group.entries.iter().zip(&group.data) {
        let raw = data.to_vec()?;
        if raw.len() < 4 {
            return Err(PeError::InvalidHotspot);
        }
        let hotspot_x = u16::from_le_bytes([raw[0], raw[1]]);
        let hotspot_y = u16::from_le_bytes([raw[2], raw[3]]);
        let image = raw[4..].to_vec();

        dir_entries.push((
            entry.width as u8,
            (entry.height / 2) as u8,
            0u8, // color_count: cursors have no palette entry here
            0u8,
            hotspot_x,
            hotspot_y,
            image.len() as u32,
            image_offset as u32,
        ));
        image_offset += image.len();
        images.push(image);
    }

    let mut out = Vec::with_capacity(image_offset);
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&CURSOR_TYPE.to_le_bytes());
    out.extend_from_slice(&(group.entries.len() as u16).to_le_bytes());
    for (w, h, cc, r, hx, hy, size, off) in &dir_entries {
        out.push(*w);
        out.push(*h);
        out.push(*cc);
        out.push(*r);
        out.extend_from_slice(&hx.to_le_bytes());
        out.extend_from_slice(&hy.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&off.to_le_bytes());
    }
    for image in images {
        out.extend_from_slice(&image);
    }
    Ok(out)
}
