//! The resource directory tree loader (§4.5): recursive descent over
//! the on-disk `image_resource_directory` layout with cycle detection
//! and best-effort recovery from structural faults.

use std::collections::HashSet;

use crate::address_map::AddressMap;
use crate::buffer::{Buffer, RefBuffer};
use crate::config::LoaderOptions;
use crate::error::{PeError, Result};
use crate::error_list::ErrorList;
use crate::logging;
use crate::packed::{PackedLayout, PackedStruct};
use crate::packed_struct;

use super::entry::{NameOrId, Payload, ResourceDataEntry, ResourceDirectoryEntry};

packed_struct! {
    pub struct ResourceDirectoryRaw {
        pub characteristics: u32,
        pub time_date_stamp: u32,
        pub major_version: u16,
        pub minor_version: u16,
        pub number_of_named_entries: u16,
        pub number_of_id_entries: u16,
    }
}

packed_struct! {
    pub struct ResourceDirectoryEntryRaw {
        pub name_or_id: u32,
        pub offset_to_data_or_directory: u32,
    }
}

packed_struct! {
    pub struct ResourceDataEntryRaw {
        pub offset_to_data: u32,
        pub size: u32,
        pub code_page: u32,
        pub reserved: u32,
    }
}

const ENTRY_SIZE: u64 = 8;
const HIGH_BIT: u32 = 0x8000_0000;

/// Everything the loader needs to resolve offsets within the resource
/// tree (relative to `directory_buffer`, the `.rsrc` section's own
/// view) and to resolve a data entry's absolute RVA against the rest
/// of the image.
pub struct ResourceLoaderContext<'a> {
    pub directory_buffer: &'a Buffer,
    pub address_map: &'a AddressMap,
    pub headers: &'a Buffer,
    pub section_buffers: &'a [Buffer],
    pub options: &'a LoaderOptions,
}

/// One level of the resource tree.
#[derive(Debug, Clone)]
pub struct ResourceDirectory {
    pub characteristics: u32,
    pub time_date_stamp: u32,
    pub major_version: u16,
    pub minor_version: u16,
    entries: Vec<ResourceDirectoryEntry>,
    errors: ErrorList,
}

impl ResourceDirectory {
    /// Loads the whole tree starting at offset 0 of `ctx.directory_buffer`.
    ///
    /// The root level enumerates resource *types*, which the format always
    /// keys by numeric id; a named top-level entry is recorded but not
    /// dropped.
    pub fn load(ctx: &ResourceLoaderContext) -> Self {
        let mut visited = HashSet::new();
        visited.insert(0u32);
        let mut root = Self::load_at(ctx, 0, &mut visited);
        if root.entries.iter().any(|e| e.id().is_none()) {
            root.errors.add_error(PeError::EntryDoesNotHaveId);
        }
        root
    }

    fn load_at(ctx: &ResourceLoaderContext, dir_offset: u32, visited: &mut HashSet<u32>) -> Self {
        let _span = logging::resource_directory(dir_offset).entered();
        let mut errors = ErrorList::new();

        let descriptor = match PackedStruct::<ResourceDirectoryRaw>::deserialize(
            ctx.directory_buffer,
            dir_offset as u64,
            ctx.options.allow_virtual_data,
        ) {
            Ok(d) => d,
            Err(_) => {
                errors.add_error(PeError::InvalidResourceDirectory);
                return Self {
                    characteristics: 0,
                    time_date_stamp: 0,
                    major_version: 0,
                    minor_version: 0,
                    entries: Vec::new(),
                    errors,
                };
            }
        };
        let raw = *descriptor.get();

        let total_declared = raw.number_of_named_entries as u64 + raw.number_of_id_entries as u64;
        let entries_start = dir_offset as u64 + ResourceDirectoryRaw::packed_size() as u64;
        let directory_total = ctx.directory_buffer.total_size();
        let region_remaining = directory_total.saturating_sub(entries_start);
        let fits = region_remaining / ENTRY_SIZE;
        if total_declared * ENTRY_SIZE > region_remaining {
            errors.add_error(PeError::InvalidNumberOfNamedAndIdEntries);
        }
        let usable_count = total_declared.min(fits);

        let mut entries = Vec::with_capacity(usable_count as usize);
        let mut out_of_bounds = false;
        for i in 0..usable_count {
            let entry_pos = entries_start + i * ENTRY_SIZE;
            let entry_raw = match PackedStruct::<ResourceDirectoryEntryRaw>::deserialize(
                ctx.directory_buffer,
                entry_pos,
                ctx.options.allow_virtual_data,
            ) {
                Ok(r) => *r.get(),
                Err(_) => {
                    errors.add_error(PeError::InvalidResourceDirectoryEntry);
                    break;
                }
            };

            let name_or_id = if entry_raw.name_or_id & HIGH_BIT != 0 {
                let name_offset = (entry_raw.name_or_id & !HIGH_BIT) as u64;
                match Self::read_utf16_name(ctx, name_offset, directory_total) {
                    Ok(name) => NameOrId::Name(name),
                    Err(kind) => {
                        errors.add_error(kind);
                        out_of_bounds = true;
                        NameOrId::Name(String::new())
                    }
                }
            } else {
                NameOrId::Id(entry_raw.name_or_id)
            };

            let data_field = entry_raw.offset_to_data_or_directory;
            let payload = if data_field & HIGH_BIT != 0 {
                let sub_offset = data_field & !HIGH_BIT;
                if sub_offset as u64 + ResourceDirectoryRaw::packed_size() as u64 > directory_total {
                    out_of_bounds = true;
                }
                if visited.contains(&sub_offset) {
                    Payload::Cycle(sub_offset)
                } else {
                    visited.insert(sub_offset);
                    Payload::Directory(Box::new(Self::load_at(ctx, sub_offset, visited)))
                }
            } else {
                match Self::load_data_entry(ctx, data_field, directory_total) {
                    Ok(data) => Payload::Data(data),
                    Err(kind) => {
                        errors.add_error(kind);
                        out_of_bounds = true;
                        continue;
                    }
                }
            };

            entries.push(ResourceDirectoryEntry { name_or_id, payload });
        }

        if out_of_bounds {
            errors.add_error(PeError::EntriesPointOutsideDirectory);
        }
        if !Self::is_sorted(&entries) {
            errors.add_error(PeError::UnsortedEntries);
        }

        Self {
            characteristics: raw.characteristics,
            time_date_stamp: raw.time_date_stamp,
            major_version: raw.major_version,
            minor_version: raw.minor_version,
            entries,
            errors,
        }
    }

    /// Reads the length-prefixed UTF-16 name at `offset`. Distinguishes a
    /// name whose declared extent overflows the directory
    /// (`InvalidDirectorySize`) from one that reads cleanly but decodes to
    /// an unpaired surrogate (`InvalidResourceDirectoryEntryName`); a
    /// truncated length prefix or code-unit read falls back to
    /// `EntryDoesNotHaveName`, since there's nothing there to size-check
    /// or decode in the first place.
    fn read_utf16_name(
        ctx: &ResourceLoaderContext,
        offset: u64,
        directory_total: u64,
    ) -> std::result::Result<String, PeError> {
        let mut len_bytes = [0u8; 2];
        ctx.directory_buffer
            .read(offset, &mut len_bytes)
            .map_err(|_| PeError::EntryDoesNotHaveName)?;
        let len = u16::from_le_bytes(len_bytes) as u64;
        if offset + 2 + len * 2 > directory_total {
            return Err(PeError::InvalidDirectorySize);
        }
        let mut units = vec![0u16; len as usize];
        for (i, unit) in units.iter_mut().enumerate() {
            let mut b = [0u8; 2];
            ctx.directory_buffer
                .read(offset + 2 + i as u64 * 2, &mut b)
                .map_err(|_| PeError::EntryDoesNotHaveName)?;
            *unit = u16::from_le_bytes(b);
        }
        String::from_utf16(&units).map_err(|_| PeError::InvalidResourceDirectoryEntryName)
    }

    /// Resolves the data-entry descriptor at `offset`. A descriptor whose
    /// declared span overflows the directory is `InvalidDirectorySize`;
    /// anything else that keeps it from becoming a usable leaf is
    /// `InvalidResourceDirectoryEntry`.
    fn load_data_entry(
        ctx: &ResourceLoaderContext,
        offset: u32,
        directory_total: u64,
    ) -> std::result::Result<ResourceDataEntry, PeError> {
        if offset as u64 + ResourceDataEntryRaw::packed_size() as u64 > directory_total {
            return Err(PeError::InvalidDirectorySize);
        }
        let raw = PackedStruct::<ResourceDataEntryRaw>::deserialize(
            ctx.directory_buffer,
            offset as u64,
            ctx.options.allow_virtual_data,
        )
        .map_err(|_| PeError::InvalidResourceDirectoryEntry)?;
        let fields = *raw.get();
        let slice = ctx
            .address_map
            .rva_to_buffer(fields.offset_to_data, fields.size, ctx.headers, ctx.section_buffers)
            .map_err(|_| PeError::InvalidResourceDirectoryEntry)?;
        let data = if ctx.options.copy_raw_data {
            let mut bytes = vec![0u8; slice.size() as usize];
            slice
                .read(0, &mut bytes)
                .map_err(|_| PeError::InvalidResourceDirectoryEntry)?;
            RefBuffer::owned(bytes, slice.absolute_offset())
        } else {
            RefBuffer::referenced(slice)
        };
        Ok(ResourceDataEntry {
            code_page: fields.code_page,
            reserved: fields.reserved,
            data,
        })
    }

    /// Named entries must precede id entries, and each class must be
    /// ascending within itself.
    fn is_sorted(entries: &[ResourceDirectoryEntry]) -> bool {
        let mut seen_id = false;
        let mut last_name: Option<&str> = None;
        let mut last_id: Option<u32> = None;
        for entry in entries {
            match &entry.name_or_id {
                NameOrId::Name(name) => {
                    if seen_id {
                        return false;
                    }
                    if let Some(prev) = last_name {
                        if name.as_str() < prev {
                            return false;
                        }
                    }
                    last_name = Some(name);
                }
                NameOrId::Id(id) => {
                    seen_id = true;
                    if let Some(prev) = last_id {
                        if *id < prev {
                            return false;
                        }
                    }
                    last_id = Some(*id);
                }
            }
        }
        true
    }

    pub fn entries(&self) -> &[ResourceDirectoryEntry] {
        &self.entries
    }

    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorList {
        &mut self.errors
    }

    fn entry_iter_by_id(&self, id: u32) -> Option<&ResourceDirectoryEntry> {
        self.entries.iter().find(|e| e.id() == Some(id))
    }

    fn entry_iter_by_name(&self, name: &str) -> Option<&ResourceDirectoryEntry> {
        self.entries.iter().find(|e| e.name() == Some(name))
    }

    pub fn entry_by_id(&self, id: u32) -> Result<&ResourceDirectoryEntry> {
        self.entry_iter_by_id(id).ok_or(PeError::EntryDoesNotExist)
    }

    pub fn entry_by_name(&self, name: &str) -> Result<&ResourceDirectoryEntry> {
        self.entry_iter_by_name(name).ok_or(PeError::EntryDoesNotExist)
    }

    pub fn try_entry_by_id(&self, id: u32) -> Option<&ResourceDirectoryEntry> {
        self.entry_iter_by_id(id)
    }

    pub fn try_entry_by_name(&self, name: &str) -> Option<&ResourceDirectoryEntry> {
        self.entry_iter_by_name(name)
    }

    /// Returns the entry keyed by `id`, inserting an empty subdirectory
    /// entry first if none exists. Fails if an existing entry under that
    /// id carries a leaf data payload instead.
    pub fn try_emplace_entry_by_id(&mut self, id: u32) -> Result<&mut ResourceDirectoryEntry> {
        if let Some(pos) = self.entries.iter().position(|e| e.id() == Some(id)) {
            if !self.entries[pos].has_directory() {
                return Err(PeError::EntryDoesNotContainDirectory);
            }
            return Ok(&mut self.entries[pos]);
        }
        self.entries.push(ResourceDirectoryEntry {
            name_or_id: NameOrId::Id(id),
            payload: Payload::Directory(Box::new(Self::empty())),
        });
        Ok(self.entries.last_mut().expect("just pushed"))
    }

    /// As [`Self::try_emplace_entry_by_id`], keyed by name.
    pub fn try_emplace_entry_by_name(&mut self, name: &str) -> Result<&mut ResourceDirectoryEntry> {
        if let Some(pos) = self.entries.iter().position(|e| e.name() == Some(name)) {
            if !self.entries[pos].has_directory() {
                return Err(PeError::EntryDoesNotContainDirectory);
            }
            return Ok(&mut self.entries[pos]);
        }
        self.entries.push(ResourceDirectoryEntry {
            name_or_id: NameOrId::Name(name.to_string()),
            payload: Payload::Directory(Box::new(Self::empty())),
        });
        Ok(self.entries.last_mut().expect("just pushed"))
    }

    /// Replaces (or inserts) the entry keyed by `id` with a leaf data
    /// payload. Fails if an existing entry under that id is itself a
    /// subdirectory.
    pub fn try_emplace_data_by_id(&mut self, id: u32, data: ResourceDataEntry) -> Result<()> {
        if let Some(pos) = self.entries.iter().position(|e| e.id() == Some(id)) {
            if self.entries[pos].has_directory() {
                return Err(PeError::EntryDoesNotContainData);
            }
            self.entries[pos].payload = Payload::Data(data);
            return Ok(());
        }
        self.entries.push(ResourceDirectoryEntry {
            name_or_id: NameOrId::Id(id),
            payload: Payload::Data(data),
        });
        Ok(())
    }

    /// An entry-less directory, used as the recovery value when the
    /// directory descriptor itself cannot be resolved to a buffer at all
    /// (resource RVA falling in the headers region with `include_headers`
    /// disabled: recorded, not fatal).
    pub(crate) fn empty() -> Self {
        Self {
            characteristics: 0,
            time_date_stamp: 0,
            major_version: 0,
            minor_version: 0,
            entries: Vec::new(),
            errors: ErrorList::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ContainerBuffer;

    fn empty_map() -> AddressMap {
        AddressMap::new(Vec::new(), 0x200, 0x400, true)
    }

    fn directory_only_bytes() -> Vec<u8> {
        // One directory, no entries.
        vec![0u8; 16]
    }

    #[test]
    fn empty_directory_has_no_entries() {
        let dir_buf = Buffer::Container(ContainerBuffer::new(directory_only_bytes(), 0));
        let headers = Buffer::Container(ContainerBuffer::new(vec![0u8; 4], 0));
        let options = LoaderOptions::default();
        let map = empty_map();
        let ctx = ResourceLoaderContext {
            directory_buffer: &dir_buf,
            address_map: &map,
            headers: &headers,
            section_buffers: &[],
            options: &options,
        };
        let dir = ResourceDirectory::load(&ctx);
        assert!(dir.entries().is_empty());
        assert!(!dir.errors().has_errors());
    }

    #[test]
    fn truncated_descriptor_is_recorded_not_fatal() {
        let dir_buf = Buffer::Container(ContainerBuffer::new(vec![0u8; 4], 0));
        let headers = Buffer::Container(ContainerBuffer::new(vec![0u8; 4], 0));
        let options = LoaderOptions::default();
        let map = empty_map();
        let ctx = ResourceLoaderContext {
            directory_buffer: &dir_buf,
            address_map: &map,
            headers: &headers,
            section_buffers: &[],
            options: &options,
        };
        let dir = ResourceDirectory::load(&ctx);
        assert!(dir.errors().has_errors());
        assert!(dir.entries().is_empty());
    }

    #[test]
    fn self_referencing_subdirectory_is_a_cycle_marker() {
        // Directory descriptor (16 bytes) + one id entry pointing back at
        // offset 0 as a subdirectory.
        let mut bytes = vec![0u8; 16 + 8];
        bytes[6..8].copy_from_slice(&1u16.to_le_bytes()); // number_of_id_entries
        let entry_offset = 16u32;
        bytes[entry_offset as usize..entry_offset as usize + 4]
            .copy_from_slice(&7u32.to_le_bytes()); // id = 7
        let sub_offset_field = 0x8000_0000u32; // subdirectory at offset 0 (root)
        bytes[entry_offset as usize + 4..entry_offset as usize + 8]
            .copy_from_slice(&sub_offset_field.to_le_bytes());

        let dir_buf = Buffer::Container(ContainerBuffer::new(bytes, 0));
        let headers = Buffer::Container(ContainerBuffer::new(vec![0u8; 4], 0));
        let options = LoaderOptions::default();
        let map = empty_map();
        let ctx = ResourceLoaderContext {
            directory_buffer: &dir_buf,
            address_map: &map,
            headers: &headers,
            section_buffers: &[],
            options: &options,
        };
        let dir = ResourceDirectory::load(&ctx);
        assert_eq!(dir.entries().len(), 1);
        assert!(matches!(dir.entries()[0].payload, Payload::Cycle(0)));
    }

    #[test]
    fn named_top_level_entry_is_recorded_as_missing_an_id() {
        // Root descriptor (16) + one named entry (8) + its name ("A", 4
        // bytes) + an empty subdirectory (16).
        let mut bytes = vec![0u8; 44];
        bytes[6..8].copy_from_slice(&1u16.to_le_bytes()); // number_of_named_entries
        bytes[16..20].copy_from_slice(&(HIGH_BIT | 24).to_le_bytes());
        bytes[20..24].copy_from_slice(&(HIGH_BIT | 28).to_le_bytes());
        bytes[24..26].copy_from_slice(&1u16.to_le_bytes()); // name length
        bytes[26..28].copy_from_slice(&0x0041u16.to_le_bytes()); // 'A'

        let dir_buf = Buffer::Container(ContainerBuffer::new(bytes, 0));
        let headers = Buffer::Container(ContainerBuffer::new(vec![0u8; 4], 0));
        let options = LoaderOptions::default();
        let map = empty_map();
        let ctx = ResourceLoaderContext {
            directory_buffer: &dir_buf,
            address_map: &map,
            headers: &headers,
            section_buffers: &[],
            options: &options,
        };
        let dir = ResourceDirectory::load(&ctx);
        assert_eq!(dir.entries()[0].name(), Some("A"));
        assert!(dir
            .errors()
            .get_errors()
            .any(|e| e.kind == PeError::EntryDoesNotHaveId));
    }

    #[test]
    fn name_length_overflowing_the_directory_is_invalid_directory_size() {
        let mut bytes = vec![0u8; 26];
        bytes[6..8].copy_from_slice(&1u16.to_le_bytes());
        bytes[16..20].copy_from_slice(&(HIGH_BIT | 24).to_le_bytes());
        bytes[20..24].copy_from_slice(&(HIGH_BIT).to_le_bytes()); // cycle to root
        bytes[24..26].copy_from_slice(&100u16.to_le_bytes()); // declared length way past the buffer

        let dir_buf = Buffer::Container(ContainerBuffer::new(bytes, 0));
        let headers = Buffer::Container(ContainerBuffer::new(vec![0u8; 4], 0));
        let options = LoaderOptions::default();
        let map = empty_map();
        let ctx = ResourceLoaderContext {
            directory_buffer: &dir_buf,
            address_map: &map,
            headers: &headers,
            section_buffers: &[],
            options: &options,
        };
        let dir = ResourceDirectory::load(&ctx);
        assert!(dir
            .errors()
            .get_errors()
            .any(|e| e.kind == PeError::InvalidDirectorySize));
    }

    #[test]
    fn unpaired_surrogate_is_invalid_entry_name() {
        let mut bytes = vec![0u8; 28];
        bytes[6..8].copy_from_slice(&1u16.to_le_bytes());
        bytes[16..20].copy_from_slice(&(HIGH_BIT | 24).to_le_bytes());
        bytes[20..24].copy_from_slice(&(HIGH_BIT).to_le_bytes()); // cycle to root
        bytes[24..26].copy_from_slice(&1u16.to_le_bytes());
        bytes[26..28].copy_from_slice(&0xD800u16.to_le_bytes()); // lone high surrogate

        let dir_buf = Buffer::Container(ContainerBuffer::new(bytes, 0));
        let headers = Buffer::Container(ContainerBuffer::new(vec![0u8; 4], 0));
        let options = LoaderOptions::default();
        let map = empty_map();
        let ctx = ResourceLoaderContext {
            directory_buffer: &dir_buf,
            address_map: &map,
            headers: &headers,
            section_buffers: &[],
            options: &options,
        };
        let dir = ResourceDirectory::load(&ctx);
        assert!(dir
            .errors()
            .get_errors()
            .any(|e| e.kind == PeError::InvalidResourceDirectoryEntryName));
    }
}
