//! The data-directory array: up to 16 {RVA, size} pairs indexed by a
//! fixed directory-kind order, immediately following the optional header.

use crate::buffer::Buffer;
use crate::error::Result;
use crate::packed::{PackedLayout, PackedStruct};
use crate::packed_struct;

use super::RelativeVirtualAddress;

packed_struct! {
    pub struct DataDirectoryRaw {
        pub virtual_address: u32,
        pub size: u32,
    }
}

pub const DATA_DIRECTORY_ENTRY_SIZE: u64 = 8;
pub const MAX_DATA_DIRECTORIES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum DirectoryKind {
    Export = 0,
    Import = 1,
    Resource = 2,
    Exception = 3,
    Security = 4,
    BaseReloc = 5,
    Debug = 6,
    Architecture = 7,
    GlobalPtr = 8,
    Tls = 9,
    LoadConfig = 10,
    BoundImport = 11,
    Iat = 12,
    DelayImport = 13,
    ComDescriptor = 14,
    Reserved = 15,
}

/// A single {RVA, size} directory entry. Size 0 means the directory is
/// absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataDirectory {
    pub virtual_address: RelativeVirtualAddress,
    pub size: u32,
}

impl DataDirectory {
    pub fn is_present(&self) -> bool {
        self.size != 0
    }
}

/// The full directory array, as declared by the optional header's
/// `number_of_rva_and_sizes` (capped at [`MAX_DATA_DIRECTORIES`]).
#[derive(Debug, Clone, Default)]
pub struct DataDirectories {
    entries: Vec<DataDirectory>,
}

impl DataDirectories {
    pub fn parse(buffer: &Buffer, pos: u64, count: u32) -> Result<Self> {
        let count = (count as usize).min(MAX_DATA_DIRECTORIES);
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let raw = PackedStruct::<DataDirectoryRaw>::deserialize(
                buffer,
                pos + i as u64 * DATA_DIRECTORY_ENTRY_SIZE,
                true,
            )?;
            entries.push(DataDirectory {
                virtual_address: RelativeVirtualAddress(raw.get().virtual_address),
                size: raw.get().size,
            });
        }
        Ok(Self { entries })
    }

    pub fn get(&self, kind: DirectoryKind) -> Option<DataDirectory> {
        self.entries.get(kind as usize).copied().filter(DataDirectory::is_present)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataDirectory> {
        self.entries.iter()
    }
}
