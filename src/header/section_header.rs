//! Section table entries (§4.3/§6): 40-byte descriptors immediately
//! following the optional header and data directories.

use crate::buffer::Buffer;
use crate::error::{PeError, Result};
use crate::error_list::ErrorList;
use crate::packed::{PackedLayout, PackedStruct};
use crate::packed_struct;

use super::section_flags::SectionFlags;
use super::RelativeVirtualAddress;

packed_struct! {
    pub struct SectionHeaderRaw {
        pub name: [u8; 8],
        pub virtual_size: u32,
        pub virtual_address: u32,
        pub size_of_raw_data: u32,
        pub pointer_to_raw_data: u32,
        pub pointer_to_relocations: u32,
        pub pointer_to_linenumbers: u32,
        pub number_of_relocations: u16,
        pub number_of_linenumbers: u16,
        pub characteristics: u32,
    }
}

pub const SECTION_HEADER_SIZE: u64 = 40;

/// A section table entry. The section's raw bytes live in a sibling
/// ref-buffer managed by the owning image, not here.
#[derive(Debug, Clone)]
pub struct SectionHeader {
    raw: PackedStruct<SectionHeaderRaw>,
    errors: ErrorList,
}

impl SectionHeader {
    pub fn parse(buffer: &Buffer, pos: u64) -> Result<Self> {
        let raw = PackedStruct::<SectionHeaderRaw>::deserialize(buffer, pos, false)?;
        if raw.physical_size() < raw.packed_size() {
            return Err(PeError::InvalidSectionTable);
        }
        Ok(Self {
            raw,
            errors: ErrorList::new(),
        })
    }

    /// The section name, trimmed at the first NUL; names longer than 8
    /// bytes (a `/<offset>` string-table reference) are returned as-is,
    /// un-decoded, per the Non-goal on COFF string tables in images.
    pub fn name(&self) -> String {
        let raw = &self.raw.get().name;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }

    pub fn virtual_size(&self) -> u32 {
        self.raw.get().virtual_size
    }

    pub fn virtual_address(&self) -> RelativeVirtualAddress {
        RelativeVirtualAddress(self.raw.get().virtual_address)
    }

    pub fn size_of_raw_data(&self) -> u32 {
        self.raw.get().size_of_raw_data
    }

    pub fn pointer_to_raw_data(&self) -> u32 {
        self.raw.get().pointer_to_raw_data
    }

    pub fn characteristics(&self) -> SectionFlags {
        SectionFlags::from_bits_truncate(self.raw.get().characteristics)
    }

    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorList {
        &mut self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ContainerBuffer;

    fn sample_bytes() -> Vec<u8> {
        let mut b = vec![0u8; 40];
        b[0..5].copy_from_slice(b".text");
        b[8..12].copy_from_slice(&0x1000u32.to_le_bytes());
        b[12..16].copy_from_slice(&0x2000u32.to_le_bytes());
        b[36..40].copy_from_slice(&(SectionFlags::MEM_EXECUTE | SectionFlags::MEM_READ).bits().to_le_bytes());
        b
    }

    #[test]
    fn parses_name_and_flags() {
        let buf = Buffer::Container(ContainerBuffer::new(sample_bytes(), 0));
        let header = SectionHeader::parse(&buf, 0).unwrap();
        assert_eq!(header.name(), ".text");
        assert_eq!(header.virtual_size(), 0x1000);
        assert_eq!(header.virtual_address().value(), 0x2000);
        assert!(header.characteristics().contains(SectionFlags::MEM_EXECUTE));
    }
}
