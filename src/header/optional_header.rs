//! The optional header (§3/§4.4): image-wide layout fields plus the
//! data-directory array. Present in two on-disk shapes, PE32 and PE32+,
//! distinguished by the leading magic value.

use crate::buffer::Buffer;
use crate::error::{PeError, Result};
use crate::error_list::ErrorList;
use crate::packed::{PackedLayout, PackedStruct};
use crate::packed_struct;

use super::data_directories::DataDirectories;
use super::dll_characteristics::DllCharacteristics;
use super::subsystem::Subsystem;
use super::RelativeVirtualAddress;

pub const IMAGE_NT_OPTIONAL_HDR32_MAGIC: u16 = 0x010B;
pub const IMAGE_NT_OPTIONAL_HDR64_MAGIC: u16 = 0x020B;
pub const IMAGE_ROM_OPTIONAL_HDR_MAGIC: u16 = 0x0107;

packed_struct! {
    pub struct OptionalHeader32Raw {
        pub magic: u16,
        pub major_linker_version: u8,
        pub minor_linker_version: u8,
        pub size_of_code: u32,
        pub size_of_initialized_data: u32,
        pub size_of_uninitialized_data: u32,
        pub address_of_entry_point: u32,
        pub base_of_code: u32,
        pub base_of_data: u32,
        pub image_base: u32,
        pub section_alignment: u32,
        pub file_alignment: u32,
        pub major_operating_system_version: u16,
        pub minor_operating_system_version: u16,
        pub major_image_version: u16,
        pub minor_image_version: u16,
        pub major_subsystem_version: u16,
        pub minor_subsystem_version: u16,
        pub win32_version_value: u32,
        pub size_of_image: u32,
        pub size_of_headers: u32,
        pub check_sum: u32,
        pub subsystem: u16,
        pub dll_characteristics: u16,
        pub size_of_stack_reserve: u32,
        pub size_of_stack_commit: u32,
        pub size_of_heap_reserve: u32,
        pub size_of_heap_commit: u32,
        pub loader_flags: u32,
        pub number_of_rva_and_sizes: u32,
    }
}

packed_struct! {
    pub struct OptionalHeader64Raw {
        pub magic: u16,
        pub major_linker_version: u8,
        pub minor_linker_version: u8,
        pub size_of_code: u32,
        pub size_of_initialized_data: u32,
        pub size_of_uninitialized_data: u32,
        pub address_of_entry_point: u32,
        pub base_of_code: u32,
        pub image_base: u64,
        pub section_alignment: u32,
        pub file_alignment: u32,
        pub major_operating_system_version: u16,
        pub minor_operating_system_version: u16,
        pub major_image_version: u16,
        pub minor_image_version: u16,
        pub major_subsystem_version: u16,
        pub minor_subsystem_version: u16,
        pub win32_version_value: u32,
        pub size_of_image: u32,
        pub size_of_headers: u32,
        pub check_sum: u32,
        pub subsystem: u16,
        pub dll_characteristics: u16,
        pub size_of_stack_reserve: u64,
        pub size_of_stack_commit: u64,
        pub size_of_heap_reserve: u64,
        pub size_of_heap_commit: u64,
        pub loader_flags: u32,
        pub number_of_rva_and_sizes: u32,
    }
}

#[derive(Debug, Clone)]
enum Raw {
    Pe32(PackedStruct<OptionalHeader32Raw>),
    Pe32Plus(PackedStruct<OptionalHeader64Raw>),
}

/// The optional header, either PE32 or PE32+ shape, plus its trailing
/// data-directory array.
#[derive(Debug, Clone)]
pub struct OptionalHeader {
    raw: Raw,
    data_directories: DataDirectories,
    errors: ErrorList,
}

impl OptionalHeader {
    pub fn parse(buffer: &Buffer, pos: u64) -> Result<Self> {
        let mut magic_bytes = [0u8; 2];
        buffer.read(pos, &mut magic_bytes)?;
        let magic = u16::from_le_bytes(magic_bytes);

        let (raw, packed_size, number_of_rva_and_sizes) = match magic {
            IMAGE_NT_OPTIONAL_HDR64_MAGIC => {
                let r = PackedStruct::<OptionalHeader64Raw>::deserialize(buffer, pos, false)?;
                if r.physical_size() < r.packed_size() {
                    return Err(PeError::InvalidOptionalHeader);
                }
                let n = r.get().number_of_rva_and_sizes;
                let size = r.packed_size() as u64;
                (Raw::Pe32Plus(r), size, n)
            }
            IMAGE_NT_OPTIONAL_HDR32_MAGIC | IMAGE_ROM_OPTIONAL_HDR_MAGIC => {
                let r = PackedStruct::<OptionalHeader32Raw>::deserialize(buffer, pos, false)?;
                if r.physical_size() < r.packed_size() {
                    return Err(PeError::InvalidOptionalHeader);
                }
                let n = r.get().number_of_rva_and_sizes;
                let size = r.packed_size() as u64;
                (Raw::Pe32(r), size, n)
            }
            _ => return Err(PeError::InvalidOptionalHeader),
        };

        let data_directories =
            DataDirectories::parse(buffer, pos + packed_size, number_of_rva_and_sizes)?;

        Ok(Self {
            raw,
            data_directories,
            errors: ErrorList::new(),
        })
    }

    pub fn is_pe32_plus(&self) -> bool {
        matches!(self.raw, Raw::Pe32Plus(_))
    }

    pub fn magic(&self) -> u16 {
        match &self.raw {
            Raw::Pe32(r) => r.get().magic,
            Raw::Pe32Plus(r) => r.get().magic,
        }
    }

    pub fn address_of_entry_point(&self) -> RelativeVirtualAddress {
        let v = match &self.raw {
            Raw::Pe32(r) => r.get().address_of_entry_point,
            Raw::Pe32Plus(r) => r.get().address_of_entry_point,
        };
        RelativeVirtualAddress(v)
    }

    pub fn image_base(&self) -> u64 {
        match &self.raw {
            Raw::Pe32(r) => r.get().image_base as u64,
            Raw::Pe32Plus(r) => r.get().image_base,
        }
    }

    pub fn section_alignment(&self) -> u32 {
        match &self.raw {
            Raw::Pe32(r) => r.get().section_alignment,
            Raw::Pe32Plus(r) => r.get().section_alignment,
        }
    }

    pub fn file_alignment(&self) -> u32 {
        match &self.raw {
            Raw::Pe32(r) => r.get().file_alignment,
            Raw::Pe32Plus(r) => r.get().file_alignment,
        }
    }

    pub fn size_of_image(&self) -> u32 {
        match &self.raw {
            Raw::Pe32(r) => r.get().size_of_image,
            Raw::Pe32Plus(r) => r.get().size_of_image,
        }
    }

    pub fn size_of_headers(&self) -> u32 {
        match &self.raw {
            Raw::Pe32(r) => r.get().size_of_headers,
            Raw::Pe32Plus(r) => r.get().size_of_headers,
        }
    }

    pub fn subsystem(&self) -> Subsystem {
        let v = match &self.raw {
            Raw::Pe32(r) => r.get().subsystem,
            Raw::Pe32Plus(r) => r.get().subsystem,
        };
        Subsystem::from(v)
    }

    pub fn dll_characteristics(&self) -> DllCharacteristics {
        let v = match &self.raw {
            Raw::Pe32(r) => r.get().dll_characteristics,
            Raw::Pe32Plus(r) => r.get().dll_characteristics,
        };
        DllCharacteristics::from(v)
    }

    pub fn number_of_rva_and_sizes(&self) -> u32 {
        match &self.raw {
            Raw::Pe32(r) => r.get().number_of_rva_and_sizes,
            Raw::Pe32Plus(r) => r.get().number_of_rva_and_sizes,
        }
    }

    pub fn data_directories(&self) -> &DataDirectories {
        &self.data_directories
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

    fn sample_pe32_bytes() -> Vec<u8> {
        let mut b = vec![0u8; 96 + 16 * 8];
        b[0..2].copy_from_slice(&IMAGE_NT_OPTIONAL_HDR32_MAGIC.to_le_bytes());
        b[16..20].copy_from_slice(&0x1000u32.to_le_bytes()); // address_of_entry_point
        b[28..32].copy_from_slice(&0x0040_0000u32.to_le_bytes()); // image_base
        b[32..36].copy_from_slice(&0x1000u32.to_le_bytes()); // section_alignment
        b[36..40].copy_from_slice(&0x200u32.to_le_bytes()); // file_alignment
        b[68..70].copy_from_slice(&2u16.to_le_bytes()); // subsystem
        b[92..96].copy_from_slice(&2u32.to_le_bytes()); // number_of_rva_and_sizes
        b
    }

    #[test]
    fn parses_pe32_shape() {
        let buf = Buffer::Container(ContainerBuffer::new(sample_pe32_bytes(), 0));
        let oh = OptionalHeader::parse(&buf, 0).unwrap();
        assert!(!oh.is_pe32_plus());
        assert_eq!(oh.image_base(), 0x0040_0000);
        assert_eq!(oh.section_alignment(), 0x1000);
        assert_eq!(oh.data_directories().len(), 2);
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = vec![0xffu8; 96];
        let buf = Buffer::Container(ContainerBuffer::new(bytes, 0));
        assert!(OptionalHeader::parse(&buf, 0).is_err());
    }
}
