//! The image aggregate (§7): ties the header assembly, section table,
//! resource tree, and the address map together behind load/serialize.

use crate::address_map::{AddressMap, SectionSpan};
use crate::buffer::Buffer;
use crate::config::{LoaderOptions, SerializationOptions};
use crate::error::{PeError, Result};
use crate::error_list::ErrorList;
use crate::header::coff_header::CoffHeader;
use crate::header::data_directories::DirectoryKind;
use crate::header::dos_header::{DosHeader, DosHeaderValidationOptions, MZ_MAGIC_VALUE};
use crate::header::dos_stub::DosStub;
use crate::header::optional_header::OptionalHeader;
use crate::header::rich_header::RichHeader;
use crate::header::section_header::{SectionHeader, SECTION_HEADER_SIZE};
use crate::header::PE_SIGNATURE;
use crate::logging;
use crate::resources::{ResourceDirectory, ResourceLoaderContext};

const COFF_HEADER_SIZE: u64 = 20;

/// A fully-loaded PE image: the parsed header chain plus, when present
/// and requested, the resource tree. Faults that leave the image
/// fundamentally unusable surface as `Err` from [`Image::load`]; every
/// other recoverable fault lands in [`Image::errors`].
pub struct Image {
    dos_header: DosHeader,
    dos_stub: DosStub,
    rich_header: Option<RichHeader>,
    coff_header: CoffHeader,
    optional_header: OptionalHeader,
    sections: Vec<SectionHeader>,
    section_buffers: Vec<Buffer>,
    headers_buffer: Buffer,
    address_map: AddressMap,
    resources: Option<ResourceDirectory>,
    overlay: Option<Buffer>,
    full_buffer: Buffer,
    errors: ErrorList,
}

impl Image {
    /// Parses `buffer` end to end. Errors in `InvalidDosMagic`,
    /// `UnalignedELfanew`, `InvalidELfanew`, `InvalidPeSignature`,
    /// `InvalidFileHeader`, `InvalidOptionalHeader`, or
    /// `InvalidSectionTable` are image-fatal and returned here; every
    /// other structural fault is recorded on `errors()`.
    pub fn load(buffer: Buffer, options: &LoaderOptions) -> Result<Self> {
        let _span = logging::image_load().entered();
        let mut errors = ErrorList::new();

        let dos_header = DosHeader::parse(&buffer, &DosHeaderValidationOptions::strict())?;
        errors.extend(dos_header.errors());

        let dos_stub = DosStub::parse(&buffer, dos_header.e_lfanew())?;

        let rich_header = if options.load_rich_header {
            let mut stub_bytes = vec![0u8; dos_stub.data().size() as usize];
            dos_stub.data().read(0, &mut stub_bytes).ok();
            match RichHeader::decode(&stub_bytes) {
                Ok(rich) => rich,
                Err(e) => {
                    errors.add_error(e);
                    None
                }
            }
        } else {
            None
        };

        let e_lfanew = dos_header.e_lfanew() as u64;
        let mut pe_magic = [0u8; 4];
        buffer.read(e_lfanew, &mut pe_magic)?;
        if pe_magic != PE_SIGNATURE {
            return Err(PeError::InvalidPeSignature);
        }

        let coff_header = CoffHeader::parse(&buffer, e_lfanew + 4)?;
        errors.extend(coff_header.errors());

        let optional_header_pos = e_lfanew + 4 + COFF_HEADER_SIZE;
        let optional_header = OptionalHeader::parse(&buffer, optional_header_pos)?;
        errors.extend(optional_header.errors());

        let section_table_pos =
            optional_header_pos + coff_header.size_of_optional_header() as u64;
        let mut sections = Vec::with_capacity(coff_header.number_of_sections() as usize);
        for i in 0..coff_header.number_of_sections() as u64 {
            let section = SectionHeader::parse(&buffer, section_table_pos + i * SECTION_HEADER_SIZE)?;
            errors.extend(section.errors());
            sections.push(section);
        }

        let headers_buffer = buffer.slice(0, optional_header.size_of_headers() as u64)?;

        let mut section_buffers = Vec::with_capacity(sections.len());
        for section in &sections {
            let raw = buffer.slice(
                section.pointer_to_raw_data() as u64,
                section.size_of_raw_data() as u64,
            )?;
            let tail = (section.virtual_size() as u64).saturating_sub(section.size_of_raw_data() as u64);
            section_buffers.push(raw.with_virtual_tail(tail));
        }

        let spans: Vec<SectionSpan> = sections
            .iter()
            .map(|s| SectionSpan {
                virtual_address: s.virtual_address().value(),
                virtual_size: s.virtual_size(),
                raw_size: s.size_of_raw_data(),
                raw_pointer: s.pointer_to_raw_data(),
            })
            .collect();
        let address_map = AddressMap::new(
            spans,
            optional_header.file_alignment(),
            optional_header.size_of_headers(),
            options.include_headers,
        );

        let resources = if options.load_resources {
            match optional_header.data_directories().get(DirectoryKind::Resource) {
                Some(entry) => {
                    match address_map.rva_to_buffer(
                        entry.virtual_address.value(),
                        entry.size,
                        &headers_buffer,
                        &section_buffers,
                    ) {
                        Ok(dir_buffer) => {
                            let ctx = ResourceLoaderContext {
                                directory_buffer: &dir_buffer,
                                address_map: &address_map,
                                headers: &headers_buffer,
                                section_buffers: &section_buffers,
                                options,
                            };
                            let tree = ResourceDirectory::load(&ctx);
                            errors.extend(tree.errors());
                            Some(tree)
                        }
                        Err(_) => {
                            // The directory RVA could not be resolved to a
                            // buffer at all (e.g. it falls in the headers
                            // region while `include_headers` is off).
                            // Recorded, not fatal (Open Question 1).
                            let mut empty = ResourceDirectory::empty();
                            empty.errors_mut().add_error(PeError::InvalidResourceDirectory);
                            errors.add_error(PeError::InvalidResourceDirectory);
                            Some(empty)
                        }
                    }
                }
                None => None,
            }
        } else {
            None
        };

        let max_raw_end = sections
            .iter()
            .map(|s| s.pointer_to_raw_data() as u64 + s.size_of_raw_data() as u64)
            .max()
            .unwrap_or(optional_header.size_of_headers() as u64);
        let overlay = if max_raw_end < buffer.size() {
            Some(buffer.slice(max_raw_end, buffer.size() - max_raw_end)?)
        } else {
            None
        };

        Ok(Self {
            dos_header,
            dos_stub,
            rich_header,
            coff_header,
            optional_header,
            sections,
            section_buffers,
            headers_buffer,
            address_map,
            resources,
            overlay,
            full_buffer: buffer,
            errors,
        })
    }

    pub fn dos_header(&self) -> &DosHeader {
        &self.dos_header
    }

    pub fn dos_stub(&self) -> &DosStub {
        &self.dos_stub
    }

    pub fn rich_header(&self) -> Option<&RichHeader> {
        self.rich_header.as_ref()
    }

    pub fn coff_header(&self) -> &CoffHeader {
        &self.coff_header
    }

    pub fn optional_header(&self) -> &OptionalHeader {
        &self.optional_header
    }

    pub fn sections(&self) -> &[SectionHeader] {
        &self.sections
    }

    pub fn section_buffer(&self, index: usize) -> Option<&Buffer> {
        self.section_buffers.get(index)
    }

    pub fn headers_buffer(&self) -> &Buffer {
        &self.headers_buffer
    }

    pub fn address_map(&self) -> &AddressMap {
        &self.address_map
    }

    pub fn resources(&self) -> Option<&ResourceDirectory> {
        self.resources.as_ref()
    }

    pub fn resources_mut(&mut self) -> Option<&mut ResourceDirectory> {
        self.resources.as_mut()
    }

    pub fn overlay(&self) -> Option<&Buffer> {
        self.overlay.as_ref()
    }

    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }

    /// Re-emits the image bytes. Without `recalculate_rich_checksum`,
    /// this is the original bytes back exactly (resource tree and
    /// section content are serialized as loaded; only the Rich header
    /// checksum may be rewritten in place).
    pub fn serialize(&self, options: &SerializationOptions) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.full_buffer.size() as usize];
        self.full_buffer.read(0, &mut out)?;
        if options.write_virtual_part && self.full_buffer.virtual_size() > 0 {
            let mut tail = vec![0u8; self.full_buffer.virtual_size() as usize];
            self.full_buffer
                .read_virtual(self.full_buffer.size(), &mut tail)?;
            out.extend_from_slice(&tail);
        }

        if options.recalculate_rich_checksum {
            if let Some(rich) = &self.rich_header {
                self.rewrite_rich_checksum(rich, &mut out)?;
            }
        }

        Ok(out)
    }

    fn rewrite_rich_checksum(&self, rich: &RichHeader, out: &mut [u8]) -> Result<()> {
        let dos_header_start = 0usize;
        let dos_header_end = crate::header::dos_stub::DOS_HEADER_SIZE as usize;
        let mut dos_header_bytes = [0u8; 64];
        dos_header_bytes.copy_from_slice(&out[dos_header_start..dos_header_end]);

        let stub_region_start = dos_header_end;
        let dans_offset = rich.dans_offset();
        if dans_offset > out.len().saturating_sub(stub_region_start) {
            return Err(PeError::InvalidRichHeaderOffset);
        }
        let stub_prefix = out[stub_region_start..stub_region_start + dans_offset].to_vec();

        let new_checksum = RichHeader::calculate_checksum(
            &dos_header_bytes,
            &stub_prefix,
            rich.compids(),
            dans_offset,
        );
        let encoded = RichHeader::encode(rich.compids(), new_checksum, dans_offset);
        let region_start = stub_region_start + dans_offset;
        let region_end = region_start + encoded.len();
        if region_end > out.len() {
            return Err(PeError::InvalidRichHeaderOffset);
        }
        out[region_start..region_end].copy_from_slice(&encoded);
        Ok(())
    }

    /// Sanity re-check of cross-field invariants after load, useful once
    /// the resource tree or other substructures have been mutated.
    pub fn validate(&self) -> Result<()> {
        if self.optional_header.size_of_headers() as u64 > self.full_buffer.size()
            && !self.errors.has_errors()
        {
            return Err(PeError::InvalidOptionalHeader);
        }
        if self.dos_header.magic() != MZ_MAGIC_VALUE {
            return Err(PeError::InvalidDosMagic);
        }
        Ok(())
    }
}
