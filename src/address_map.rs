//! Bidirectional RVA / file-offset / section-local-offset translation
//! (§4.3), driven by the section table.

use crate::buffer::Buffer;
use crate::error::{PeError, Result};

fn align_up(value: u32, alignment: u32) -> u32 {
    if alignment == 0 {
        return value;
    }
    let rem = value % alignment;
    if rem == 0 {
        value
    } else {
        value + (alignment - rem)
    }
}

/// The handful of section-table fields the address map needs, decoupled
/// from the concrete `SectionHeader` packed type so this module has no
/// dependency on header assembly.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpan {
    pub virtual_address: u32,
    pub virtual_size: u32,
    pub raw_size: u32,
    pub raw_pointer: u32,
}

impl SectionSpan {
    /// The RVA range this section covers: `[virtual_address,
    /// virtual_address + max(virtual_size, align_up(raw_size,
    /// file_alignment)))`, per §4.3.
    fn covered_length(&self, file_alignment: u32) -> u32 {
        self.virtual_size
            .max(align_up(self.raw_size, file_alignment))
    }
}

#[derive(Debug, Clone)]
pub struct AddressMap {
    sections: Vec<SectionSpan>,
    file_alignment: u32,
    size_of_headers: u32,
    include_headers: bool,
}

impl AddressMap {
    pub fn new(
        sections: Vec<SectionSpan>,
        file_alignment: u32,
        size_of_headers: u32,
        include_headers: bool,
    ) -> Self {
        Self {
            sections,
            file_alignment,
            size_of_headers,
            include_headers,
        }
    }

    pub fn sections(&self) -> &[SectionSpan] {
        &self.sections
    }

    /// Resolves `rva` to the index of the covering section and the
    /// section-local offset.
    pub fn rva_to_section_offset(&self, rva: u32) -> Result<(usize, u32)> {
        for (i, s) in self.sections.iter().enumerate() {
            let len = s.covered_length(self.file_alignment);
            if rva >= s.virtual_address && rva < s.virtual_address.saturating_add(len) {
                return Ok((i, rva - s.virtual_address));
            }
        }
        Err(PeError::RvaNotInImage(rva))
    }

    /// Resolves a file offset back to an RVA, by locating the section
    /// whose on-disk raw extent contains it.
    pub fn file_offset_to_rva(&self, offset: u64) -> Result<u32> {
        if self.include_headers && offset < self.size_of_headers as u64 {
            return Ok(offset as u32);
        }
        for s in &self.sections {
            let raw_start = s.raw_pointer as u64;
            let raw_end = raw_start + s.raw_size as u64;
            if offset >= raw_start && offset < raw_end {
                let local = (offset - raw_start) as u32;
                return Ok(s.virtual_address + local);
            }
        }
        Err(PeError::OffsetNotInImage(offset))
    }

    /// Slices `size` bytes starting at `rva` out of `headers` (when
    /// `include_headers` and the RVA falls in the headers region) or the
    /// matching entry of `section_buffers`, which must be parallel to
    /// `sections()`. Fails with `RvaRangeStraddlesSections` when `size`
    /// would run past the covering section's end.
    pub fn rva_to_buffer(
        &self,
        rva: u32,
        size: u32,
        headers: &Buffer,
        section_buffers: &[Buffer],
    ) -> Result<Buffer> {
        if self.include_headers && (rva as u64) < self.size_of_headers as u64 {
            let end = rva as u64 + size as u64;
            if end > self.size_of_headers as u64 {
                return Err(PeError::RvaRangeStraddlesSections);
            }
            return headers.slice(rva as u64, size as u64);
        }

        let (index, local_offset) = self.rva_to_section_offset(rva)?;
        let span = &self.sections[index];
        let covered = span.covered_length(self.file_alignment);
        if local_offset as u64 + size as u64 > covered as u64 {
            return Err(PeError::RvaRangeStraddlesSections);
        }
        let buffer = section_buffers
            .get(index)
            .ok_or(PeError::RvaNotInImage(rva))?;
        buffer.slice(local_offset as u64, size as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ContainerBuffer;

    fn spans() -> Vec<SectionSpan> {
        vec![
            SectionSpan {
                virtual_address: 0x1000,
                virtual_size: 0x50,
                raw_size: 0x200,
                raw_pointer: 0x400,
            },
            SectionSpan {
                virtual_address: 0x2000,
                virtual_size: 0x300,
                raw_size: 0x200,
                raw_pointer: 0x600,
            },
        ]
    }

    #[test]
    fn resolves_rva_within_second_section() {
        let map = AddressMap::new(spans(), 0x200, 0x400, true);
        let (idx, local) = map.rva_to_section_offset(0x2010).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(local, 0x10);
    }

    #[test]
    fn rejects_rva_outside_every_section() {
        let map = AddressMap::new(spans(), 0x200, 0x400, true);
        assert!(map.rva_to_section_offset(0x5000).is_err());
    }

    #[test]
    fn file_offset_round_trips_through_rva() {
        let map = AddressMap::new(spans(), 0x200, 0x400, true);
        let rva = map.file_offset_to_rva(0x610).unwrap();
        let (idx, local) = map.rva_to_section_offset(rva).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(local, 0x10);
    }

    #[test]
    fn straddling_read_fails() {
        let map = AddressMap::new(spans(), 0x200, 0x400, true);
        let headers = Buffer::Container(ContainerBuffer::new(vec![0u8; 0x400], 0));
        let sec0 = Buffer::Container(ContainerBuffer::new(vec![0u8; 0x200], 0x400))
            .with_virtual_tail(0);
        let sec1 = Buffer::Container(ContainerBuffer::new(vec![0u8; 0x200], 0x600))
            .with_virtual_tail(0x100);
        let bufs = [sec0, sec1];
        assert!(map.rva_to_buffer(0x2000, 0x400, &headers, &bufs).is_err());
    }
}
