//! The buffered I/O and addressing substrate (§4.1).
//!
//! `Buffer` is a closed enum over the small fixed family of concrete
//! buffer implementations (memory span, owned container, seekable
//! stream, virtual-tail wrapper, section slice) rather than a `dyn`
//! trait object, per spec.md §9: a stack-tagged enum keeps
//! `absolute_offset()` computable without an allocation and preserves
//! inlining across the small, fixed variant set.

mod container;
mod memory;
mod ref_buffer;
mod section;
mod stream;
mod virtual_tail;

pub use container::ContainerBuffer;
pub use memory::MemoryBuffer;
pub use ref_buffer::RefBuffer;
pub use section::SectionBuffer;
pub use stream::{ReadSeek, StreamBuffer};
pub use virtual_tail::VirtualTailBuffer;

use crate::error::{PeError, Result};

/// A logical byte region with a physical extent (bytes that really exist)
/// and a virtual extent (zero-filled bytes the loader contributes beyond
/// that), per the data model in spec §3.
#[derive(Debug, Clone)]
pub enum Buffer {
    Memory(MemoryBuffer),
    Container(ContainerBuffer),
    Stream(StreamBuffer),
    VirtualTail(Box<VirtualTailBuffer>),
    Section(Box<SectionBuffer>),
}

impl Buffer {
    pub fn size(&self) -> u64 {
        match self {
            Self::Memory(b) => b.size(),
            Self::Container(b) => b.size(),
            Self::Stream(b) => b.size(),
            Self::VirtualTail(b) => b.size(),
            Self::Section(b) => b.size(),
        }
    }

    pub fn virtual_size(&self) -> u64 {
        match self {
            Self::Memory(b) => b.virtual_size(),
            Self::Container(b) => b.virtual_size(),
            Self::Stream(b) => b.virtual_size(),
            Self::VirtualTail(b) => b.virtual_size(),
            Self::Section(b) => b.virtual_size(),
        }
    }

    pub fn total_size(&self) -> u64 {
        self.size() + self.virtual_size()
    }

    pub fn absolute_offset(&self) -> u64 {
        match self {
            Self::Memory(b) => b.absolute_offset(),
            Self::Container(b) => b.absolute_offset(),
            Self::Stream(b) => b.absolute_offset(),
            Self::VirtualTail(b) => b.absolute_offset(),
            Self::Section(b) => b.absolute_offset(),
        }
    }

    pub fn relative_offset(&self) -> u64 {
        match self {
            Self::Memory(b) => b.relative_offset(),
            Self::Container(b) => b.relative_offset(),
            Self::Stream(b) => b.relative_offset(),
            Self::VirtualTail(b) => b.relative_offset(),
            Self::Section(b) => b.relative_offset(),
        }
    }

    /// Copies `min(out.len(), physical-remaining)` bytes starting at
    /// `pos`. Fails if `pos` is beyond the physical size.
    pub fn read(&self, pos: u64, out: &mut [u8]) -> Result<usize> {
        match self {
            Self::Memory(b) => b.read(pos, out),
            Self::Container(b) => b.read(pos, out),
            Self::Stream(b) => b.read(pos, out),
            Self::VirtualTail(b) => b.read(pos, out),
            Self::Section(b) => b.read(pos, out),
        }
    }

    /// As [`Buffer::read`], but zero-fills bytes in `[physical_size,
    /// total_size)`. Fails only if `pos` is beyond the total size.
    pub fn read_virtual(&self, pos: u64, out: &mut [u8]) -> Result<usize> {
        match self {
            Self::Memory(b) => b.read_virtual(pos, out),
            Self::Container(b) => b.read_virtual(pos, out),
            Self::Stream(b) => b.read_virtual(pos, out),
            Self::VirtualTail(b) => b.read_virtual(pos, out),
            Self::Section(b) => b.read_virtual(pos, out),
        }
    }

    /// Returns a buffer sharing this buffer's lifetime, physically capped
    /// at `pos + len` and with virtual size adjusted accordingly.
    /// Invariant (§8 property 2): `result.absolute_offset() ==
    /// self.absolute_offset() + pos`.
    pub fn slice(&self, pos: u64, len: u64) -> Result<Buffer> {
        if pos > self.total_size() {
            return Err(PeError::BufferReadOutOfBounds {
                pos,
                len,
                total: self.total_size(),
            });
        }
        let physical_remaining = self.size().saturating_sub(pos);
        let physical_len = physical_remaining.min(len);
        let covered_total = (self.total_size() - pos).min(len);
        let virtual_len = covered_total - physical_len;
        Ok(Buffer::Section(Box::new(SectionBuffer::new(
            Box::new(self.clone()),
            pos,
            physical_len,
            virtual_len,
            self.absolute_offset() + pos,
            pos,
        ))))
    }

    /// Wraps this buffer with `extra` additional zero-filled bytes.
    pub fn with_virtual_tail(self, extra: u64) -> Buffer {
        Buffer::VirtualTail(Box::new(VirtualTailBuffer::new(Box::new(self), extra)))
    }
}

pub(crate) fn check_bounds(pos: u64, len: u64, total: u64) -> Result<()> {
    if pos > total {
        return Err(PeError::BufferReadOutOfBounds { pos, len, total });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_composes_absolute_offset_and_size() {
        let data: Vec<u8> = (0..32u8).collect();
        let buf = Buffer::Container(ContainerBuffer::new(data, 100));
        let s = buf.slice(10, 8).unwrap();
        assert_eq!(s.absolute_offset(), buf.absolute_offset() + 10);
        assert_eq!(s.size(), 8.min(buf.size() - 10));
    }

    #[test]
    fn virtual_read_zero_fills_past_physical() {
        let data: Vec<u8> = vec![1, 2, 3, 4];
        let buf = Buffer::Container(ContainerBuffer::new(data, 0)).with_virtual_tail(4);
        let mut out = [0xffu8; 4];
        let n = buf.read_virtual(4, &mut out).unwrap();
        assert_eq!(n, 4);
        assert_eq!(out, [0, 0, 0, 0]);
    }

    #[test]
    fn read_fails_past_physical_size() {
        let data: Vec<u8> = vec![1, 2, 3, 4];
        let buf = Buffer::Container(ContainerBuffer::new(data, 0));
        assert!(buf.read(5, &mut [0u8; 1]).is_err());
    }
}
