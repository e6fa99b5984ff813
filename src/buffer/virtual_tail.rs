use crate::error::Result;

use super::Buffer;

/// Attaches `extra_virtual` additional zero-filled bytes beyond an inner
/// buffer's own total size. Used to model a section whose `virtual_size`
/// exceeds its `size_of_raw_data` (§4.3): the raw bytes come from the
/// inner buffer, the rest is zero-fill contributed by the loader.
#[derive(Debug, Clone)]
pub struct VirtualTailBuffer {
    inner: Box<Buffer>,
    extra_virtual: u64,
}

impl VirtualTailBuffer {
    pub fn new(inner: Box<Buffer>, extra_virtual: u64) -> Self {
        Self {
            inner,
            extra_virtual,
        }
    }

    pub fn size(&self) -> u64 {
        self.inner.size()
    }

    pub fn virtual_size(&self) -> u64 {
        self.inner.virtual_size() + self.extra_virtual
    }

    pub fn absolute_offset(&self) -> u64 {
        self.inner.absolute_offset()
    }

    pub fn relative_offset(&self) -> u64 {
        self.inner.relative_offset()
    }

    pub fn read(&self, pos: u64, out: &mut [u8]) -> Result<usize> {
        self.inner.read(pos, out)
    }

    pub fn read_virtual(&self, pos: u64, out: &mut [u8]) -> Result<usize> {
        super::check_bounds(pos, out.len() as u64, self.size() + self.virtual_size())?;
        if pos < self.inner.total_size() {
            // Inner buffer can satisfy part (or all) of the request via its
            // own virtual-fill logic.
            let n = ((self.inner.total_size() - pos) as usize).min(out.len());
            self.inner.read_virtual(pos, &mut out[..n])?;
            for b in &mut out[n..] {
                *b = 0;
            }
        } else {
            out.fill(0);
        }
        Ok(out.len())
    }
}
