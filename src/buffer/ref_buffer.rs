use crate::error::Result;

use super::{Buffer, ContainerBuffer};

/// A value that either *references* a sub-range of another buffer
/// (zero-copy) or *owns* a heap byte vector (copied), per the "Ref-buffer
/// copy-on-demand" design note: the split is explicit in the API, not
/// implicit on mutation.
#[derive(Debug, Clone)]
pub enum RefBuffer {
    Referenced(Buffer),
    Owned(ContainerBuffer),
}

impl RefBuffer {
    pub fn referenced(buffer: Buffer) -> Self {
        Self::Referenced(buffer)
    }

    pub fn owned(data: Vec<u8>, absolute_offset: u64) -> Self {
        Self::Owned(ContainerBuffer::new(data, absolute_offset))
    }

    pub fn size(&self) -> u64 {
        match self {
            Self::Referenced(b) => b.size(),
            Self::Owned(b) => b.size(),
        }
    }

    pub fn virtual_size(&self) -> u64 {
        match self {
            Self::Referenced(b) => b.virtual_size(),
            Self::Owned(b) => b.virtual_size(),
        }
    }

    pub fn physical_size(&self) -> u64 {
        self.size()
    }

    pub fn absolute_offset(&self) -> u64 {
        match self {
            Self::Referenced(b) => b.absolute_offset(),
            Self::Owned(b) => b.absolute_offset(),
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    pub fn read(&self, pos: u64, out: &mut [u8]) -> Result<usize> {
        match self {
            Self::Referenced(b) => b.read(pos, out),
            Self::Owned(b) => b.read(pos, out),
        }
    }

    pub fn read_virtual(&self, pos: u64, out: &mut [u8]) -> Result<usize> {
        match self {
            Self::Referenced(b) => b.read_virtual(pos, out),
            Self::Owned(b) => b.read_virtual(pos, out),
        }
    }

    /// Reads out the full physical content as an owned `Vec<u8>`.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.size() as usize];
        self.read(0, &mut out)?;
        Ok(out)
    }

    /// Severs the shared link to the root buffer, copying the physical
    /// bytes into standalone owned storage. Explicit, per the design
    /// note — never performed implicitly on mutation.
    pub fn copy_referenced_buffer(&self) -> Result<RefBuffer> {
        let data = self.to_vec()?;
        Ok(RefBuffer::Owned(
            ContainerBuffer::new(data, self.absolute_offset())
                .with_virtual_size(self.virtual_size()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_referenced_buffer_severs_the_link() {
        let data: Vec<u8> = vec![1, 2, 3, 4];
        let inner = Buffer::Container(ContainerBuffer::new(data, 10));
        let r = RefBuffer::referenced(inner);
        let owned = r.copy_referenced_buffer().unwrap();
        assert!(owned.is_owned());
        assert_eq!(owned.to_vec().unwrap(), vec![1, 2, 3, 4]);
    }
}
