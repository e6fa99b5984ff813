//! The DOS stub: the bytes between the end of the DOS header and the PE
//! signature, typically a tiny MS-DOS program printing "This program
//! cannot be run in DOS mode." and, often, a Rich header.

use crate::buffer::Buffer;
use crate::error::Result;

pub const DOS_HEADER_SIZE: u64 = 64;

/// The raw stub bytes, bound at their position in the image (right after
/// the DOS header).
#[derive(Debug, Clone)]
pub struct DosStub {
    buffer_pos: u64,
    data: Buffer,
}

impl DosStub {
    /// `e_lfanew` is the DOS header's pointer to the PE signature; the
    /// stub spans `[DOS_HEADER_SIZE, e_lfanew)`.
    pub fn parse(buffer: &Buffer, e_lfanew: u32) -> Result<Self> {
        let len = (e_lfanew as u64).saturating_sub(DOS_HEADER_SIZE);
        let data = buffer.slice(DOS_HEADER_SIZE, len)?;
        Ok(Self {
            buffer_pos: DOS_HEADER_SIZE,
            data,
        })
    }

    pub fn buffer_pos(&self) -> u64 {
        self.buffer_pos
    }

    pub fn data(&self) -> &Buffer {
        &self.data
    }
}
