//! Section characteristics: a 32-bit flag set describing how the loader
//! should map a section (code vs data, access permissions, alignment).

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SectionFlags: u32 {
        const TYPE_NO_PAD = 0x0000_0008;
        const CNT_CODE = 0x0000_0020;
        const CNT_INITIALIZED_DATA = 0x0000_0040;
        const CNT_UNINITIALIZED_DATA = 0x0000_0080;
        const LNK_OTHER = 0x0000_0100;
        const LNK_INFO = 0x0000_0200;
        const LNK_REMOVE = 0x0000_0800;
        const LNK_COMDAT = 0x0000_1000;
        const GPREL = 0x0000_8000;
        const LNK_NRELOC_OVFL = 0x0100_0000;
        const MEM_DISCARDABLE = 0x0200_0000;
        const MEM_NOT_CACHED = 0x0400_0000;
        const MEM_NOT_PAGED = 0x0800_0000;
        const MEM_SHARED = 0x1000_0000;
        const MEM_EXECUTE = 0x2000_0000;
        const MEM_READ = 0x4000_0000;
        const MEM_WRITE = 0x8000_0000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_code_and_execute_read() {
        let flags = SectionFlags::from_bits_truncate(0x6000_0020);
        assert!(flags.contains(SectionFlags::CNT_CODE));
        assert!(flags.contains(SectionFlags::MEM_EXECUTE));
        assert!(flags.contains(SectionFlags::MEM_READ));
        assert!(!flags.contains(SectionFlags::MEM_WRITE));
    }
}
