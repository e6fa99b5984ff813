//! DOS header: the 64-byte MS-DOS stub header every PE image starts with.

use crate::buffer::Buffer;
use crate::error::{PeError, Result};
use crate::error_list::ErrorList;
use crate::packed::{PackedLayout, PackedStruct};
use crate::packed_struct;

pub const MZ_MAGIC_VALUE: u16 = 0x5a4d;
pub const MIN_E_LFANEW: u32 = 4;
pub const MAX_E_LFANEW: u32 = 10_485_760;

packed_struct! {
    pub struct DosHeaderRaw {
        pub e_magic: u16,
        pub e_cblp: u16,
        pub e_cp: u16,
        pub e_crlc: u16,
        pub e_cparhdr: u16,
        pub e_minalloc: u16,
        pub e_maxalloc: u16,
        pub e_ss: u16,
        pub e_sp: u16,
        pub e_csum: u16,
        pub e_ip: u16,
        pub e_cs: u16,
        pub e_lfarlc: u16,
        pub e_ovno: u16,
        pub e_res: [u8; 8],
        pub e_oemid: u16,
        pub e_oeminfo: u16,
        pub e_res2: [u8; 20],
        pub e_lfanew: u32,
    }
}

#[derive(Debug, Clone, Default)]
pub struct DosHeaderValidationOptions {
    pub validate_e_lfanew: bool,
    pub validate_magic: bool,
}

impl DosHeaderValidationOptions {
    pub fn strict() -> Self {
        Self {
            validate_e_lfanew: true,
            validate_magic: true,
        }
    }
}

/// The DOS header, bound to a buffer position, with its own recoverable
/// fault list.
#[derive(Debug, Clone)]
pub struct DosHeader {
    raw: PackedStruct<DosHeaderRaw>,
    errors: ErrorList,
}

impl DosHeader {
    /// Binds and structurally validates the DOS header at the start of
    /// `buffer`. An invalid magic or `e_lfanew` is a fatal image fault
    /// (§4.6): returned as `Err`, not recorded.
    pub fn parse(buffer: &Buffer, options: &DosHeaderValidationOptions) -> Result<Self> {
        let raw = PackedStruct::<DosHeaderRaw>::deserialize(buffer, 0, false)?;
        let mut header = Self {
            raw,
            errors: ErrorList::new(),
        };
        if options.validate_magic {
            header.validate_magic()?;
        }
        if options.validate_e_lfanew {
            header.validate_e_lfanew()?;
        }
        Ok(header)
    }

    pub fn magic(&self) -> u16 {
        self.raw.get().e_magic
    }

    pub fn e_lfanew(&self) -> u32 {
        self.raw.get().e_lfanew
    }

    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }

    pub fn validate_magic(&self) -> Result<()> {
        if self.magic() != MZ_MAGIC_VALUE {
            return Err(PeError::InvalidDosMagic);
        }
        Ok(())
    }

    pub fn validate_e_lfanew(&self) -> Result<()> {
        let lfanew = self.e_lfanew();
        if lfanew % 4 != 0 {
            return Err(PeError::UnalignedELfanew(lfanew));
        }
        if !(MIN_E_LFANEW..=MAX_E_LFANEW).contains(&lfanew) {
            return Err(PeError::InvalidELfanew(lfanew));
        }
        Ok(())
    }
}
