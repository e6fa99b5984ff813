//! The COFF file header: machine type, section count, and the flags that
//! describe the image's general attributes.

use chrono::{DateTime, Utc};

use crate::buffer::Buffer;
use crate::error::{PeError, Result};
use crate::error_list::ErrorList;
use crate::packed::{PackedLayout, PackedStruct};
use crate::packed_struct;

use super::characteristics::Characteristics;
use super::machine::Machine;

packed_struct! {
    pub struct CoffHeaderRaw {
        pub machine: u16,
        pub number_of_sections: u16,
        pub time_date_stamp: u32,
        pub pointer_to_symbol_table: u32,
        pub number_of_symbols: u32,
        pub size_of_optional_header: u16,
        pub characteristics: u16,
    }
}

/// COFF file header, immediately following the PE signature.
#[derive(Debug, Clone)]
pub struct CoffHeader {
    raw: PackedStruct<CoffHeaderRaw>,
    errors: ErrorList,
}

impl CoffHeader {
    pub fn parse(buffer: &Buffer, pos: u64) -> Result<Self> {
        let raw = PackedStruct::<CoffHeaderRaw>::deserialize(buffer, pos, false)?;
        if raw.physical_size() < raw.packed_size() {
            return Err(PeError::InvalidFileHeader);
        }
        Ok(Self {
            raw,
            errors: ErrorList::new(),
        })
    }

    pub fn machine(&self) -> Machine {
        Machine::from(self.raw.get().machine)
    }

    pub fn number_of_sections(&self) -> u16 {
        self.raw.get().number_of_sections
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.raw.get().time_date_stamp as i64, 0)
    }

    pub fn pointer_to_symbol_table(&self) -> u32 {
        self.raw.get().pointer_to_symbol_table
    }

    pub fn number_of_symbols(&self) -> u32 {
        self.raw.get().number_of_symbols
    }

    pub fn size_of_optional_header(&self) -> u16 {
        self.raw.get().size_of_optional_header
    }

    pub fn characteristics(&self) -> Characteristics {
        Characteristics::from(self.raw.get().characteristics)
    }

    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorList {
        &mut self.errors
    }
}
