//! Resource directory entries: the {name-or-id, data-or-subdirectory}
//! pair that makes up one slot in a [`super::directory::ResourceDirectory`].

use crate::buffer::RefBuffer;
use crate::error::{PeError, Result};

use super::directory::ResourceDirectory;

pub type ResourceId = u32;

/// A resource's key within its parent directory: either a numeric id or
/// a UTF-16 name, decoded from the directory entry's first dword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameOrId {
    Id(ResourceId),
    Name(String),
}

impl NameOrId {
    pub fn as_id(&self) -> Option<ResourceId> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Id(_) => None,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Self::Name(_))
    }
}

/// A leaf resource: the {RVA, size, code-page} descriptor plus the
/// payload bytes it addresses.
#[derive(Debug, Clone)]
pub struct ResourceDataEntry {
    pub code_page: u32,
    pub reserved: u32,
    pub data: RefBuffer,
}

impl ResourceDataEntry {
    pub fn raw_data(&self) -> &RefBuffer {
        &self.data
    }
}

/// What a directory entry points at: a nested directory, a leaf data
/// entry, or (when the subdirectory offset was already on the current
/// descent path) a cycle marker carrying the looping directory's offset.
#[derive(Debug, Clone)]
pub enum Payload {
    Directory(Box<ResourceDirectory>),
    Data(ResourceDataEntry),
    Cycle(u32),
}

#[derive(Debug, Clone)]
pub struct ResourceDirectoryEntry {
    pub name_or_id: NameOrId,
    pub payload: Payload,
}

impl ResourceDirectoryEntry {
    pub fn id(&self) -> Option<ResourceId> {
        self.name_or_id.as_id()
    }

    pub fn name(&self) -> Option<&str> {
        self.name_or_id.as_name()
    }

    pub fn is_named(&self) -> bool {
        self.name_or_id.is_named()
    }

    pub fn has_directory(&self) -> bool {
        matches!(self.payload, Payload::Directory(_))
    }

    pub fn has_data(&self) -> bool {
        matches!(self.payload, Payload::Data(_))
    }

    pub fn get_directory(&self) -> Result<&ResourceDirectory> {
        match &self.payload {
            Payload::Directory(dir) => Ok(dir),
            _ => Err(PeError::EntryDoesNotContainDirectory),
        }
    }

    pub fn get_directory_mut(&mut self) -> Result<&mut ResourceDirectory> {
        match &mut self.payload {
            Payload::Directory(dir) => Ok(dir),
            _ => Err(PeError::EntryDoesNotContainDirectory),
        }
    }

    pub fn get_data(&self) -> Result<&ResourceDataEntry> {
        match &self.payload {
            Payload::Data(data) => Ok(data),
            _ => Err(PeError::EntryDoesNotContainData),
        }
    }
}
