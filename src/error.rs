//! Error taxonomy for the crate.
//!
//! Every fault kind named by the format lives in a single enum so that
//! recoverable structural faults (recorded on an [`crate::error_list::ErrorList`])
//! and fatal image faults (returned from [`crate::image::Image::load`]) share
//! one vocabulary, the way the original implementation's `pe_error` wraps both.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PeError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PeError {
    // --- buffer faults ---
    #[error("buffer read out of bounds: pos {pos} + len {len} exceeds total size {total}")]
    BufferReadOutOfBounds { pos: u64, len: u64, total: u64 },
    #[error("I/O failure: {0}")]
    IoFailure(String),

    // --- header faults (image-fatal) ---
    #[error("invalid DOS magic")]
    InvalidDosMagic,
    #[error("unaligned e_lfanew: {0:#x}")]
    UnalignedELfanew(u32),
    #[error("invalid e_lfanew: {0:#x}")]
    InvalidELfanew(u32),
    #[error("invalid PE signature")]
    InvalidPeSignature,
    #[error("invalid file header")]
    InvalidFileHeader,
    #[error("invalid optional header")]
    InvalidOptionalHeader,
    #[error("invalid section table")]
    InvalidSectionTable,

    // --- packed-struct / address-map faults ---
    #[error("insufficient physical bytes for packed struct")]
    InsufficientPhysicalBytes,
    #[error("RVA {0:#x} not in image")]
    RvaNotInImage(u32),
    #[error("file offset {0:#x} not in image")]
    OffsetNotInImage(u64),
    #[error("RVA range straddles section boundaries")]
    RvaRangeStraddlesSections,

    // --- resource-directory structural faults (recoverable) ---
    #[error("invalid directory size")]
    InvalidDirectorySize,
    #[error("invalid resource directory")]
    InvalidResourceDirectory,
    #[error("invalid resource directory entry")]
    InvalidResourceDirectoryEntry,
    #[error("invalid resource directory entry name")]
    InvalidResourceDirectoryEntryName,
    #[error("invalid number of named and id entries")]
    InvalidNumberOfNamedAndIdEntries,
    #[error("entries point outside directory")]
    EntriesPointOutsideDirectory,
    #[error("unsorted entries")]
    UnsortedEntries,
    #[error("entry does not contain a directory")]
    EntryDoesNotContainDirectory,
    #[error("entry does not contain data")]
    EntryDoesNotContainData,
    #[error("entry does not have a name")]
    EntryDoesNotHaveName,
    #[error("entry does not have an id")]
    EntryDoesNotHaveId,
    #[error("entry does not exist")]
    EntryDoesNotExist,

    // --- Rich-header faults ---
    #[error("missing DanS marker")]
    MissingDansMarker,
    #[error("misaligned CompID region")]
    MisalignedCompidRegion,
    #[error("invalid Rich header offset")]
    InvalidRichHeaderOffset,

    // --- icon/cursor sub-parser faults ---
    #[error("different number of group headers and data entries")]
    DifferentNumberOfHeadersAndData,
    #[error("invalid hotspot")]
    InvalidHotspot,
}

impl PeError {
    /// A stable numeric code for the error kind, suitable for logs or FFI,
    /// assigned densely in declaration order.
    pub fn code(&self) -> u32 {
        match self {
            Self::BufferReadOutOfBounds { .. } => 1,
            Self::IoFailure(_) => 2,
            Self::InvalidDosMagic => 3,
            Self::UnalignedELfanew(_) => 4,
            Self::InvalidELfanew(_) => 5,
            Self::InvalidPeSignature => 6,
            Self::InvalidFileHeader => 7,
            Self::InvalidOptionalHeader => 8,
            Self::InvalidSectionTable => 9,
            Self::InsufficientPhysicalBytes => 10,
            Self::RvaNotInImage(_) => 11,
            Self::OffsetNotInImage(_) => 12,
            Self::RvaRangeStraddlesSections => 13,
            Self::InvalidDirectorySize => 14,
            Self::InvalidResourceDirectory => 15,
            Self::InvalidResourceDirectoryEntry => 16,
            Self::InvalidResourceDirectoryEntryName => 17,
            Self::InvalidNumberOfNamedAndIdEntries => 18,
            Self::EntriesPointOutsideDirectory => 19,
            Self::UnsortedEntries => 20,
            Self::EntryDoesNotContainDirectory => 21,
            Self::EntryDoesNotContainData => 22,
            Self::EntryDoesNotHaveName => 23,
            Self::EntryDoesNotHaveId => 24,
            Self::EntryDoesNotExist => 25,
            Self::MissingDansMarker => 26,
            Self::MisalignedCompidRegion => 27,
            Self::InvalidRichHeaderOffset => 28,
            Self::DifferentNumberOfHeadersAndData => 29,
            Self::InvalidHotspot => 30,
        }
    }

    /// True for faults that leave the image fundamentally unusable and must
    /// therefore be propagated rather than recorded (§4.6 policy).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidDosMagic
                | Self::UnalignedELfanew(_)
                | Self::InvalidELfanew(_)
                | Self::InvalidPeSignature
                | Self::InvalidFileHeader
                | Self::InvalidOptionalHeader
                | Self::InvalidSectionTable
        )
    }
}

impl From<std::io::Error> for PeError {
    fn from(e: std::io::Error) -> Self {
        Self::IoFailure(e.to_string())
    }
}
