//! Span conventions used consistently by the loader. Kept as thin
//! wrappers so call sites read `logging::image_load(path)` instead of
//! repeating the same field names everywhere.

use tracing::Span;

pub fn image_load() -> Span {
    tracing::info_span!("image_load")
}

pub fn rich_header_decode(dans_offset: u64) -> Span {
    tracing::debug_span!("rich_header_decode", dans_offset)
}

pub fn resource_directory(offset: u32) -> Span {
    tracing::debug_span!("resource_directory", offset)
}
