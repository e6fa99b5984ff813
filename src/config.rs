//! Per-call option structs (§9): how permissive the loader is about
//! virtual data and headers, and what the serializer recomputes.

/// Options controlling how an [`crate::image::Image`] is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Allow reads into a buffer's virtual (zero-filled) tail rather than
    /// failing once the physical bytes run out.
    pub allow_virtual_data: bool,
    /// Treat the header region as addressable via RVA, as if it were an
    /// extra leading section.
    pub include_headers: bool,
    /// Copy resource and section payloads into owned buffers instead of
    /// keeping zero-copy references into the input buffer.
    pub copy_raw_data: bool,
    /// Parse the resource directory tree, if the image has one.
    pub load_resources: bool,
    /// Decode the Rich header, if present.
    pub load_rich_header: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            allow_virtual_data: false,
            include_headers: true,
            copy_raw_data: false,
            load_resources: true,
            load_rich_header: true,
        }
    }
}

/// Options controlling how an [`crate::image::Image`] is re-serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationOptions {
    /// Recompute the Rich header checksum instead of reusing the value
    /// read at load time.
    pub recalculate_rich_checksum: bool,
    /// Write buffers' virtual tail as explicit zero bytes instead of
    /// truncating at the physical size.
    pub write_virtual_part: bool,
    /// Allow the DOS stub buffer to grow if `e_lfanew` was advanced.
    pub allow_dos_stub_buffer_extension: bool,
}

impl Default for SerializationOptions {
    fn default() -> Self {
        Self {
            recalculate_rich_checksum: false,
            write_virtual_part: true,
            allow_dos_stub_buffer_extension: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_defaults_are_conservative() {
        let opts = LoaderOptions::default();
        assert!(!opts.allow_virtual_data);
        assert!(opts.include_headers);
        assert!(!opts.copy_raw_data);
    }
}
