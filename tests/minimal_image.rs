//! Loads a hand-assembled, header-only PE32 image (no sections, no
//! resources) and checks the header chain comes back intact.

use pexp::header::machine::Machine;
use pexp::{Buffer, Image, LoaderOptions};

fn put_u16(buf: &mut [u8], pos: usize, value: u16) {
    buf[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], pos: usize, value: u32) {
    buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
}

fn build() -> Vec<u8> {
    let e_lfanew = 64u32;
    let mut buf = vec![0u8; 184];

    put_u16(&mut buf, 0, 0x5a4d); // e_magic
    put_u32(&mut buf, 60, e_lfanew);

    buf[64..68].copy_from_slice(b"PE\0\0");

    put_u16(&mut buf, 68, 0x8664); // machine: AMD64
    put_u16(&mut buf, 70, 0); // number_of_sections
    put_u16(&mut buf, 84, 96); // size_of_optional_header, no data directories

    put_u16(&mut buf, 88, 0x010B); // magic: PE32
    put_u32(&mut buf, 104, 0x1000); // address_of_entry_point
    put_u32(&mut buf, 116, 0x0040_0000); // image_base
    put_u32(&mut buf, 120, 0x1000); // section_alignment
    put_u32(&mut buf, 124, 0x200); // file_alignment
    put_u32(&mut buf, 148, 184); // size_of_headers
    put_u16(&mut buf, 156, 2); // subsystem
    put_u32(&mut buf, 180, 0); // number_of_rva_and_sizes

    buf
}

#[test]
fn parses_header_chain_with_no_sections_or_resources() {
    let buffer = Buffer::Container(pexp::buffer::ContainerBuffer::new(build(), 0));
    let image = Image::load(buffer, &LoaderOptions::default()).expect("image should load");

    assert_eq!(image.dos_header().e_lfanew(), 64);
    assert_eq!(image.coff_header().machine(), Machine::AMD64);
    assert_eq!(image.coff_header().number_of_sections(), 0);
    assert!(!image.optional_header().is_pe32_plus());
    assert_eq!(image.optional_header().image_base(), 0x0040_0000);
    assert_eq!(image.optional_header().section_alignment(), 0x1000);
    assert_eq!(image.optional_header().size_of_headers(), 184);
    assert!(image.sections().is_empty());
    assert!(image.resources().is_none());
    assert!(image.rich_header().is_none());
    assert!(image.overlay().is_none());
    assert!(!image.errors().has_errors());
}
