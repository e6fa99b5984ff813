//! Loads a hand-assembled PE32 image carrying a three-level resource
//! tree (`RT_RCDATA` -> id 1 -> language 0) in a single `.rsrc` section
//! and reads the leaf payload back out through the image.

use pexp::resources::reader::{get_resource_data_by_id, list_resource_types, ResourceType};
use pexp::{Buffer, Image, LoaderOptions};

const PAYLOAD: &[u8] = b"hello resource";

fn put_u16(buf: &mut [u8], pos: usize, value: u16) {
    buf[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], pos: usize, value: u32) {
    buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
}

fn build_rsrc_section() -> Vec<u8> {
    const RVA_BASE: u32 = 0x2000;

    let mut rsrc = vec![0u8; 88];

    // Root directory: one id entry (RT_RCDATA) pointing at a subdirectory.
    put_u16(&mut rsrc, 6, 1); // number_of_id_entries
    put_u32(&mut rsrc, 16, ResourceType::RcData as u32);
    put_u32(&mut rsrc, 20, 0x8000_0000 | 24);

    // Id directory: one entry keyed by id 1, pointing at the language
    // directory.
    put_u16(&mut rsrc, 24 + 6, 1);
    put_u32(&mut rsrc, 40, 1);
    put_u32(&mut rsrc, 44, 0x8000_0000 | 48);

    // Language directory: one entry keyed by language id 0, pointing at
    // the data entry descriptor (no high bit: a leaf).
    put_u16(&mut rsrc, 48 + 6, 1);
    put_u32(&mut rsrc, 64, 0);
    put_u32(&mut rsrc, 68, 72);

    // Data entry descriptor: RVA of the payload bytes that follow.
    put_u32(&mut rsrc, 72, RVA_BASE + 88); // offset_to_data
    put_u32(&mut rsrc, 76, PAYLOAD.len() as u32); // size

    rsrc.extend_from_slice(PAYLOAD);
    rsrc
}

fn build() -> Vec<u8> {
    let e_lfanew = 64u32;
    let rsrc = build_rsrc_section();

    let mut buf = vec![0u8; 248];
    put_u16(&mut buf, 0, 0x5a4d);
    put_u32(&mut buf, 60, e_lfanew);

    buf[64..68].copy_from_slice(b"PE\0\0");
    put_u16(&mut buf, 68, 0x8664); // machine: AMD64
    put_u16(&mut buf, 70, 1); // number_of_sections
    put_u16(&mut buf, 84, 120); // size_of_optional_header (96 + 3 directories)

    let opt_pos = 88usize;
    put_u16(&mut buf, opt_pos, 0x010B); // magic: PE32
    put_u32(&mut buf, opt_pos + 28, 0x0040_0000); // image_base
    put_u32(&mut buf, opt_pos + 32, 0x1000); // section_alignment
    put_u32(&mut buf, opt_pos + 36, 0x200); // file_alignment
    put_u32(&mut buf, opt_pos + 60, 248); // size_of_headers
    put_u16(&mut buf, opt_pos + 68, 2); // subsystem
    put_u32(&mut buf, opt_pos + 92, 3); // number_of_rva_and_sizes

    let data_dirs_pos = opt_pos + 96;
    let resource_entry_pos = data_dirs_pos + 2 * 8;
    put_u32(&mut buf, resource_entry_pos, 0x2000); // resource directory RVA
    put_u32(&mut buf, resource_entry_pos + 4, 88); // resource directory size

    let section_pos = 208usize;
    buf[section_pos..section_pos + 5].copy_from_slice(b".rsrc");
    put_u32(&mut buf, section_pos + 8, 256); // virtual_size
    put_u32(&mut buf, section_pos + 12, 0x2000); // virtual_address
    put_u32(&mut buf, section_pos + 16, rsrc.len() as u32); // size_of_raw_data
    put_u32(&mut buf, section_pos + 20, 248); // pointer_to_raw_data

    assert_eq!(buf.len(), 248);
    buf.extend_from_slice(&rsrc);
    buf
}

#[test]
fn reads_leaf_resource_data_through_the_full_tree() {
    let buffer = Buffer::Container(pexp::buffer::ContainerBuffer::new(build(), 0));
    let image = Image::load(buffer, &LoaderOptions::default()).expect("image should load");

    assert!(!image.errors().has_errors());
    let resources = image.resources().expect("resource tree should be present");

    assert_eq!(list_resource_types(resources), vec![ResourceType::RcData as u32]);

    let data = get_resource_data_by_id(resources, ResourceType::RcData, 1, 0)
        .expect("leaf resource should resolve");
    let bytes = data.to_vec().expect("payload should be readable");
    assert_eq!(bytes, PAYLOAD);
}
