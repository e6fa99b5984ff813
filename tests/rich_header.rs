//! Builds an image whose DOS stub carries a self-consistent Rich header
//! and checks both decode-on-load and checksum recomputation on
//! re-serialization.

use pexp::header::rich_header::{CompId, RichHeader};
use pexp::{Buffer, Image, LoaderOptions, SerializationOptions};

fn put_u16(buf: &mut [u8], pos: usize, value: u16) {
    buf[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], pos: usize, value: u32) {
    buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
}

fn build() -> (Vec<u8>, u32) {
    const DANS_OFFSET: usize = 16;

    let compids = vec![CompId {
        build_number: 1,
        prod_id: 2,
        use_count: 3,
    }];

    let mut dos_header_bytes = [0u8; 64];
    dos_header_bytes[0..2].copy_from_slice(&0x5a4du16.to_le_bytes());
    let e_lfanew = 64 + DANS_OFFSET as u32 + 32; // stub prefix + encoded stream
    dos_header_bytes[60..64].copy_from_slice(&e_lfanew.to_le_bytes());

    let stub_prefix = vec![0u8; DANS_OFFSET];
    let checksum =
        RichHeader::calculate_checksum(&dos_header_bytes, &stub_prefix, &compids, DANS_OFFSET);
    let encoded = RichHeader::encode(&compids, checksum, DANS_OFFSET);

    let mut buf = Vec::new();
    buf.extend_from_slice(&dos_header_bytes);
    buf.extend_from_slice(&stub_prefix);
    buf.extend_from_slice(&encoded);
    assert_eq!(buf.len(), e_lfanew as usize);

    buf.extend_from_slice(b"PE\0\0");
    let coff_pos = buf.len();
    buf.extend(std::iter::repeat(0u8).take(20));
    put_u16(&mut buf, coff_pos + 0, 0x8664);
    put_u16(&mut buf, coff_pos + 16, 96);

    let opt_pos = buf.len();
    buf.extend(std::iter::repeat(0u8).take(96));
    put_u16(&mut buf, opt_pos, 0x010B); // magic: PE32
    put_u32(&mut buf, opt_pos + 28, 0x0040_0000); // image_base
    put_u32(&mut buf, opt_pos + 32, 0x1000); // section_alignment
    put_u32(&mut buf, opt_pos + 36, 0x200); // file_alignment

    let size_of_headers = buf.len() as u32;
    put_u32(&mut buf, opt_pos + 60, size_of_headers); // size_of_headers

    (buf, checksum)
}

#[test]
fn decodes_rich_header_embedded_in_the_stub() {
    let (bytes, checksum) = build();
    let buffer = Buffer::Container(pexp::buffer::ContainerBuffer::new(bytes, 0));
    let image = Image::load(buffer, &LoaderOptions::default()).expect("image should load");

    let rich = image.rich_header().expect("rich header should be present");
    assert_eq!(rich.checksum(), checksum);
    assert_eq!(rich.compids().len(), 1);
    assert_eq!(rich.compids()[0].build_number, 1);
    assert_eq!(rich.compids()[0].use_count, 3);
}

#[test]
fn serialize_without_recalculation_reproduces_the_input_exactly() {
    let (bytes, _checksum) = build();
    let buffer = Buffer::Container(pexp::buffer::ContainerBuffer::new(bytes.clone(), 0));
    let image = Image::load(buffer, &LoaderOptions::default()).unwrap();

    let out = image.serialize(&SerializationOptions::default()).unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn recalculating_a_self_consistent_checksum_is_a_no_op() {
    let (bytes, checksum) = build();
    let buffer = Buffer::Container(pexp::buffer::ContainerBuffer::new(bytes.clone(), 0));
    let image = Image::load(buffer, &LoaderOptions::default()).unwrap();

    let options = SerializationOptions {
        recalculate_rich_checksum: true,
        ..SerializationOptions::default()
    };
    let out = image.serialize(&options).unwrap();
    assert_eq!(out, bytes);

    let rich = image.rich_header().unwrap();
    assert_eq!(rich.checksum(), checksum);
}
