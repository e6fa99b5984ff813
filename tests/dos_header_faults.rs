//! Fatal header faults (§4.6): bad DOS magic, unaligned/out-of-range
//! `e_lfanew`, and a missing PE signature must abort the load instead of
//! being recorded.

use pexp::{Buffer, Image, LoaderOptions, PeError};

fn put_u32(buf: &mut [u8], pos: usize, value: u32) {
    buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
}

fn dos_header_only(e_lfanew: u32) -> Vec<u8> {
    let mut buf = vec![0u8; 64];
    buf[0..2].copy_from_slice(&0x5a4du16.to_le_bytes());
    put_u32(&mut buf, 60, e_lfanew);
    buf
}

fn load(bytes: Vec<u8>) -> Result<Image, PeError> {
    let buffer = Buffer::Container(pexp::buffer::ContainerBuffer::new(bytes, 0));
    Image::load(buffer, &LoaderOptions::default())
}

#[test]
fn bad_magic_aborts_the_load() {
    let mut bytes = dos_header_only(64);
    bytes[0] = 0;
    assert_eq!(load(bytes).unwrap_err(), PeError::InvalidDosMagic);
}

#[test]
fn unaligned_e_lfanew_aborts_the_load() {
    let bytes = dos_header_only(65);
    assert_eq!(load(bytes).unwrap_err(), PeError::UnalignedELfanew(65));
}

#[test]
fn out_of_range_e_lfanew_aborts_the_load() {
    let bytes = dos_header_only(0);
    assert_eq!(load(bytes).unwrap_err(), PeError::InvalidELfanew(0));
}

#[test]
fn missing_pe_signature_aborts_the_load() {
    let mut bytes = dos_header_only(64);
    bytes.extend_from_slice(b"XX\0\0");
    assert_eq!(load(bytes).unwrap_err(), PeError::InvalidPeSignature);
}
