//! The packed-struct view (§4.2): a typed little-endian record bound to a
//! buffer position, carrying the three-way packed/physical/data size
//! accounting the spec requires.

mod macros;

use byteorder::{ByteOrder, LittleEndian};

use crate::buffer::Buffer;
use crate::error::{PeError, Result};

/// A primitive field type usable inside a [`crate::packed_struct!`]
/// declaration: fixed little-endian size, read/write against a byte slice.
pub trait PackedField: Sized + Copy {
    const SIZE: usize;
    fn read_le(bytes: &[u8]) -> Self;
    fn write_le(&self, out: &mut [u8]);
}

macro_rules! impl_packed_int {
    ($t:ty, $size:expr, $read:ident, $write:ident) => {
        impl PackedField for $t {
            const SIZE: usize = $size;
            fn read_le(bytes: &[u8]) -> Self {
                LittleEndian::$read(bytes)
            }
            fn write_le(&self, out: &mut [u8]) {
                LittleEndian::$write(out, *self)
            }
        }
    };
}

impl PackedField for u8 {
    const SIZE: usize = 1;
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0]
    }
    fn write_le(&self, out: &mut [u8]) {
        out[0] = *self;
    }
}

impl PackedField for i8 {
    const SIZE: usize = 1;
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }
    fn write_le(&self, out: &mut [u8]) {
        out[0] = *self as u8;
    }
}

impl_packed_int!(u16, 2, read_u16, write_u16);
impl_packed_int!(u32, 4, read_u32, write_u32);
impl_packed_int!(u64, 8, read_u64, write_u64);
impl_packed_int!(i16, 2, read_i16, write_i16);
impl_packed_int!(i32, 4, read_i32, write_i32);
impl_packed_int!(i64, 8, read_i64, write_i64);

impl<const N: usize> PackedField for [u8; N] {
    const SIZE: usize = N;
    fn read_le(bytes: &[u8]) -> Self {
        let mut out = [0u8; N];
        out.copy_from_slice(&bytes[..N]);
        out
    }
    fn write_le(&self, out: &mut [u8]) {
        out[..N].copy_from_slice(self);
    }
}

/// Generated by [`crate::packed_struct!`] for every packed record type:
/// declares the on-disk size and the field-order (de)serialization.
pub trait PackedLayout: Sized {
    fn packed_size() -> usize;
    fn read_fields(bytes: &[u8]) -> Self;
    fn write_fields(&self, out: &mut [u8]);
}

/// A `T` bound to a buffer position, per §3/§4.2: carries the bind-time
/// absolute offset plus the packed/physical/data size triple.
#[derive(Debug, Clone)]
pub struct PackedStruct<T: PackedLayout> {
    absolute_offset: u64,
    physical_size: usize,
    data_size: usize,
    value: T,
}

impl<T: PackedLayout> PackedStruct<T> {
    /// Binds `T` at `pos` within `buffer`. With `allow_virtual = false`,
    /// fails with `InsufficientPhysicalBytes` unless the full packed size
    /// is physically present.
    pub fn deserialize(buffer: &Buffer, pos: u64, allow_virtual: bool) -> Result<Self> {
        let packed_size = T::packed_size() as u64;
        let physical_remaining = buffer.size().saturating_sub(pos);
        if !allow_virtual && physical_remaining < packed_size {
            return Err(PeError::InsufficientPhysicalBytes);
        }
        let total_remaining = buffer.total_size().saturating_sub(pos);
        let data_size = packed_size.min(total_remaining);
        let physical_size = physical_remaining.min(data_size);

        let mut bytes = vec![0u8; packed_size as usize];
        if data_size > 0 {
            buffer.read_virtual(pos, &mut bytes[..data_size as usize])?;
        }
        let value = T::read_fields(&bytes);

        Ok(Self {
            absolute_offset: buffer.absolute_offset() + pos,
            physical_size: physical_size as usize,
            data_size: data_size as usize,
            value,
        })
    }

    pub fn packed_size(&self) -> usize {
        T::packed_size()
    }

    pub fn physical_size(&self) -> usize {
        self.physical_size
    }

    pub fn data_size(&self) -> usize {
        self.data_size
    }

    pub fn is_fully_virtual(&self) -> bool {
        self.physical_size == 0
    }

    pub fn absolute_offset(&self) -> u64 {
        self.absolute_offset
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// Re-encodes `value` to its on-disk byte image. When
    /// `include_virtual_tail` is false, the output is truncated to
    /// `physical_size` (the bytes that existed at bind time).
    pub fn serialize(value: &T, include_virtual_tail: bool, physical_size: usize) -> Vec<u8> {
        let mut out = vec![0u8; T::packed_size()];
        value.write_fields(&mut out);
        if include_virtual_tail {
            out
        } else {
            out.truncate(physical_size.min(out.len()));
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ContainerBuffer;

    crate::packed_struct! {
        pub struct Pair {
            pub a: u16,
            pub b: u32,
        }
    }

    #[test]
    fn packed_size_is_sum_of_fields() {
        assert_eq!(Pair::packed_size(), 6);
    }

    #[test]
    fn round_trips_through_deserialize_serialize() {
        let data: Vec<u8> = vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let buf = Buffer::Container(ContainerBuffer::new(data.clone(), 0));
        let bound = PackedStruct::<Pair>::deserialize(&buf, 0, false).unwrap();
        assert_eq!(bound.get().a, 0x0201);
        assert_eq!(bound.get().b, 0x0605_0403);
        assert_eq!(bound.physical_size(), 6);
        let re = PackedStruct::<Pair>::serialize(bound.get(), true, bound.physical_size());
        assert_eq!(re, data);
    }

    #[test]
    fn fails_without_enough_physical_bytes() {
        let data: Vec<u8> = vec![0x01, 0x02];
        let buf = Buffer::Container(ContainerBuffer::new(data, 0));
        assert!(PackedStruct::<Pair>::deserialize(&buf, 0, false).is_err());
    }

    #[test]
    fn virtual_bind_zero_extends_missing_bytes() {
        let data: Vec<u8> = vec![0x01, 0x02];
        let buf = Buffer::Container(ContainerBuffer::new(data, 0)).with_virtual_tail(4);
        let bound = PackedStruct::<Pair>::deserialize(&buf, 0, true).unwrap();
        assert_eq!(bound.physical_size(), 2);
        assert_eq!(bound.data_size(), 6);
        assert_eq!(bound.get().a, 0x0201);
        assert_eq!(bound.get().b, 0);
    }
}
