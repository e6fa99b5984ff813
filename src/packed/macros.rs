/// Declares a little-endian packed record and its [`crate::packed::PackedLayout`]
/// impl from a plain field list, in the spirit of the teacher's hand-rolled
/// `StructField` reader: no derive crate, just a declarative macro over
/// [`crate::packed::PackedField`] primitives (`u8`/`u16`/`u32`/`u64`/`i8`/
/// `i16`/`i32`/`i64`/`[u8; N]`).
#[macro_export]
macro_rules! packed_struct {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field : $ty ),*
        }

        impl $crate::packed::PackedLayout for $name {
            fn packed_size() -> usize {
                0 $( + <$ty as $crate::packed::PackedField>::SIZE )*
            }

            #[allow(unused_assignments, unused_mut)]
            fn read_fields(bytes: &[u8]) -> Self {
                let mut pos = 0usize;
                $(
                    let $field = <$ty as $crate::packed::PackedField>::read_le(
                        &bytes[pos..pos + <$ty as $crate::packed::PackedField>::SIZE],
                    );
                    pos += <$ty as $crate::packed::PackedField>::SIZE;
                )*
                Self { $( $field ),* }
            }

            #[allow(unused_assignments, unused_mut)]
            fn write_fields(&self, out: &mut [u8]) {
                let mut pos = 0usize;
                $(
                    <$ty as $crate::packed::PackedField>::write_le(
                        &self.$field,
                        &mut out[pos..pos + <$ty as $crate::packed::PackedField>::SIZE],
                    );
                    pos += <$ty as $crate::packed::PackedField>::SIZE;
                )*
            }
        }
    };
}
