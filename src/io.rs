//! Little-endian binary (de)serialization of the fixed-layout structs used
//! by the container format (`FileHeader`, `SetRecord`).
//!
//! A `Data` trait implemented for the primitive integer types on top of
//! `lebe`, so the container module can write/read each `i32` field
//! without manual byte-swapping.

pub use std::io::{Read, Write};
use lebe::prelude::*;
use crate::error::UnitResult;

/// Extension trait for the primitive integer types used in the container
/// format. All container fields are `i32`, little-endian, packed.
pub trait Data: Sized + Default + Copy {
    fn read(read: &mut impl Read) -> std::io::Result<Self>;
    fn write(self, write: &mut impl Write) -> std::io::Result<()>;
}

macro_rules! implement_data_for_primitive {
    ($kind: ident) => {
        impl Data for $kind {
            fn read(read: &mut impl Read) -> std::io::Result<Self> {
                read.read_from_little_endian()
            }

            fn write(self, write: &mut impl Write) -> std::io::Result<()> {
                write.write_as_little_endian(&self)
            }
        }
    };
}

implement_data_for_primitive!(i32);
implement_data_for_primitive!(u32);
implement_data_for_primitive!(u64);

/// Writes `value.len()` bytes unmodified (no length prefix — the container
/// format tracks lengths out-of-band in the SetRecord).
pub fn write_bytes(write: &mut impl Write, value: &[u8]) -> UnitResult {
    write.write_all(value)?;
    Ok(())
}
