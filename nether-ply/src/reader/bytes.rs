//! Primitive decoding with byte order handling

use std::io::{ErrorKind, Read};

use crate::error::PlyError;
use crate::header::{ByteOrder, ScalarType};
use crate::reader::Scalar;

/// Reads fixed-width primitives from a stream in a declared byte order
///
/// Values whose declared order differs from the host order have their bytes
/// reversed before interpretation.
pub struct ByteReader<R> {
    inner: R,
    offset: u64,
    swap: bool,
}

macro_rules! read_primitive {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self) -> Result<$ty, PlyError> {
                Ok(<$ty>::from_ne_bytes(self.read_bytes()?))
            }
        )*
    };
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R, order: ByteOrder) -> Self {
        Self {
            inner,
            offset: 0,
            swap: order != ByteOrder::native(),
        }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], PlyError> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => PlyError::truncated(self.offset),
            _ => PlyError::Io(e),
        })?;
        self.offset += N as u64;
        if self.swap {
            buf.reverse();
        }
        Ok(buf)
    }

    read_primitive! {
        read_u8 => u8,
        read_i8 => i8,
        read_u16 => u16,
        read_i16 => i16,
        read_u32 => u32,
        read_i32 => i32,
        read_u64 => u64,
        read_i64 => i64,
        read_f32 => f32,
        read_f64 => f64,
    }

    /// Decode one value of the declared type
    pub fn read_scalar(&mut self, ty: ScalarType) -> Result<Scalar, PlyError> {
        Ok(match ty {
            ScalarType::I8 => Scalar::I8(self.read_i8()?),
            ScalarType::U8 => Scalar::U8(self.read_u8()?),
            ScalarType::I16 => Scalar::I16(self.read_i16()?),
            ScalarType::U16 => Scalar::U16(self.read_u16()?),
            ScalarType::I32 => Scalar::I32(self.read_i32()?),
            ScalarType::U32 => Scalar::U32(self.read_u32()?),
            ScalarType::I64 => Scalar::I64(self.read_i64()?),
            ScalarType::U64 => Scalar::U64(self.read_u64()?),
            ScalarType::F32 => Scalar::F32(self.read_f32()?),
            ScalarType::F64 => Scalar::F64(self.read_f64()?),
        })
    }
}
