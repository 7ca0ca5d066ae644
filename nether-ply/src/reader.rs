//! Record decoding
//!
//! A [`RecordSource`] decodes single values from the body; ASCII and binary
//! bodies each have one. [`ElementRecords`] walks one element block on top of
//! a source, producing one [`Record`] per call in schema order.

mod ascii;
mod binary;
mod bytes;

pub use ascii::AsciiSource;
pub use binary::BinarySource;
pub use bytes::ByteReader;

use crate::error::PlyError;
use crate::header::{Element, PropertyType, ScalarType};

// =============================================================================
// Decoded values
// =============================================================================

/// One decoded primitive, tagged with its declared type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    pub fn ty(self) -> ScalarType {
        match self {
            Self::I8(_) => ScalarType::I8,
            Self::U8(_) => ScalarType::U8,
            Self::I16(_) => ScalarType::I16,
            Self::U16(_) => ScalarType::U16,
            Self::I32(_) => ScalarType::I32,
            Self::U32(_) => ScalarType::U32,
            Self::I64(_) => ScalarType::I64,
            Self::U64(_) => ScalarType::U64,
            Self::F32(_) => ScalarType::F32,
            Self::F64(_) => ScalarType::F64,
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Self::I8(v) => v as f64,
            Self::U8(v) => v as f64,
            Self::I16(v) => v as f64,
            Self::U16(v) => v as f64,
            Self::I32(v) => v as f64,
            Self::U32(v) => v as f64,
            Self::I64(v) => v as f64,
            Self::U64(v) => v as f64,
            Self::F32(v) => v as f64,
            Self::F64(v) => v,
        }
    }

    pub fn to_f32(self) -> f32 {
        match self {
            Self::F32(v) => v,
            other => other.to_f64() as f32,
        }
    }

    /// Signed integer view, saturating for huge unsigned values and truncating floats
    pub fn to_i64(self) -> i64 {
        match self {
            Self::U64(v) => i64::try_from(v).unwrap_or(i64::MAX),
            Self::F32(v) => v as i64,
            Self::F64(v) => v as i64,
            other => other.to_f64() as i64,
        }
    }

    /// Non-negative integer value, `None` for floats and negatives
    pub fn to_u64(self) -> Option<u64> {
        match self {
            Self::I8(v) => u64::try_from(v).ok(),
            Self::U8(v) => Some(v as u64),
            Self::I16(v) => u64::try_from(v).ok(),
            Self::U16(v) => Some(v as u64),
            Self::I32(v) => u64::try_from(v).ok(),
            Self::U32(v) => Some(v as u64),
            Self::I64(v) => u64::try_from(v).ok(),
            Self::U64(v) => Some(v),
            Self::F32(_) | Self::F64(_) => None,
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::I8(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
        }
    }
}

/// Decoded property value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Scalar(s) => Some(*s),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Scalar]> {
        match self {
            Self::Scalar(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

/// One decoded element instance; `values` is parallel to the element's properties
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub index: usize,
    pub values: Vec<Value>,
}

// =============================================================================
// Sources
// =============================================================================

/// Decodes values from a body stream, one strategy per encoding
pub trait RecordSource {
    /// Called before the first value of every record
    fn begin_record(&mut self) -> Result<(), PlyError> {
        Ok(())
    }

    fn read_scalar(&mut self, ty: ScalarType) -> Result<Scalar, PlyError>;

    /// Decode a property value; lists read their count first, then the items
    fn read_value(&mut self, ty: PropertyType) -> Result<Value, PlyError> {
        match ty {
            PropertyType::Scalar(ty) => Ok(Value::Scalar(self.read_scalar(ty)?)),
            PropertyType::List { count, item } => {
                let raw = self.read_scalar(count)?;
                let len = raw
                    .to_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| PlyError::value_format(raw.to_string(), "list count"))?;
                let items = (0..len)
                    .map(|_| self.read_scalar(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(items))
            }
        }
    }
}

/// Cursor over the records of one element block
pub struct ElementRecords<'a, S> {
    source: &'a mut S,
    element: &'a Element,
    next: usize,
}

impl<'a, S: RecordSource> ElementRecords<'a, S> {
    pub fn new(source: &'a mut S, element: &'a Element) -> Self {
        Self {
            source,
            element,
            next: 0,
        }
    }

    /// Decode the next record, or `None` once the declared count is exhausted
    pub fn next_record(&mut self) -> Result<Option<Record>, PlyError> {
        if self.next >= self.element.count {
            return Ok(None);
        }
        let index = self.next;
        let name = &self.element.name;

        self.source
            .begin_record()
            .map_err(|e| e.at_record(name, index))?;
        let mut values = Vec::with_capacity(self.element.properties.len());
        for property in &self.element.properties {
            let value = self
                .source
                .read_value(property.ty)
                .map_err(|e| e.at_record(name, index))?;
            values.push(value);
        }

        self.next += 1;
        Ok(Some(Record { index, values }))
    }

    /// Decode and discard the remaining records
    pub fn skip_remaining(&mut self) -> Result<(), PlyError> {
        while self.next_record()?.is_some() {}
        Ok(())
    }
}

impl<S: RecordSource> Iterator for ElementRecords<'_, S> {
    type Item = Result<Record, PlyError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
