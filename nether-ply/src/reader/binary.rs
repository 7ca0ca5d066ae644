//! Binary body source

use std::io::Read;

use super::{ByteReader, RecordSource, Scalar};
use crate::error::PlyError;
use crate::header::{ByteOrder, ScalarType};

/// Decodes raw records in declared property order
pub struct BinarySource<R> {
    bytes: ByteReader<R>,
}

impl<R: Read> BinarySource<R> {
    pub fn new(inner: R, order: ByteOrder) -> Self {
        Self {
            bytes: ByteReader::new(inner, order),
        }
    }

    /// Body bytes consumed so far
    pub fn offset(&self) -> u64 {
        self.bytes.offset()
    }
}

impl<R: Read> RecordSource for BinarySource<R> {
    fn read_scalar(&mut self, ty: ScalarType) -> Result<Scalar, PlyError> {
        self.bytes.read_scalar(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{Element, Property};
    use crate::reader::{ElementRecords, Value};
    use std::io::Cursor;

    fn vertex_element(count: usize) -> Element {
        Element::new("vertex", count)
            .with_property(Property::scalar("x", ScalarType::F32))
            .with_property(Property::scalar("confidence", ScalarType::F64))
            .with_property(Property::scalar("red", ScalarType::U8))
    }

    #[test]
    fn test_big_endian_records() {
        let mut body = Vec::new();
        for i in 0..2 {
            body.extend_from_slice(&(i as f32 + 0.5).to_be_bytes());
            body.extend_from_slice(&0.25f64.to_be_bytes());
            body.push(200 + i as u8);
        }

        let element = vertex_element(2);
        let mut source = BinarySource::new(Cursor::new(body), ByteOrder::Big);
        let records: Vec<_> = ElementRecords::new(&mut source, &element)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(records[1].values[0], Value::Scalar(Scalar::F32(1.5)));
        assert_eq!(records[1].values[1], Value::Scalar(Scalar::F64(0.25)));
        assert_eq!(records[1].values[2], Value::Scalar(Scalar::U8(201)));
        assert_eq!(source.offset(), 2 * 13);
    }

    #[test]
    fn test_truncated_record_reports_context() {
        let mut body = Vec::new();
        body.extend_from_slice(&1.0f32.to_le_bytes());
        body.extend_from_slice(&1.0f64.to_le_bytes());
        body.push(7);
        body.extend_from_slice(&2.0f32.to_le_bytes());

        let element = vertex_element(2);
        let mut source = BinarySource::new(Cursor::new(body), ByteOrder::Little);
        let mut records = ElementRecords::new(&mut source, &element);
        records.next_record().unwrap();
        match records.next_record() {
            Err(PlyError::TruncatedData {
                element,
                record,
                offset,
            }) => {
                assert_eq!(element, "vertex");
                assert_eq!(record, 1);
                assert_eq!(offset, 17);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }
}
