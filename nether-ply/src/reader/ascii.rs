//! ASCII body source

use std::io::BufRead;
use std::str::FromStr;

use super::{RecordSource, Scalar};
use crate::error::PlyError;
use crate::header::ScalarType;

/// Whitespace tokenizer producing values in declared property order
///
/// Each record starts on a fresh line. A record that runs out of tokens
/// continues on the following lines; tokens left over on a record's last
/// line are ignored.
pub struct AsciiSource<R> {
    reader: R,
    buf: Vec<u8>,
    line: String,
    tokens: Vec<(usize, usize)>,
    cursor: usize,
    /// Byte offset of the start of `line` within the body
    line_offset: u64,
    consumed: u64,
}

impl<R: BufRead> AsciiSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: String::new(),
            tokens: Vec::new(),
            cursor: 0,
            line_offset: 0,
            consumed: 0,
        }
    }

    /// Advance to the next line containing at least one token
    fn fill_line(&mut self) -> Result<bool, PlyError> {
        loop {
            self.buf.clear();
            self.line.clear();
            self.line_offset = self.consumed;
            let read = self.reader.read_until(b'\n', &mut self.buf)?;
            if read == 0 {
                self.tokens.clear();
                self.cursor = 0;
                return Ok(false);
            }
            self.consumed += read as u64;

            match std::str::from_utf8(&self.buf) {
                Ok(text) => self.line.push_str(text),
                Err(_) => {
                    self.tokens.clear();
                    self.cursor = 0;
                    let text = String::from_utf8_lossy(&self.buf);
                    return Err(PlyError::value_format(text.trim(), "text"));
                }
            }

            self.tokens.clear();
            self.cursor = 0;
            let mut start = None;
            for (i, c) in self.line.char_indices() {
                match (c.is_whitespace(), start) {
                    (false, None) => start = Some(i),
                    (true, Some(s)) => {
                        self.tokens.push((s, i));
                        start = None;
                    }
                    _ => {}
                }
            }
            if let Some(s) = start {
                self.tokens.push((s, self.line.len()));
            }
            if !self.tokens.is_empty() {
                return Ok(true);
            }
        }
    }

    fn next_token(&mut self) -> Result<&str, PlyError> {
        if self.cursor >= self.tokens.len() && !self.fill_line()? {
            return Err(PlyError::truncated(self.consumed));
        }
        let (start, end) = self.tokens[self.cursor];
        self.cursor += 1;
        Ok(&self.line[start..end])
    }
}

fn parse_token<T: FromStr>(token: &str, ty: ScalarType) -> Result<T, PlyError> {
    token
        .parse()
        .map_err(|_| PlyError::value_format(token, ty.name()))
}

impl<R: BufRead> RecordSource for AsciiSource<R> {
    fn begin_record(&mut self) -> Result<(), PlyError> {
        let leftover = self.tokens.len().saturating_sub(self.cursor);
        if leftover > 0 {
            tracing::trace!(
                "ignoring {} extra tokens at byte {}",
                leftover,
                self.line_offset
            );
        }
        if !self.fill_line()? {
            return Err(PlyError::truncated(self.consumed));
        }
        Ok(())
    }

    fn read_scalar(&mut self, ty: ScalarType) -> Result<Scalar, PlyError> {
        let token = self.next_token()?;
        Ok(match ty {
            ScalarType::I8 => Scalar::I8(parse_token(token, ty)?),
            ScalarType::U8 => Scalar::U8(parse_token(token, ty)?),
            ScalarType::I16 => Scalar::I16(parse_token(token, ty)?),
            ScalarType::U16 => Scalar::U16(parse_token(token, ty)?),
            ScalarType::I32 => Scalar::I32(parse_token(token, ty)?),
            ScalarType::U32 => Scalar::U32(parse_token(token, ty)?),
            ScalarType::I64 => Scalar::I64(parse_token(token, ty)?),
            ScalarType::U64 => Scalar::U64(parse_token(token, ty)?),
            ScalarType::F32 => Scalar::F32(parse_token(token, ty)?),
            ScalarType::F64 => Scalar::F64(parse_token(token, ty)?),
        })
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
            .with_property(Property::scalar("y", ScalarType::F32))
            .with_property(Property::scalar("red", ScalarType::U8))
    }

    fn read_all(text: &str, element: &Element) -> Result<Vec<crate::reader::Record>, PlyError> {
        let mut source = AsciiSource::new(Cursor::new(text.as_bytes()));
        ElementRecords::new(&mut source, element).collect()
    }

    #[test]
    fn test_one_record_per_line() {
        let records = read_all("0.5 -1 255\n\n  2e3\t4 0  \n", &vertex_element(2)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].values[1], Value::Scalar(Scalar::F32(-1.0)));
        assert_eq!(records[0].values[2], Value::Scalar(Scalar::U8(255)));
        assert_eq!(records[1].values[0], Value::Scalar(Scalar::F32(2000.0)));
    }

    #[test]
    fn test_extra_tokens_ignored() {
        let records = read_all("1 2 3 99 98\n4 5 6\n", &vertex_element(2)).unwrap();
        assert_eq!(records[1].values[0], Value::Scalar(Scalar::F32(4.0)));
    }

    #[test]
    fn test_record_split_across_lines() {
        let records = read_all("1 2\n3\n4 5 6\n", &vertex_element(2)).unwrap();
        assert_eq!(records[0].values[2], Value::Scalar(Scalar::U8(3)));
        assert_eq!(records[1].values[2], Value::Scalar(Scalar::U8(6)));
    }

    #[test]
    fn test_non_numeric_token() {
        let err = read_all("1 2 3\n4 five 6\n", &vertex_element(2)).unwrap_err();
        match err {
            PlyError::ValueFormat {
                element,
                record,
                value,
                expected,
            } => {
                assert_eq!(element, "vertex");
                assert_eq!(record, 1);
                assert_eq!(value, "five");
                assert_eq!(expected, "float");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_range_integer() {
        let err = read_all("1 2 256\n", &vertex_element(1)).unwrap_err();
        assert!(matches!(err, PlyError::ValueFormat { .. }));
    }

    #[test]
    fn test_invalid_utf8_line() {
        let mut source = AsciiSource::new(Cursor::new(b"1 2 3\n4 \xff 6\n".to_vec()));
        let element = vertex_element(2);
        let err = ElementRecords::new(&mut source, &element)
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        match err {
            PlyError::ValueFormat {
                element,
                record,
                value,
                expected,
            } => {
                assert_eq!(element, "vertex");
                assert_eq!(record, 1);
                assert_eq!(value, "4 \u{fffd} 6");
                assert_eq!(expected, "text");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_body() {
        let err = read_all("1 2 3\n4 5", &vertex_element(2)).unwrap_err();
        match err {
            PlyError::TruncatedData {
                element,
                record,
                offset,
            } => {
                assert_eq!(element, "vertex");
                assert_eq!(record, 1);
                assert_eq!(offset, 9);
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = read_all("1 2 3\n", &vertex_element(2)).unwrap_err();
        assert!(matches!(err, PlyError::TruncatedData { record: 1, .. }));
    }
}
