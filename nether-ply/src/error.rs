//! Error types for PLY reading and writing

use std::io;

/// Errors that can occur when reading or writing PLY files
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    /// Header is unparseable or inconsistent
    #[error("malformed header at line {line}: {reason}")]
    MalformedHeader { line: usize, reason: String },

    /// Stream ended before the declared element counts were satisfied
    #[error("truncated data in {element} record {record} at byte {offset}")]
    TruncatedData {
        element: String,
        record: usize,
        offset: u64,
    },

    /// A value could not be interpreted as its declared type
    #[error("invalid value {value:?} in {element} record {record} (expected {expected})")]
    ValueFormat {
        element: String,
        record: usize,
        value: String,
        expected: String,
    },

    /// Declared property/type combination that cannot be mapped into a mesh
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Face or edge references a vertex that does not exist
    #[error("{element} record {record} references vertex {index}, but only {vertex_count} vertices exist")]
    IndexOutOfRange {
        element: String,
        record: usize,
        index: i64,
        vertex_count: usize,
    },

    /// Model handed to the writer breaks its own invariants
    #[error("invalid mesh: {0}")]
    InvalidModel(String),

    /// Underlying storage failure
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl PlyError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn truncated(offset: u64) -> Self {
        Self::TruncatedData {
            element: String::new(),
            record: 0,
            offset,
        }
    }

    pub(crate) fn value_format(value: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::ValueFormat {
            element: String::new(),
            record: 0,
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Attach element name and record index to a decoding error.
    ///
    /// Low-level readers do not know which record they are decoding, so the
    /// record reader fills this in on the way out.
    pub(crate) fn at_record(mut self, name: &str, index: usize) -> Self {
        match &mut self {
            Self::TruncatedData {
                element, record, ..
            }
            | Self::ValueFormat {
                element, record, ..
            } => {
                *element = name.to_string();
                *record = index;
            }
            _ => {}
        }
        self
    }
}
