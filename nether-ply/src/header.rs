//! PLY header model and parser
//!
//! The header is line-oriented text:
//!
//! ```text
//! ply
//! format binary_little_endian 1.0
//! comment anything
//! element vertex 8
//! property float x
//! property list uchar int vertex_indices
//! end_header
//! ```
//!
//! Property order is significant: binary records are decoded positionally.

use std::fmt;
use std::io::{self, BufRead, Write};

use crate::error::PlyError;
use crate::{END_HEADER, PLY_MAGIC};

#[cfg(test)]
mod tests;

// =============================================================================
// Types
// =============================================================================

/// Byte order of multi-byte values in a binary body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the machine we are running on
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            Self::Little
        } else {
            Self::Big
        }
    }

    /// The other byte order
    pub const fn swapped(self) -> Self {
        match self {
            Self::Little => Self::Big,
            Self::Big => Self::Little,
        }
    }
}

/// Body encoding declared by the `format` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl Format {
    /// Binary format matching the host byte order
    pub const fn native_binary() -> Self {
        Self::binary(ByteOrder::native())
    }

    pub const fn binary(order: ByteOrder) -> Self {
        match order {
            ByteOrder::Little => Self::BinaryLittleEndian,
            ByteOrder::Big => Self::BinaryBigEndian,
        }
    }

    /// Byte order for binary formats, `None` for ASCII
    pub const fn byte_order(self) -> Option<ByteOrder> {
        match self {
            Self::Ascii => None,
            Self::BinaryLittleEndian => Some(ByteOrder::Little),
            Self::BinaryBigEndian => Some(ByteOrder::Big),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ascii" => Some(Self::Ascii),
            "binary_little_endian" => Some(Self::BinaryLittleEndian),
            "binary_big_endian" => Some(Self::BinaryBigEndian),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::BinaryLittleEndian => "binary_little_endian",
            Self::BinaryBigEndian => "binary_big_endian",
        }
    }
}

/// Primitive property type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarType {
    /// Parse a header type name, accepting both the classic and sized spellings
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "char" | "int8" => Some(Self::I8),
            "uchar" | "uint8" => Some(Self::U8),
            "short" | "int16" => Some(Self::I16),
            "ushort" | "uint16" => Some(Self::U16),
            "int" | "int32" => Some(Self::I32),
            "uint" | "uint32" => Some(Self::U32),
            "int64" => Some(Self::I64),
            "uint64" => Some(Self::U64),
            "float" | "float32" => Some(Self::F32),
            "double" | "float64" => Some(Self::F64),
            _ => None,
        }
    }

    /// Canonical header name
    pub const fn name(self) -> &'static str {
        match self {
            Self::I8 => "char",
            Self::U8 => "uchar",
            Self::I16 => "short",
            Self::U16 => "ushort",
            Self::I32 => "int",
            Self::U32 => "uint",
            Self::I64 => "int64",
            Self::U64 => "uint64",
            Self::F32 => "float",
            Self::F64 => "double",
        }
    }

    /// Encoded size in bytes
    pub const fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::F32 | Self::F64)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scalar or list property type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Scalar(ScalarType),
    List { count: ScalarType, item: ScalarType },
}

impl PropertyType {
    pub const fn is_list(self) -> bool {
        matches!(self, Self::List { .. })
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(ty) => write!(f, "{ty}"),
            Self::List { count, item } => write!(f, "list {count} {item}"),
        }
    }
}

/// One named, typed field of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub ty: PropertyType,
}

impl Property {
    pub fn scalar(name: &str, ty: ScalarType) -> Self {
        Self {
            name: name.to_string(),
            ty: PropertyType::Scalar(ty),
        }
    }

    pub fn list(name: &str, count: ScalarType, item: ScalarType) -> Self {
        Self {
            name: name.to_string(),
            ty: PropertyType::List { count, item },
        }
    }
}

/// Element kinds the mesh assembler understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Vertex,
    Face,
    Edge,
    /// Any other element (materials, tristrips, vendor data); read and discarded
    Other(String),
}

impl ElementKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "vertex" => Self::Vertex,
            "face" => Self::Face,
            "edge" => Self::Edge,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Element block declaration: name, record count and ordered schema
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub kind: ElementKind,
    pub count: usize,
    pub properties: Vec<Property>,
}

impl Element {
    pub fn new(name: &str, count: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: ElementKind::from_name(name),
            count,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Parsed PLY header
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub format: Format,
    pub version: String,
    pub comments: Vec<String>,
    pub obj_info: Vec<String>,
    pub elements: Vec<Element>,
}

impl Header {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            version: crate::PLY_VERSION.to_string(),
            comments: Vec::new(),
            obj_info: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// First element of the given kind
    pub fn element(&self, kind: &ElementKind) -> Option<&Element> {
        self.elements.iter().find(|e| &e.kind == kind)
    }

    /// Declared vertex count (0 when there is no vertex element)
    pub fn vertex_count(&self) -> usize {
        self.element(&ElementKind::Vertex).map_or(0, |e| e.count)
    }

    /// Serialize the header, including the `end_header` sentinel
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "{PLY_MAGIC}")?;
        writeln!(w, "format {} {}", self.format.name(), self.version)?;
        for comment in &self.comments {
            writeln!(w, "comment {comment}")?;
        }
        for info in &self.obj_info {
            writeln!(w, "obj_info {info}")?;
        }
        for element in &self.elements {
            writeln!(w, "element {} {}", element.name, element.count)?;
            for property in &element.properties {
                writeln!(w, "property {} {}", property.ty, property.name)?;
            }
        }
        writeln!(w, "{END_HEADER}")
    }
}

// =============================================================================
// Parser
// =============================================================================

/// Parse the header block, leaving `reader` positioned at the first body byte
pub fn parse_header<R: BufRead>(reader: &mut R) -> Result<Header, PlyError> {
    let mut lines = HeaderLines::new(reader);

    match lines.next_line()? {
        Some(line) if line == PLY_MAGIC => {}
        Some(_) => return Err(PlyError::malformed(1, "missing 'ply' magic")),
        None => return Err(PlyError::malformed(1, "empty file")),
    }

    let mut format: Option<(Format, String)> = None;
    let mut comments = Vec::new();
    let mut obj_info = Vec::new();
    let mut elements: Vec<Element> = Vec::new();

    loop {
        let Some(line) = lines.next_line()? else {
            return Err(PlyError::malformed(
                lines.line_no,
                format!("missing '{END_HEADER}'"),
            ));
        };
        let line_no = lines.line_no;

        let (keyword, rest) = split_keyword(&line);
        match keyword {
            "" => {}
            "comment" => comments.push(rest.to_string()),
            "obj_info" => obj_info.push(rest.to_string()),
            "format" => {
                if format.is_some() {
                    return Err(PlyError::malformed(line_no, "duplicate 'format' line"));
                }
                format = Some(parse_format(rest, line_no)?);
            }
            "element" => {
                let element = parse_element(rest, line_no)?;
                if !matches!(element.kind, ElementKind::Other(_))
                    && elements.iter().any(|e| e.kind == element.kind)
                {
                    return Err(PlyError::malformed(
                        line_no,
                        format!("duplicate element '{}'", element.name),
                    ));
                }
                elements.push(element);
            }
            "property" => {
                let Some(element) = elements.last_mut() else {
                    return Err(PlyError::malformed(
                        line_no,
                        "property declared before any element",
                    ));
                };
                let property = parse_property(rest, line_no)?;
                if element.property(&property.name).is_some() {
                    return Err(PlyError::malformed(
                        line_no,
                        format!(
                            "duplicate property '{}' in element '{}'",
                            property.name, element.name
                        ),
                    ));
                }
                element.properties.push(property);
            }
            END_HEADER => break,
            other => {
                return Err(PlyError::malformed(
                    line_no,
                    format!("unrecognized keyword '{other}'"),
                ));
            }
        }
    }

    let Some((format, version)) = format else {
        return Err(PlyError::malformed(lines.line_no, "missing 'format' line"));
    };

    tracing::debug!(
        "PLY header: format={}, {} elements, {} lines",
        format.name(),
        elements.len(),
        lines.line_no
    );

    Ok(Header {
        format,
        version,
        comments,
        obj_info,
        elements,
    })
}

/// Line iterator that tracks line numbers and rejects non-UTF-8 text
struct HeaderLines<'a, R> {
    reader: &'a mut R,
    buf: Vec<u8>,
    line_no: usize,
}

impl<'a, R: BufRead> HeaderLines<'a, R> {
    fn new(reader: &'a mut R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, PlyError> {
        self.buf.clear();
        // Reads stop at '\n' so a binary body stays untouched in the reader
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        let text = std::str::from_utf8(&self.buf)
            .map_err(|_| PlyError::malformed(self.line_no, "header line is not valid text"))?;
        Ok(Some(text.trim().to_string()))
    }
}

fn split_keyword(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    }
}

fn parse_format(rest: &str, line_no: usize) -> Result<(Format, String), PlyError> {
    let mut parts = rest.split_whitespace();
    let name = parts
        .next()
        .ok_or_else(|| PlyError::malformed(line_no, "format line has no encoding"))?;
    let format = Format::from_name(name)
        .ok_or_else(|| PlyError::malformed(line_no, format!("unknown format '{name}'")))?;
    let version = parts
        .next()
        .ok_or_else(|| PlyError::malformed(line_no, "format line has no version"))?;
    if version.parse::<f32>().is_err() {
        return Err(PlyError::malformed(
            line_no,
            format!("invalid format version '{version}'"),
        ));
    }
    Ok((format, version.to_string()))
}

fn parse_element(rest: &str, line_no: usize) -> Result<Element, PlyError> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let [name, count] = parts[..] else {
        return Err(PlyError::malformed(
            line_no,
            "expected 'element <name> <count>'",
        ));
    };
    let count: i64 = count
        .parse()
        .map_err(|_| PlyError::malformed(line_no, format!("invalid element count '{count}'")))?;
    if count < 0 {
        return Err(PlyError::malformed(
            line_no,
            format!("negative count {count} for element '{name}'"),
        ));
    }
    let count = usize::try_from(count)
        .map_err(|_| PlyError::malformed(line_no, format!("element count {count} too large")))?;
    Ok(Element::new(name, count))
}

fn parse_property(rest: &str, line_no: usize) -> Result<Property, PlyError> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts[..] {
        ["list", count, item, name] => {
            if item == "list" {
                return Err(PlyError::UnsupportedFeature(format!(
                    "nested list property '{name}'"
                )));
            }
            let count = parse_scalar_type(count, line_no)?;
            if !count.is_integer() {
                return Err(PlyError::malformed(
                    line_no,
                    format!("list count type '{count}' of property '{name}' is not an integer"),
                ));
            }
            let item = parse_scalar_type(item, line_no)?;
            Ok(Property::list(name, count, item))
        }
        ["list", _, "list", ..] => {
            let name = parts.last().copied().unwrap_or_default();
            Err(PlyError::UnsupportedFeature(format!(
                "nested list property '{name}'"
            )))
        }
        [ty, name] if ty != "list" => Ok(Property::scalar(name, parse_scalar_type(ty, line_no)?)),
        _ => Err(PlyError::malformed(
            line_no,
            format!("invalid property declaration '{rest}'"),
        )),
    }
}

fn parse_scalar_type(name: &str, line_no: usize) -> Result<ScalarType, PlyError> {
    ScalarType::from_name(name)
        .ok_or_else(|| PlyError::malformed(line_no, format!("unknown property type '{name}'")))
}
