//! Tests for header parsing and serialization

use std::io::{BufRead, Cursor, Read};

use super::*;

fn parse(text: &str) -> Result<Header, PlyError> {
    parse_header(&mut Cursor::new(text.as_bytes()))
}

const CUBE_HEADER: &str = "ply
format ascii 1.0
comment made by hand
element vertex 8
property float x
property float y
property float z
property uchar red
element face 6
property list uchar int vertex_indices
end_header
";

#[test]
fn test_parse_basic_header() {
    let header = parse(CUBE_HEADER).unwrap();
    assert_eq!(header.format, Format::Ascii);
    assert_eq!(header.version, "1.0");
    assert_eq!(header.comments, vec!["made by hand".to_string()]);
    assert_eq!(header.elements.len(), 2);

    let vertex = &header.elements[0];
    assert_eq!(vertex.kind, ElementKind::Vertex);
    assert_eq!(vertex.count, 8);
    let names: Vec<&str> = vertex.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["x", "y", "z", "red"]);
    assert_eq!(vertex.properties[3].ty, PropertyType::Scalar(ScalarType::U8));

    let face = &header.elements[1];
    assert_eq!(face.kind, ElementKind::Face);
    assert_eq!(
        face.properties[0].ty,
        PropertyType::List {
            count: ScalarType::U8,
            item: ScalarType::I32,
        }
    );
    assert_eq!(header.vertex_count(), 8);
}

#[test]
fn test_parse_leaves_body_in_reader() {
    let text = "ply\nformat binary_little_endian 1.0\nelement vertex 1\nproperty uchar v\nend_header\n\x07\x08";
    let mut cursor = Cursor::new(text.as_bytes());
    let header = parse_header(&mut cursor).unwrap();
    assert_eq!(header.format, Format::BinaryLittleEndian);

    let mut rest = Vec::new();
    cursor.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, [7, 8]);
}

#[test]
fn test_comments_anywhere() {
    let header = parse(
        "ply\ncomment before format\nformat binary_big_endian 1.0\nelement vertex 0\ncomment between\nproperty double x\nobj_info scanner 3\nend_header\n",
    )
    .unwrap();
    assert_eq!(header.format, Format::BinaryBigEndian);
    assert_eq!(header.comments.len(), 2);
    assert_eq!(header.obj_info, vec!["scanner 3".to_string()]);
    assert_eq!(header.elements[0].properties.len(), 1);
}

#[test]
fn test_sized_type_names() {
    let header = parse(
        "ply\nformat ascii 1.0\nelement vertex 1\nproperty float32 x\nproperty uint8 red\nproperty int64 id\nelement face 0\nproperty list uint8 uint32 vertex_indices\nend_header\n",
    )
    .unwrap();
    let vertex = &header.elements[0];
    assert_eq!(vertex.properties[0].ty, PropertyType::Scalar(ScalarType::F32));
    assert_eq!(vertex.properties[1].ty, PropertyType::Scalar(ScalarType::U8));
    assert_eq!(vertex.properties[2].ty, PropertyType::Scalar(ScalarType::I64));
}

#[test]
fn test_crlf_line_endings() {
    let header = parse("ply\r\nformat ascii 1.0\r\nelement vertex 2\r\nproperty float x\r\nend_header\r\n")
        .unwrap();
    assert_eq!(header.vertex_count(), 2);
}

#[test]
fn test_unknown_element_kept() {
    let header = parse(
        "ply\nformat ascii 1.0\nelement material 2\nproperty uchar ambient_red\nend_header\n",
    )
    .unwrap();
    assert_eq!(
        header.elements[0].kind,
        ElementKind::Other("material".to_string())
    );
}

// =============================================================================
// Failures
// =============================================================================

fn malformed_line(result: Result<Header, PlyError>) -> usize {
    match result {
        Err(PlyError::MalformedHeader { line, .. }) => line,
        Err(other) => panic!("expected malformed header, got {other}"),
        Ok(_) => panic!("expected malformed header, got Ok"),
    }
}

#[test]
fn test_missing_magic() {
    assert_eq!(malformed_line(parse("plx\nformat ascii 1.0\nend_header\n")), 1);
    assert_eq!(malformed_line(parse("")), 1);
}

#[test]
fn test_unrecognized_keyword() {
    assert_eq!(
        malformed_line(parse("ply\nformat ascii 1.0\nelemnt vertex 3\nend_header\n")),
        3
    );
}

#[test]
fn test_unknown_property_type() {
    assert_eq!(
        malformed_line(parse(
            "ply\nformat ascii 1.0\nelement vertex 3\nproperty half x\nend_header\n"
        )),
        4
    );
}

#[test]
fn test_negative_count() {
    let err = parse("ply\nformat ascii 1.0\nelement vertex -1\nend_header\n").unwrap_err();
    assert!(err.to_string().contains("negative count"));
}

#[test]
fn test_missing_sentinel() {
    assert_eq!(
        malformed_line(parse("ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\n")),
        4
    );
}

#[test]
fn test_missing_format() {
    assert!(matches!(
        parse("ply\nelement vertex 1\nend_header\n"),
        Err(PlyError::MalformedHeader { .. })
    ));
}

#[test]
fn test_unknown_format() {
    assert_eq!(
        malformed_line(parse("ply\nformat binary_middle_endian 1.0\nend_header\n")),
        2
    );
}

#[test]
fn test_property_before_element() {
    assert_eq!(
        malformed_line(parse("ply\nformat ascii 1.0\nproperty float x\nend_header\n")),
        3
    );
}

#[test]
fn test_duplicate_property() {
    assert_eq!(
        malformed_line(parse(
            "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty double x\nend_header\n"
        )),
        5
    );
}

#[test]
fn test_float_list_count_rejected() {
    assert_eq!(
        malformed_line(parse(
            "ply\nformat ascii 1.0\nelement face 1\nproperty list float int vertex_indices\nend_header\n"
        )),
        4
    );
}

#[test]
fn test_nested_list_unsupported() {
    let err = parse(
        "ply\nformat ascii 1.0\nelement face 1\nproperty list uchar list uchar int nested\nend_header\n",
    )
    .unwrap_err();
    assert!(matches!(err, PlyError::UnsupportedFeature(_)));
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn test_write_then_parse() {
    let mut header = Header::new(Format::BinaryBigEndian);
    header.comments.push("round trip".to_string());
    header.elements.push(
        Element::new("vertex", 3)
            .with_property(Property::scalar("x", ScalarType::F32))
            .with_property(Property::scalar("confidence", ScalarType::F64)),
    );
    header.elements.push(
        Element::new("face", 1).with_property(Property::list(
            "vertex_indices",
            ScalarType::U8,
            ScalarType::U32,
        )),
    );

    let mut bytes = Vec::new();
    header.write_to(&mut bytes).unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.starts_with("ply\nformat binary_big_endian 1.0\n"));
    assert!(text.contains("property list uchar uint vertex_indices\n"));
    assert!(text.ends_with("end_header\n"));

    let mut cursor = Cursor::new(bytes);
    let parsed = parse_header(&mut cursor).unwrap();
    assert_eq!(parsed, header);
    assert!(cursor.fill_buf().unwrap().is_empty());
}

#[test]
fn test_byte_order_helpers() {
    assert_eq!(ByteOrder::Little.swapped(), ByteOrder::Big);
    assert_eq!(Format::native_binary().byte_order(), Some(ByteOrder::native()));
    assert_eq!(Format::Ascii.byte_order(), None);
}
