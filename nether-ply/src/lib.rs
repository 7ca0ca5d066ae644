//! Nether-PLY: PLY polygon mesh reader and writer for Nethercore asset tooling
//!
//! Reads ASCII and binary (either byte order) PLY files into a neutral
//! [`MeshModel`], and writes models back out as ASCII or native-order binary.
//!
//! # Key Features
//!
//! - **Streaming decode**: one pass over the body, one record at a time
//! - **Lenient schemas**: unknown properties and elements are decoded and skipped
//! - **Mesh attributes**: positions, normals, RGBA colors, UVs, faces, edges
//! - **Host integration**: [`MeshBuilder`] receives the model for welding and custom normals
//!
//! # PLY Format Overview
//!
//! A PLY file is a text header followed by a body:
//! - `ply` magic and a `format` line (ascii, binary_little_endian, binary_big_endian)
//! - `element <name> <count>` blocks, each followed by `property` declarations
//! - `end_header`, then every element's records in declaration order
//!
//! # Usage
//!
//! ```ignore
//! use nether_ply::{import_mesh, export_mesh, PlyOptions};
//! use std::path::Path;
//!
//! let options = PlyOptions::default();
//! let mesh = import_mesh(Path::new("bunny.ply"), &options).unwrap();
//! println!("{} vertices, {} faces", mesh.vertex_count(), mesh.faces.len());
//!
//! export_mesh(Path::new("bunny_binary.ply"), &mesh, &options).unwrap();
//! ```

mod assembler;
mod builder;
mod error;
mod header;
mod layout;
mod model;
mod options;
mod pipeline;
mod reader;
mod writer;

pub use assembler::MeshAssembler;
pub use builder::{MeshBuilder, ModelBuilder};
pub use error::PlyError;
pub use header::{
    ByteOrder, Element, ElementKind, Format, Header, Property, PropertyType, ScalarType,
    parse_header,
};
pub use model::{MeshModel, VertexAttribute};
pub use options::PlyOptions;
pub use pipeline::{
    SceneProvider, export_mesh, export_scene, import_mesh, import_mesh_with, read_header_from_path,
    read_mesh,
};
pub use reader::{
    AsciiSource, BinarySource, ByteReader, ElementRecords, Record, RecordSource, Scalar, Value,
};
pub use writer::{AsciiWriter, BinaryWriter, RecordWriter, write_mesh};

// =============================================================================
// Constants
// =============================================================================

/// First header line of every PLY file
pub const PLY_MAGIC: &str = "ply";

/// Header terminator line
pub const END_HEADER: &str = "end_header";

/// Format version written on export
pub const PLY_VERSION: &str = "1.0";

/// Weld distance used when `merge_verts_on_import` is set
pub const MERGE_DISTANCE: f32 = 0.0001;

/// Name of the vertex attribute that receives imported normals
pub const NORMAL_ATTRIBUTE: &str = "Normal";
