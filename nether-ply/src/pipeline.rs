//! File-level import and export
//!
//! Opens files, picks the body decoder from the header, drives the assembler
//! and hands the result to a [`MeshBuilder`].

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::assembler::MeshAssembler;
use crate::builder::{MeshBuilder, ModelBuilder};
use crate::error::PlyError;
use crate::header::{Header, parse_header};
use crate::model::MeshModel;
use crate::options::PlyOptions;
use crate::reader::{AsciiSource, BinarySource, ElementRecords, RecordSource};
use crate::writer::write_mesh;
use crate::{MERGE_DISTANCE, NORMAL_ATTRIBUTE};

/// Source of meshes for [`export_scene`]
pub trait SceneProvider {
    /// Meshes to export; only selected ones when `selected_only` is set
    fn meshes(&self, selected_only: bool) -> Vec<MeshModel>;
}

/// Read just the header of a PLY file
pub fn read_header_from_path(path: &Path) -> Result<Header, PlyError> {
    let mut reader = BufReader::new(File::open(path)?);
    parse_header(&mut reader)
}

/// Decode a complete PLY stream into a model, without post-processing
pub fn read_mesh<R: BufRead>(reader: &mut R) -> Result<(Header, MeshModel), PlyError> {
    let header = parse_header(reader)?;
    let mut assembler = MeshAssembler::new(&header)?;

    match header.format.byte_order() {
        None => decode_body(&mut AsciiSource::new(reader), &header, &mut assembler)?,
        Some(order) => decode_body(&mut BinarySource::new(reader, order), &header, &mut assembler)?,
    }

    Ok((header, assembler.finish()))
}

fn decode_body<S: RecordSource>(
    source: &mut S,
    header: &Header,
    assembler: &mut MeshAssembler,
) -> Result<(), PlyError> {
    for (i, element) in header.elements.iter().enumerate() {
        tracing::debug!("decoding {} {} records", element.count, element.name);
        let mut records = ElementRecords::new(&mut *source, element);
        if assembler.is_skipped(i) {
            records.skip_remaining()?;
            continue;
        }
        for record in records {
            assembler.ingest(i, element, &record?)?;
        }
    }
    Ok(())
}

/// Import a PLY file as a [`MeshModel`]
pub fn import_mesh(path: &Path, options: &PlyOptions) -> Result<MeshModel, PlyError> {
    import_mesh_with::<ModelBuilder>(path, options)
}

/// Import a PLY file through a host [`MeshBuilder`]
///
/// Post-processing runs in a fixed order: custom normals, the optional
/// `Normal` attribute, then vertex welding.
pub fn import_mesh_with<B: MeshBuilder>(
    path: &Path,
    options: &PlyOptions,
) -> Result<B::Mesh, PlyError> {
    let mut reader = BufReader::new(File::open(path)?);
    let (header, mut model) = read_mesh(&mut reader)?;

    tracing::info!(
        "Imported {:?} ({}): {} vertices, {} faces, {} edges",
        path,
        header.format.name(),
        model.vertex_count(),
        model.faces.len(),
        model.edges.len()
    );

    let normals = model.normals.take();
    let mut builder = B::from_model(model);
    if let Some(normals) = &normals {
        builder.apply_custom_normals(normals);
        if options.import_normals_as_attribute {
            builder.add_vertex_attribute(NORMAL_ATTRIBUTE, normals);
        }
    }
    if options.merge_verts_on_import {
        builder.merge_nearby_vertices(MERGE_DISTANCE);
    }
    Ok(builder.finish())
}

/// Export a model to a PLY file
pub fn export_mesh(path: &Path, model: &MeshModel, options: &PlyOptions) -> Result<(), PlyError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_mesh(&mut writer, model, options)?;
    writer.flush()?;

    tracing::info!(
        "Exported {:?}: {} vertices, {} faces",
        path,
        model.vertex_count(),
        model.faces.len()
    );
    Ok(())
}

/// Join every mesh the scene provides and export them as one model
pub fn export_scene<P: SceneProvider>(
    path: &Path,
    scene: &P,
    options: &PlyOptions,
) -> Result<(), PlyError> {
    let meshes = scene.meshes(options.export_selected_only);
    let mut joined = MeshModel::new();
    for mesh in &meshes {
        joined.append(mesh);
    }
    tracing::debug!("joined {} meshes for export", meshes.len());
    export_mesh(path, &joined, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_mesh_ascii() {
        let text = "ply\n\
                    format ascii 1.0\n\
                    element vertex 3\n\
                    property float x\n\
                    property float y\n\
                    property float z\n\
                    element face 1\n\
                    property list uchar int vertex_indices\n\
                    end_header\n\
                    0 0 0\n\
                    1 0 0\n\
                    0 1 0\n\
                    3 0 1 2\n";
        let (header, mesh) = read_mesh(&mut Cursor::new(text)).unwrap();
        assert_eq!(header.vertex_count(), 3);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2]]);
        assert_eq!(mesh.edges.len(), 3);
    }

    #[test]
    fn test_read_mesh_truncated() {
        let mut data = b"ply\n\
                         format binary_little_endian 1.0\n\
                         element vertex 2\n\
                         property float x\n\
                         end_header\n"
            .to_vec();
        data.extend_from_slice(&1.0f32.to_le_bytes());
        data.extend_from_slice(&[0, 0]);

        match read_mesh(&mut Cursor::new(data)) {
            Err(PlyError::TruncatedData {
                element,
                record,
                offset,
            }) => {
                assert_eq!(element, "vertex");
                assert_eq!(record, 1);
                assert_eq!(offset, 4);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_huge_vertex_count_is_truncation() {
        let text = "ply\n\
                    format ascii 1.0\n\
                    element vertex 2000000000000000000\n\
                    property float x\n\
                    end_header\n\
                    0\n";
        match read_mesh(&mut Cursor::new(text)) {
            Err(PlyError::TruncatedData {
                element, record, ..
            }) => {
                assert_eq!(element, "vertex");
                assert_eq!(record, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let mut data = b"ply\n\
                         format binary_little_endian 1.0\n\
                         element vertex 10000000000\n\
                         property float x\n\
                         property float y\n\
                         property float z\n\
                         property uchar red\n\
                         end_header\n"
            .to_vec();
        data.extend_from_slice(&[0; 13]);
        assert!(matches!(
            read_mesh(&mut Cursor::new(data)),
            Err(PlyError::TruncatedData {
                record: 1,
                offset: 13,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_element_before_faces() {
        let text = "ply\n\
                    format ascii 1.0\n\
                    element vertex 3\n\
                    property float x\n\
                    property float y\n\
                    property float z\n\
                    element material 2\n\
                    property list uchar int refs\n\
                    element face 1\n\
                    property list uchar int vertex_indices\n\
                    end_header\n\
                    0 0 0\n\
                    1 0 0\n\
                    0 1 0\n\
                    2 9 9\n\
                    0\n\
                    3 2 1 0\n";
        let (_, mesh) = read_mesh(&mut Cursor::new(text)).unwrap();
        assert_eq!(mesh.faces, vec![vec![2, 1, 0]]);
    }
}
