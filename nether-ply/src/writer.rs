//! PLY writer
//!
//! Turns a [`MeshModel`] into a header plus one record per vertex, face and
//! loose edge. Binary output is always in host byte order.

use std::io::{self, Write};

use hashbrown::HashSet;

use crate::error::PlyError;
use crate::header::{Element, Format, Header, Property, ScalarType};
use crate::model::{MeshModel, face_edges, unordered};
use crate::options::PlyOptions;

// =============================================================================
// Record writers
// =============================================================================

/// Encodes primitive values for one body encoding
pub trait RecordWriter {
    fn write_u8(&mut self, value: u8) -> io::Result<()>;
    fn write_i32(&mut self, value: i32) -> io::Result<()>;
    fn write_u32(&mut self, value: u32) -> io::Result<()>;
    fn write_f32(&mut self, value: f32) -> io::Result<()>;

    fn write_f32s(&mut self, values: &[f32]) -> io::Result<()> {
        values.iter().try_for_each(|&v| self.write_f32(v))
    }

    /// Called after the last value of every record
    fn end_record(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Space-separated values, one record per line
pub struct AsciiWriter<W> {
    inner: W,
    at_line_start: bool,
}

impl<W: Write> AsciiWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            at_line_start: true,
        }
    }

    fn write_token(&mut self, token: impl std::fmt::Display) -> io::Result<()> {
        if !self.at_line_start {
            self.inner.write_all(b" ")?;
        }
        self.at_line_start = false;
        write!(self.inner, "{token}")
    }
}

impl<W: Write> RecordWriter for AsciiWriter<W> {
    fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.write_token(value)
    }

    fn write_i32(&mut self, value: i32) -> io::Result<()> {
        self.write_token(value)
    }

    fn write_u32(&mut self, value: u32) -> io::Result<()> {
        self.write_token(value)
    }

    fn write_f32(&mut self, value: f32) -> io::Result<()> {
        self.write_token(value)
    }

    fn end_record(&mut self) -> io::Result<()> {
        self.at_line_start = true;
        self.inner.write_all(b"\n")
    }
}

/// Packed native-order values
pub struct BinaryWriter<W> {
    inner: W,
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> RecordWriter for BinaryWriter<W> {
    fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.inner.write_all(&[value])
    }

    fn write_i32(&mut self, value: i32) -> io::Result<()> {
        self.inner.write_all(bytemuck::bytes_of(&value))
    }

    fn write_u32(&mut self, value: u32) -> io::Result<()> {
        self.inner.write_all(bytemuck::bytes_of(&value))
    }

    fn write_f32(&mut self, value: f32) -> io::Result<()> {
        self.inner.write_all(bytemuck::bytes_of(&value))
    }

    fn write_f32s(&mut self, values: &[f32]) -> io::Result<()> {
        self.inner.write_all(bytemuck::cast_slice(values))
    }
}

// =============================================================================
// Export plan
// =============================================================================

/// Export-ready vertex streams
///
/// UVs are stored per corner in the model but written per vertex, so a vertex
/// referenced with several distinct UVs becomes one output vertex per UV.
#[derive(Debug)]
struct ExportPlan {
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    uvs: Option<Vec<[f32; 2]>>,
    colors: Option<Vec<[u8; 4]>>,
    faces: Vec<Vec<u32>>,
    loose_edges: Vec<[u32; 2]>,
}

impl ExportPlan {
    fn new(model: &MeshModel, options: &PlyOptions) -> Self {
        let corner_uvs = model.uvs.as_deref().filter(|_| options.export_uvs);

        // Distinct UVs per vertex in first-use order, and which one each corner uses
        let mut variants: Vec<Vec<[f32; 2]>> = vec![Vec::new(); model.vertex_count()];
        let mut corner_variant = Vec::with_capacity(model.corner_count());
        if let Some(uvs) = corner_uvs {
            for (&v, &uv) in model.faces.iter().flatten().zip(uvs) {
                let seen = &mut variants[v as usize];
                let k = match seen.iter().position(|&u| same_uv(u, uv)) {
                    Some(k) => k,
                    None => {
                        seen.push(uv);
                        seen.len() - 1
                    }
                };
                corner_variant.push(k as u32);
            }
        }

        let mut first_copy = Vec::with_capacity(model.vertex_count());
        let mut sources = Vec::with_capacity(model.vertex_count());
        let mut vertex_uvs = Vec::with_capacity(model.vertex_count());
        for (v, seen) in variants.iter().enumerate() {
            first_copy.push(sources.len() as u32);
            for k in 0..seen.len().max(1) {
                sources.push(v);
                vertex_uvs.push(seen.get(k).copied().unwrap_or([0.0; 2]));
            }
        }
        if sources.len() > model.vertex_count() {
            tracing::debug!(
                "split {} vertices with multiple UVs",
                sources.len() - model.vertex_count()
            );
        }

        let scale = options.global_scale;
        let positions = sources
            .iter()
            .map(|&v| model.positions[v].map(|c| c * scale))
            .collect();
        let normals = model
            .normals
            .as_ref()
            .filter(|_| options.export_normals)
            .map(|normals| sources.iter().map(|&v| normals[v]).collect());
        let colors = model
            .colors
            .as_ref()
            .filter(|_| options.export_colors)
            .map(|colors| sources.iter().map(|&v| colors[v].map(color_byte)).collect());

        let mut corner = 0;
        let faces = model
            .faces
            .iter()
            .map(|face| {
                face.iter()
                    .map(|&v| {
                        let copy = corner_variant.get(corner).copied().unwrap_or(0);
                        corner += 1;
                        first_copy[v as usize] + copy
                    })
                    .collect()
            })
            .collect();

        let boundary: HashSet<(u32, u32)> = face_edges(&model.faces)
            .iter()
            .map(|&[a, b]| unordered(a, b))
            .collect();
        let loose_edges = model
            .edges
            .iter()
            .filter(|&&[a, b]| !boundary.contains(&unordered(a, b)))
            .map(|&[a, b]| [first_copy[a as usize], first_copy[b as usize]])
            .collect();

        Self {
            positions,
            normals,
            uvs: corner_uvs.map(|_| vertex_uvs),
            colors,
            faces,
            loose_edges,
        }
    }

    /// Face count type: `uchar` unless some face has more than 255 corners
    fn face_count_type(&self) -> ScalarType {
        if self.faces.iter().any(|f| f.len() > u8::MAX as usize) {
            ScalarType::U32
        } else {
            ScalarType::U8
        }
    }

    fn header(&self, format: Format) -> Header {
        let mut vertex = Element::new("vertex", self.positions.len())
            .with_property(Property::scalar("x", ScalarType::F32))
            .with_property(Property::scalar("y", ScalarType::F32))
            .with_property(Property::scalar("z", ScalarType::F32));
        if self.normals.is_some() {
            for name in ["nx", "ny", "nz"] {
                vertex = vertex.with_property(Property::scalar(name, ScalarType::F32));
            }
        }
        if self.uvs.is_some() {
            for name in ["s", "t"] {
                vertex = vertex.with_property(Property::scalar(name, ScalarType::F32));
            }
        }
        if self.colors.is_some() {
            for name in ["red", "green", "blue", "alpha"] {
                vertex = vertex.with_property(Property::scalar(name, ScalarType::U8));
            }
        }

        let face = Element::new("face", self.faces.len()).with_property(Property::list(
            "vertex_indices",
            self.face_count_type(),
            ScalarType::U32,
        ));

        let mut header = Header::new(format);
        header.comments.push(format!(
            "Exported by nether-ply {}",
            env!("CARGO_PKG_VERSION")
        ));
        header.elements.push(vertex);
        header.elements.push(face);
        if !self.loose_edges.is_empty() {
            header.elements.push(
                Element::new("edge", self.loose_edges.len())
                    .with_property(Property::scalar("vertex1", ScalarType::I32))
                    .with_property(Property::scalar("vertex2", ScalarType::I32)),
            );
        }
        header
    }

    fn write_body<R: RecordWriter>(&self, out: &mut R) -> io::Result<()> {
        for (i, position) in self.positions.iter().enumerate() {
            out.write_f32s(position)?;
            if let Some(normals) = &self.normals {
                out.write_f32s(&normals[i])?;
            }
            if let Some(uvs) = &self.uvs {
                out.write_f32s(&uvs[i])?;
            }
            if let Some(colors) = &self.colors {
                for &channel in &colors[i] {
                    out.write_u8(channel)?;
                }
            }
            out.end_record()?;
        }

        let wide_counts = self.face_count_type() == ScalarType::U32;
        for face in &self.faces {
            if wide_counts {
                out.write_u32(face.len() as u32)?;
            } else {
                out.write_u8(face.len() as u8)?;
            }
            for &v in face {
                out.write_u32(v)?;
            }
            out.end_record()?;
        }

        for &[a, b] in &self.loose_edges {
            out.write_i32(a as i32)?;
            out.write_i32(b as i32)?;
            out.end_record()?;
        }
        Ok(())
    }
}

fn same_uv(a: [f32; 2], b: [f32; 2]) -> bool {
    a[0].to_bits() == b[0].to_bits() && a[1].to_bits() == b[1].to_bits()
}

fn color_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

// =============================================================================
// Entry point
// =============================================================================

/// Write `model` as a complete PLY stream
///
/// The format is ASCII when `options.ascii_format` is set, otherwise binary in
/// host byte order.
pub fn write_mesh<W: Write>(
    writer: &mut W,
    model: &MeshModel,
    options: &PlyOptions,
) -> Result<(), PlyError> {
    model.validate().map_err(PlyError::InvalidModel)?;

    let plan = ExportPlan::new(model, options);
    let format = if options.ascii_format {
        Format::Ascii
    } else {
        Format::native_binary()
    };

    plan.header(format).write_to(writer)?;
    match format {
        Format::Ascii => plan.write_body(&mut AsciiWriter::new(&mut *writer))?,
        _ => plan.write_body(&mut BinaryWriter::new(&mut *writer))?,
    }

    tracing::debug!(
        "wrote {} vertices, {} faces, {} loose edges ({})",
        plan.positions.len(),
        plan.faces.len(),
        plan.loose_edges.len(),
        format.name()
    );
    Ok(())
}
