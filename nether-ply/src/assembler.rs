//! Builds a [`MeshModel`] from decoded records
//!
//! Per-vertex buffers gain one zeroed entry per vertex record, so components a
//! file never declares stay zero.

use hashbrown::HashSet;

use crate::error::PlyError;
use crate::header::{Element, Header};
use crate::layout::{EdgeLayout, ElementLayout, FaceLayout, VertexLayout, VertexSlot};
use crate::model::{MeshModel, face_edges, unordered};
use crate::reader::{Record, Scalar};

/// Upper bound on vertex capacity reserved before any record is read
const PREALLOC_VERTICES: usize = 1 << 16;

pub struct MeshAssembler {
    layouts: Vec<ElementLayout>,
    vertex_count: usize,
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    colors: Option<Vec<[f32; 4]>>,
    default_alpha: f32,
    vertex_uvs: Option<Vec<[f32; 2]>>,
    faces: Vec<Vec<u32>>,
    corner_uvs: Option<Vec<[f32; 2]>>,
    /// `Some` once an edge block has been seen
    edges: Option<Vec<[u32; 2]>>,
    dropped_faces: usize,
}

impl MeshAssembler {
    /// Resolve every element's dispatch table and reserve vertex buffers
    pub fn new(header: &Header) -> Result<Self, PlyError> {
        let layouts = header
            .elements
            .iter()
            .map(ElementLayout::resolve)
            .collect::<Result<Vec<_>, _>>()?;

        let vertex_count = header.vertex_count();
        let vertex = layouts.iter().find_map(|l| match l {
            ElementLayout::Vertex(v) => Some(v),
            _ => None,
        });
        let face = layouts.iter().find_map(|l| match l {
            ElementLayout::Face(f) => Some(f),
            _ => None,
        });

        // Capacity is a hint; buffers grow as vertex records actually arrive
        let reserve = vertex_count.min(PREALLOC_VERTICES);
        let normals = vertex
            .filter(|v| v.has_normals)
            .map(|_| Vec::with_capacity(reserve));
        let colors = vertex
            .filter(|v| v.has_colors)
            .map(|_| Vec::with_capacity(reserve));
        let default_alpha = if vertex.is_some_and(|v| v.has_alpha) { 0.0 } else { 1.0 };
        let vertex_uvs = vertex
            .filter(|v| v.has_uvs)
            .map(|_| Vec::with_capacity(reserve));
        let corner_uvs = face.and_then(|f| f.texcoords).map(|_| Vec::new());

        Ok(Self {
            layouts,
            vertex_count,
            positions: Vec::with_capacity(reserve),
            normals,
            colors,
            default_alpha,
            vertex_uvs,
            faces: Vec::new(),
            corner_uvs,
            edges: None,
            dropped_faces: 0,
        })
    }

    /// Whether records of the `element_index`-th element are discarded
    pub fn is_skipped(&self, element_index: usize) -> bool {
        matches!(self.layouts.get(element_index), Some(ElementLayout::Skip) | None)
    }

    /// Route one record of `element` (the `element_index`-th header element)
    pub fn ingest(
        &mut self,
        element_index: usize,
        element: &Element,
        record: &Record,
    ) -> Result<(), PlyError> {
        // Taken out so the handlers can borrow `self` mutably
        let layout = std::mem::replace(&mut self.layouts[element_index], ElementLayout::Skip);
        let result = match &layout {
            ElementLayout::Vertex(v) => {
                self.ingest_vertex(v, record);
                Ok(())
            }
            ElementLayout::Face(f) => self.ingest_face(f, element, record),
            ElementLayout::Edge(e) => self.ingest_edge(e, element, record),
            ElementLayout::Skip => Ok(()),
        };
        self.layouts[element_index] = layout;
        result
    }

    fn ingest_vertex(&mut self, layout: &VertexLayout, record: &Record) {
        let i = record.index;
        if i >= self.vertex_count || i != self.positions.len() {
            return;
        }
        self.positions.push([0.0; 3]);
        if let Some(normals) = &mut self.normals {
            normals.push([0.0; 3]);
        }
        if let Some(colors) = &mut self.colors {
            colors.push([0.0, 0.0, 0.0, self.default_alpha]);
        }
        if let Some(uvs) = &mut self.vertex_uvs {
            uvs.push([0.0; 2]);
        }
        for (slot, value) in layout.slots.iter().zip(&record.values) {
            let (Some(slot), Some(value)) = (slot, value.as_scalar()) else {
                continue;
            };
            match *slot {
                VertexSlot::Position(axis) => self.positions[i][axis] = value.to_f32(),
                VertexSlot::Normal(axis) => {
                    if let Some(normals) = &mut self.normals {
                        normals[i][axis] = value.to_f32();
                    }
                }
                VertexSlot::Color(channel) => {
                    if let Some(colors) = &mut self.colors {
                        colors[i][channel] = color_component(value);
                    }
                }
                VertexSlot::Uv(axis) => {
                    if let Some(uvs) = &mut self.vertex_uvs {
                        uvs[i][axis] = value.to_f32();
                    }
                }
            }
        }
    }

    fn ingest_face(
        &mut self,
        layout: &FaceLayout,
        element: &Element,
        record: &Record,
    ) -> Result<(), PlyError> {
        let Some(items) = layout
            .indices
            .and_then(|i| record.values.get(i))
            .and_then(|v| v.as_list())
        else {
            return Ok(());
        };

        let corners = items
            .iter()
            .map(|&s| checked_index(s, self.vertex_count, element, record.index))
            .collect::<Result<Vec<u32>, _>>()?;

        if corners.len() < 3 {
            self.dropped_faces += 1;
            return Ok(());
        }

        if let Some(uvs) = &mut self.corner_uvs {
            let coords = layout
                .texcoords
                .and_then(|i| record.values.get(i))
                .and_then(|v| v.as_list())
                .unwrap_or_default();
            if coords.len() == corners.len() * 2 {
                uvs.extend(coords.chunks_exact(2).map(|c| [c[0].to_f32(), c[1].to_f32()]));
            } else {
                tracing::warn!(
                    "{} record {}: texcoord has {} values for {} corners",
                    element.name,
                    record.index,
                    coords.len(),
                    corners.len()
                );
                uvs.extend(std::iter::repeat_n([0.0; 2], corners.len()));
            }
        }

        self.faces.push(corners);
        Ok(())
    }

    fn ingest_edge(
        &mut self,
        layout: &EdgeLayout,
        element: &Element,
        record: &Record,
    ) -> Result<(), PlyError> {
        let edges = self.edges.get_or_insert_with(Vec::new);
        let (Some(first), Some(second)) = (layout.first, layout.second) else {
            return Ok(());
        };
        let endpoint = |i: usize| record.values.get(i).and_then(|v| v.as_scalar());
        let (Some(a), Some(b)) = (endpoint(first), endpoint(second)) else {
            return Ok(());
        };
        edges.push([
            checked_index(a, self.vertex_count, element, record.index)?,
            checked_index(b, self.vertex_count, element, record.index)?,
        ]);
        Ok(())
    }

    /// Produce the model: infer missing edges and move UVs onto corners
    pub fn finish(self) -> MeshModel {
        if self.dropped_faces > 0 {
            tracing::warn!(
                "dropped {} faces with fewer than 3 corners",
                self.dropped_faces
            );
        }

        let edges = match self.edges {
            Some(mut edges) => {
                let mut seen: HashSet<(u32, u32)> =
                    edges.iter().map(|&[a, b]| unordered(a, b)).collect();
                for edge in face_edges(&self.faces) {
                    if seen.insert(unordered(edge[0], edge[1])) {
                        edges.push(edge);
                    }
                }
                edges
            }
            None => face_edges(&self.faces),
        };

        let uvs = match (self.corner_uvs, self.vertex_uvs) {
            (Some(corner), _) if !self.faces.is_empty() => Some(corner),
            (_, Some(vertex)) if !self.faces.is_empty() => Some(
                self.faces
                    .iter()
                    .flatten()
                    .map(|&v| vertex.get(v as usize).copied().unwrap_or_default())
                    .collect(),
            ),
            (_, Some(_)) => {
                tracing::debug!("per-vertex UVs dropped: mesh has no faces");
                None
            }
            _ => None,
        };

        MeshModel {
            positions: self.positions,
            normals: self.normals,
            colors: self.colors,
            uvs,
            faces: self.faces,
            edges,
            attributes: Vec::new(),
        }
    }
}

fn checked_index(
    value: Scalar,
    vertex_count: usize,
    element: &Element,
    record: usize,
) -> Result<u32, PlyError> {
    value
        .to_u64()
        .and_then(|v| u32::try_from(v).ok())
        .filter(|&v| (v as usize) < vertex_count)
        .ok_or_else(|| PlyError::IndexOutOfRange {
            element: element.name.clone(),
            record,
            index: value.to_i64(),
            vertex_count,
        })
}

/// Normalize a color channel: 8-bit and 16-bit integers scale to [0, 1],
/// floats pass through
fn color_component(value: Scalar) -> f32 {
    match value {
        Scalar::U8(v) => v as f32 / 255.0,
        Scalar::U16(v) => v as f32 / 65535.0,
        Scalar::F32(v) => v,
        Scalar::F64(v) => v as f32,
        other => (other.to_f64() / 255.0).clamp(0.0, 1.0) as f32,
    }
}
