//! Neutral mesh model exchanged with the host

use hashbrown::HashSet;

/// Named per-vertex float3 attribute stored by a [`crate::MeshBuilder`]
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    pub name: String,
    pub values: Vec<[f32; 3]>,
}

/// Polygon mesh snapshot produced by import and consumed by export
///
/// Positions are indexed by vertex id. Normals and colors, when present, have
/// one entry per vertex; UVs have one entry per face corner in face order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshModel {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    /// RGBA, normalized to [0, 1]
    pub colors: Option<Vec<[f32; 4]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub faces: Vec<Vec<u32>>,
    pub edges: Vec<[u32; 2]>,
    pub attributes: Vec<VertexAttribute>,
}

impl MeshModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Total number of face corners
    pub fn corner_count(&self) -> usize {
        self.faces.iter().map(Vec::len).sum()
    }

    /// Edges as unordered pairs, for order-independent comparison
    pub fn edge_set(&self) -> HashSet<(u32, u32)> {
        self.edges.iter().map(|&[a, b]| unordered(a, b)).collect()
    }

    /// Check the model invariants, describing the first violation
    pub fn validate(&self) -> Result<(), String> {
        let vertex_count = self.vertex_count();
        let in_range = |i: u32| (i as usize) < vertex_count;

        if let Some(normals) = &self.normals
            && normals.len() != vertex_count
        {
            return Err(format!(
                "{} normals for {} vertices",
                normals.len(),
                vertex_count
            ));
        }
        if let Some(colors) = &self.colors
            && colors.len() != vertex_count
        {
            return Err(format!(
                "{} colors for {} vertices",
                colors.len(),
                vertex_count
            ));
        }
        if let Some(uvs) = &self.uvs
            && uvs.len() != self.corner_count()
        {
            return Err(format!(
                "{} UVs for {} face corners",
                uvs.len(),
                self.corner_count()
            ));
        }
        for (i, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(format!("face {i} has {} corners", face.len()));
            }
            if let Some(&bad) = face.iter().find(|&&v| !in_range(v)) {
                return Err(format!("face {i} references missing vertex {bad}"));
            }
        }
        for (i, &[a, b]) in self.edges.iter().enumerate() {
            if !in_range(a) || !in_range(b) {
                return Err(format!("edge {i} references missing vertex ({a}, {b})"));
            }
        }
        for attribute in &self.attributes {
            if attribute.values.len() != vertex_count {
                return Err(format!(
                    "attribute '{}' has {} values for {} vertices",
                    attribute.name,
                    attribute.values.len(),
                    vertex_count
                ));
            }
        }
        Ok(())
    }

    /// Append another mesh, offsetting its indices
    ///
    /// Optional attributes present on only one side are filled with defaults
    /// (zero normals, white colors, zero UVs).
    pub fn append(&mut self, other: &MeshModel) {
        let offset = self.positions.len() as u32;
        let (own_vertices, own_corners) = (self.vertex_count(), self.corner_count());

        merge_optional(
            &mut self.normals,
            other.normals.as_deref(),
            own_vertices,
            other.vertex_count(),
            [0.0; 3],
        );
        merge_optional(
            &mut self.colors,
            other.colors.as_deref(),
            own_vertices,
            other.vertex_count(),
            [1.0; 4],
        );
        merge_optional(
            &mut self.uvs,
            other.uvs.as_deref(),
            own_corners,
            other.corner_count(),
            [0.0; 2],
        );

        self.positions.extend_from_slice(&other.positions);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|face| face.iter().map(|&v| v + offset).collect()),
        );
        self.edges
            .extend(other.edges.iter().map(|&[a, b]| [a + offset, b + offset]));
    }
}

fn merge_optional<T: Copy>(
    own: &mut Option<Vec<T>>,
    other: Option<&[T]>,
    own_len: usize,
    other_len: usize,
    default: T,
) {
    match (own.as_mut(), other) {
        (Some(values), Some(more)) => values.extend_from_slice(more),
        (Some(values), None) => values.resize(own_len + other_len, default),
        (None, Some(more)) => {
            let mut values = vec![default; own_len];
            values.extend_from_slice(more);
            *own = Some(values);
        }
        (None, None) => {}
    }
}

/// Canonical key for an undirected edge
pub(crate) fn unordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Boundary edges of every face, deduplicated, in first-seen order
pub(crate) fn face_edges(faces: &[Vec<u32>]) -> Vec<[u32; 2]> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for face in faces {
        for (i, &a) in face.iter().enumerate() {
            let b = face[(i + 1) % face.len()];
            if a != b && seen.insert(unordered(a, b)) {
                edges.push([a, b]);
            }
        }
    }
    edges
}
