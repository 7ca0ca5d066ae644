//! Host-side mesh construction
//!
//! Import hands the assembled [`MeshModel`] to a [`MeshBuilder`], which owns
//! the host-native mesh and performs the optional finishing steps. The crate
//! ships [`ModelBuilder`], which keeps the neutral model as its output.

use glam::Vec3;
use hashbrown::{HashMap, HashSet};

use crate::model::{MeshModel, VertexAttribute, unordered};

/// Receives an imported mesh and applies host post-processing
pub trait MeshBuilder: Sized {
    /// Host-native mesh produced by [`MeshBuilder::finish`]
    type Mesh;

    fn from_model(model: MeshModel) -> Self;

    /// Weld vertices closer than `tolerance`
    fn merge_nearby_vertices(&mut self, tolerance: f32);

    /// Use `normals` (one per vertex) as custom shading normals
    fn apply_custom_normals(&mut self, normals: &[[f32; 3]]);

    /// Store a named per-vertex attribute
    fn add_vertex_attribute(&mut self, name: &str, values: &[[f32; 3]]);

    fn finish(self) -> Self::Mesh;
}

/// [`MeshBuilder`] whose output is the neutral model itself
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    model: MeshModel,
}

impl MeshBuilder for ModelBuilder {
    type Mesh = MeshModel;

    fn from_model(model: MeshModel) -> Self {
        Self { model }
    }

    fn merge_nearby_vertices(&mut self, tolerance: f32) {
        let merged = weld(&mut self.model, tolerance);
        tracing::debug!("merged {} vertices (tolerance {})", merged, tolerance);
    }

    fn apply_custom_normals(&mut self, normals: &[[f32; 3]]) {
        if normals.len() != self.model.vertex_count() {
            tracing::warn!(
                "ignoring {} custom normals for {} vertices",
                normals.len(),
                self.model.vertex_count()
            );
            return;
        }
        self.model.normals = Some(normals.to_vec());
    }

    fn add_vertex_attribute(&mut self, name: &str, values: &[[f32; 3]]) {
        let attribute = VertexAttribute {
            name: name.to_string(),
            values: values.to_vec(),
        };
        match self.model.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => *existing = attribute,
            None => self.model.attributes.push(attribute),
        }
    }

    fn finish(self) -> MeshModel {
        self.model
    }
}

type Cell = (i64, i64, i64);

fn cell_of(p: Vec3, size: f32) -> Cell {
    let c = (p / size).floor();
    (c.x as i64, c.y as i64, c.z as i64)
}

/// Merge vertices within `tolerance` of an earlier vertex, returning how many
/// were removed
///
/// The first vertex of each cluster survives with its normal, color and
/// attributes. Corners that collapse onto their neighbor are removed along
/// with their UVs; faces left with fewer than 3 corners and zero-length edges
/// are dropped.
fn weld(model: &mut MeshModel, tolerance: f32) -> usize {
    let size = tolerance.max(f32::EPSILON);
    let max_dist_sq = tolerance * tolerance;

    let mut grid: HashMap<Cell, Vec<u32>> = HashMap::new();
    let mut kept: Vec<usize> = Vec::new();
    let mut remap = Vec::with_capacity(model.vertex_count());

    for (i, &position) in model.positions.iter().enumerate() {
        let p = Vec3::from(position);
        let (cx, cy, cz) = cell_of(p, size);

        let mut found = None;
        'search: for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = grid.get(&(
                        cx.saturating_add(dx),
                        cy.saturating_add(dy),
                        cz.saturating_add(dz),
                    )) else {
                        continue;
                    };
                    for &candidate in candidates {
                        let q = Vec3::from(model.positions[kept[candidate as usize]]);
                        if q.distance_squared(p) <= max_dist_sq {
                            found = Some(candidate);
                            break 'search;
                        }
                    }
                }
            }
        }

        let target = found.unwrap_or_else(|| {
            let new_index = kept.len() as u32;
            kept.push(i);
            grid.entry((cx, cy, cz)).or_default().push(new_index);
            new_index
        });
        remap.push(target);
    }

    let removed = model.vertex_count() - kept.len();
    if removed == 0 {
        return 0;
    }

    let select = |values: &[[f32; 3]]| kept.iter().map(|&i| values[i]).collect::<Vec<_>>();
    model.positions = select(&model.positions);
    if let Some(normals) = &model.normals {
        model.normals = Some(select(normals));
    }
    for attribute in &mut model.attributes {
        attribute.values = select(&attribute.values);
    }
    if let Some(colors) = &model.colors {
        model.colors = Some(kept.iter().map(|&i| colors[i]).collect());
    }

    let mut corner = 0;
    let mut faces = Vec::with_capacity(model.faces.len());
    let mut uvs = model.uvs.as_ref().map(|uvs| Vec::with_capacity(uvs.len()));
    for face in &model.faces {
        let mut corners: Vec<(u32, usize)> = Vec::with_capacity(face.len());
        for (j, &v) in face.iter().enumerate() {
            let target = remap[v as usize];
            if corners.last().map(|c| c.0) != Some(target) {
                corners.push((target, corner + j));
            }
        }
        while corners.len() > 1 && corners.first().map(|c| c.0) == corners.last().map(|c| c.0) {
            corners.pop();
        }
        corner += face.len();

        if corners.len() < 3 {
            continue;
        }
        if let (Some(out), Some(source)) = (&mut uvs, &model.uvs) {
            out.extend(corners.iter().map(|&(_, c)| source[c]));
        }
        faces.push(corners.into_iter().map(|(v, _)| v).collect());
    }
    model.faces = faces;
    model.uvs = uvs;

    let mut seen = HashSet::new();
    model.edges = model
        .edges
        .iter()
        .map(|&[a, b]| [remap[a as usize], remap[b as usize]])
        .filter(|&[a, b]| a != b && seen.insert(unordered(a, b)))
        .collect();

    removed
}
