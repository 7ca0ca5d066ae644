//! Property name dispatch
//!
//! Maps each property of an element schema to the mesh attribute it feeds.
//! Resolved once per header so records are routed by position, not by name.

use crate::error::PlyError;
use crate::header::{Element, ElementKind, Property, PropertyType};

/// Destination of one vertex property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexSlot {
    Position(usize),
    Normal(usize),
    Color(usize),
    Uv(usize),
}

impl VertexSlot {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "x" => Self::Position(0),
            "y" => Self::Position(1),
            "z" => Self::Position(2),
            "nx" => Self::Normal(0),
            "ny" => Self::Normal(1),
            "nz" => Self::Normal(2),
            "red" | "r" | "diffuse_red" => Self::Color(0),
            "green" | "g" | "diffuse_green" => Self::Color(1),
            "blue" | "b" | "diffuse_blue" => Self::Color(2),
            "alpha" | "a" | "diffuse_alpha" => Self::Color(3),
            "s" | "u" | "texture_u" | "texture_s" => Self::Uv(0),
            "t" | "v" | "texture_v" | "texture_t" => Self::Uv(1),
            _ => return None,
        })
    }
}

/// Vertex schema resolved to attribute slots, parallel to the properties
#[derive(Debug, Clone, Default)]
pub struct VertexLayout {
    pub slots: Vec<Option<VertexSlot>>,
    pub has_normals: bool,
    pub has_colors: bool,
    pub has_alpha: bool,
    pub has_uvs: bool,
}

impl VertexLayout {
    pub fn resolve(element: &Element) -> Result<Self, PlyError> {
        let mut layout = Self::default();
        for property in &element.properties {
            let slot = VertexSlot::from_name(&property.name);
            if slot.is_some() {
                require_scalar(element, property)?;
            } else {
                ignored(element, property);
            }
            match slot {
                Some(VertexSlot::Normal(_)) => layout.has_normals = true,
                Some(VertexSlot::Color(3)) => {
                    layout.has_colors = true;
                    layout.has_alpha = true;
                }
                Some(VertexSlot::Color(_)) => layout.has_colors = true,
                Some(VertexSlot::Uv(_)) => layout.has_uvs = true,
                _ => {}
            }
            layout.slots.push(slot);
        }
        Ok(layout)
    }
}

/// Face schema: which properties hold corner indices and per-corner UVs
#[derive(Debug, Clone, Default)]
pub struct FaceLayout {
    pub indices: Option<usize>,
    pub texcoords: Option<usize>,
}

impl FaceLayout {
    pub fn resolve(element: &Element) -> Result<Self, PlyError> {
        let mut layout = Self::default();
        for (i, property) in element.properties.iter().enumerate() {
            match property.name.as_str() {
                "vertex_indices" | "vertex_index" if layout.indices.is_none() => {
                    require_list(element, property)?;
                    layout.indices = Some(i);
                }
                "texcoord" => {
                    require_list(element, property)?;
                    layout.texcoords = Some(i);
                }
                _ => ignored(element, property),
            }
        }
        if layout.indices.is_none() {
            tracing::warn!(
                "element '{}' has no vertex index list; faces will be skipped",
                element.name
            );
        }
        Ok(layout)
    }
}

/// Edge schema: which properties hold the two endpoints
#[derive(Debug, Clone, Default)]
pub struct EdgeLayout {
    pub first: Option<usize>,
    pub second: Option<usize>,
}

impl EdgeLayout {
    pub fn resolve(element: &Element) -> Result<Self, PlyError> {
        let mut layout = Self::default();
        for (i, property) in element.properties.iter().enumerate() {
            match property.name.as_str() {
                "vertex1" => {
                    require_scalar(element, property)?;
                    layout.first = Some(i);
                }
                "vertex2" => {
                    require_scalar(element, property)?;
                    layout.second = Some(i);
                }
                _ => ignored(element, property),
            }
        }
        if layout.first.is_none() || layout.second.is_none() {
            tracing::warn!(
                "element '{}' lacks vertex1/vertex2; edges will be skipped",
                element.name
            );
        }
        Ok(layout)
    }
}

/// Per-element dispatch table
#[derive(Debug, Clone)]
pub enum ElementLayout {
    Vertex(VertexLayout),
    Face(FaceLayout),
    Edge(EdgeLayout),
    /// Records are decoded to keep the stream aligned, then dropped
    Skip,
}

impl ElementLayout {
    pub fn resolve(element: &Element) -> Result<Self, PlyError> {
        Ok(match element.kind {
            ElementKind::Vertex => Self::Vertex(VertexLayout::resolve(element)?),
            ElementKind::Face => Self::Face(FaceLayout::resolve(element)?),
            ElementKind::Edge => Self::Edge(EdgeLayout::resolve(element)?),
            ElementKind::Other(_) => {
                tracing::debug!(
                    "skipping element '{}' ({} records)",
                    element.name,
                    element.count
                );
                Self::Skip
            }
        })
    }
}

fn require_scalar(element: &Element, property: &Property) -> Result<(), PlyError> {
    match property.ty {
        PropertyType::Scalar(_) => Ok(()),
        PropertyType::List { .. } => Err(PlyError::UnsupportedFeature(format!(
            "property '{}' of element '{}' is declared as {} but must be a scalar",
            property.name, element.name, property.ty
        ))),
    }
}

fn require_list(element: &Element, property: &Property) -> Result<(), PlyError> {
    match property.ty {
        PropertyType::List { .. } => Ok(()),
        PropertyType::Scalar(_) => Err(PlyError::UnsupportedFeature(format!(
            "property '{}' of element '{}' is declared as {} but must be a list",
            property.name, element.name, property.ty
        ))),
    }
}

fn ignored(element: &Element, property: &Property) {
    tracing::debug!(
        "ignoring property '{}' ({}) of element '{}'",
        property.name,
        property.ty,
        element.name
    );
}
