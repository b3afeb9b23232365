//! Convenience constructor for importer-made point clouds.
//!
//! Models loaded from disk can have any schema; models built by the LiDAR
//! importer always look the same. [`PointCloudBuilder`] wraps a [`Ply`] with
//! that canned schema so the importer can append vertices and faces without
//! touching element plumbing.

use super::element::{Element, FixedElement, ListDef, ListElement};
use super::model::{Ply, FACE, VERTEX};
use super::scalar::ScalarType;
use crate::errors::PlyResult;

/// Builds a model with `x,y,z` float coordinates, `red,green,blue` uchar
/// colours and an integer-indexed triangle list.
#[derive(Debug)]
pub struct PointCloudBuilder {
    ply: Ply,
}

impl Default for PointCloudBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PointCloudBuilder {
    /// Creates an empty model carrying the canned vertex and face schema.
    pub fn new() -> Self {
        let mut ply = Ply::new();
        let mut vertex = FixedElement::new(VERTEX);
        for name in ["x", "y", "z"] {
            vertex
                .add_property(name, ScalarType::Float)
                .expect("fresh element");
        }
        for name in ["red", "green", "blue"] {
            vertex
                .add_property(name, ScalarType::UChar)
                .expect("fresh element");
        }
        ply.add_element(Element::Fixed(vertex));
        ply.add_element(Element::List(ListElement::new(
            FACE,
            ListDef::new(ScalarType::Int, ScalarType::Int, "vertex_index"),
        )));
        PointCloudBuilder { ply }
    }

    /// Appends a coloured vertex and returns its index.
    pub fn add_vertex(&mut self, x: f32, y: f32, z: f32, red: u8, green: u8, blue: u8) -> u32 {
        let vertex = self
            .ply
            .element_mut(VERTEX)
            .and_then(Element::as_fixed_mut)
            .expect("builder owns the vertex element");
        let row = vertex
            .append_row(vec![
                u64::from(x.to_bits()),
                u64::from(y.to_bits()),
                u64::from(z.to_bits()),
                u64::from(red),
                u64::from(green),
                u64::from(blue),
            ])
            .expect("schema width is fixed");
        row as u32
    }

    /// Appends a face given its vertex indices.
    pub fn add_face(&mut self, indices: &[i32]) -> PlyResult<usize> {
        self.ply.add_face(indices)
    }

    /// Borrows the model being built.
    pub fn ply(&self) -> &Ply {
        &self.ply
    }

    /// Mutably borrows the model being built.
    pub fn ply_mut(&mut self) -> &mut Ply {
        &mut self.ply
    }

    /// Consumes the builder, yielding the finished model.
    pub fn into_ply(self) -> Ply {
        self.ply
    }
}
