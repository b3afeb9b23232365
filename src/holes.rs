//! Boundary-loop discovery and hole closing on triangle meshes.
//!
//! An edge that belongs to an odd number of faces is a boundary edge; the
//! set of boundary edges of a well-formed mesh decomposes into disjoint
//! simple cycles, the holes. Edges are tracked as composite `u64` keys,
//! `(min << 32) | max`, which limits vertex indices to 32 bits; meshes
//! larger than that need a pair-keyed map instead.

use log::debug;
use std::collections::BTreeSet;

use crate::errors::{PlyError, PlyResult};
use crate::ply::{Coords, Ply};

fn edge_key(a: u32, b: u32) -> u64 {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    (u64::from(lo) << 32) | u64::from(hi)
}

fn key_ends(key: u64) -> (u32, u32) {
    ((key >> 32) as u32, key as u32)
}

fn face_indices(ply: &Ply, face: usize) -> PlyResult<Vec<u32>> {
    ply.face_row(face)?
        .iter()
        .map(|t| {
            t.parse::<u32>()
                .map_err(|e| PlyError::ParseError(format!("face index '{}': {}", t, e)))
        })
        .collect()
}

/// Collects the boundary edges of the mesh: those appearing in an odd number
/// of faces.
fn boundary_edges(ply: &Ply) -> PlyResult<BTreeSet<u64>> {
    let mut edges = BTreeSet::new();
    for face in 0..ply.face_count() {
        let indices = face_indices(ply, face)?;
        let n = indices.len();
        for i in 0..n {
            let key = edge_key(indices[i], indices[(i + 1) % n]);
            // toggle parity: present means odd so far
            if !edges.insert(key) {
                edges.remove(&key);
            }
        }
    }
    Ok(edges)
}

/// Discovers every boundary loop of the mesh.
///
/// Each hole is returned as a cyclic vertex sequence. A closed mesh yields
/// the empty list. A boundary vertex on more than two odd-parity edges means
/// the boundary is not a union of simple cycles; that is reported as
/// `NonManifoldBoundary` rather than walked.
pub fn find_holes(ply: &Ply) -> PlyResult<Vec<Vec<u32>>> {
    let mut edges = boundary_edges(ply)?;
    debug!("{} boundary edges", edges.len());

    // a vertex on more than two boundary edges pinches loops together and
    // makes the walk ambiguous
    let mut degree = std::collections::HashMap::new();
    for &key in &edges {
        let (a, b) = key_ends(key);
        *degree.entry(a).or_insert(0u32) += 1;
        *degree.entry(b).or_insert(0u32) += 1;
    }
    if let Some((&v, _)) = degree.iter().find(|&(_, &d)| d > 2) {
        return Err(PlyError::NonManifoldBoundary(v));
    }

    let mut holes = Vec::new();
    while let Some(&first) = edges.iter().next() {
        edges.remove(&first);
        let (start, mut frontier) = key_ends(first);
        let mut hole = vec![start, frontier];
        while frontier != start {
            let next = edges
                .iter()
                .copied()
                .find(|&k| {
                    let (a, b) = key_ends(k);
                    a == frontier || b == frontier
                })
                .ok_or(PlyError::NonManifoldBoundary(frontier))?;
            edges.remove(&next);
            let (a, b) = key_ends(next);
            frontier = if a == frontier { b } else { a };
            if frontier != start {
                hole.push(frontier);
            }
        }
        debug!("hole with {} vertices", hole.len());
        holes.push(hole);
    }
    Ok(holes)
}

/// Closes one hole with a triangle fan around a new centroid vertex.
///
/// The centroid vertex is created by duplicating the first hole vertex and
/// overwriting its coordinates, so colours and any other properties are
/// inherited. Filling an `n`-vertex hole emits exactly `n` triangles.
/// Returns the index of the new centroid vertex.
pub fn fan_fill(ply: &mut Ply, hole: &[u32]) -> PlyResult<u32> {
    let n = hole.len();
    let mut sum = Coords::default();
    for &v in hole {
        let c = ply.vertex_coords(v as usize)?;
        sum.x += c.x;
        sum.y += c.y;
        sum.z += c.z;
    }
    let centroid = ply.duplicate_vertex(hole[0] as usize)?;
    ply.set_vertex_position(
        centroid,
        sum.x / n as f64,
        sum.y / n as f64,
        sum.z / n as f64,
    )?;
    let centroid = centroid as i32;
    for pair in hole.windows(2) {
        ply.add_face(&[pair[0] as i32, pair[1] as i32, centroid])?;
    }
    ply.add_face(&[hole[0] as i32, hole[n - 1] as i32, centroid])?;
    Ok(centroid as u32)
}

/// Closes one hole with an extruded flat base.
///
/// The hole's rim is duplicated at `z_min - percent/100 * model_height`,
/// joined to the original rim with quadrilateral side faces, and the base
/// loop is then fan filled. Face orientation is not enforced; re-orient in
/// an external tool if the viewer needs consistent normals.
pub fn base_fill(ply: &mut Ply, hole: &[u32], percent: f64) -> PlyResult<()> {
    let bounds = ply.bounding_box()?;
    let mut z_min = f64::INFINITY;
    for &v in hole {
        z_min = z_min.min(ply.vertex_coords(v as usize)?.z);
    }
    let base_z = z_min - percent / 100.0 * (bounds.max.z - bounds.min.z);

    let mut base = Vec::with_capacity(hole.len());
    for &v in hole {
        let c = ply.vertex_coords(v as usize)?;
        let dup = ply.duplicate_vertex(v as usize)?;
        ply.set_vertex_position(dup, c.x, c.y, base_z)?;
        base.push(dup as u32);
    }

    let n = hole.len();
    for i in 0..n - 1 {
        ply.add_face(&[
            hole[i] as i32,
            hole[i + 1] as i32,
            base[i + 1] as i32,
            base[i] as i32,
        ])?;
    }
    ply.add_face(&[
        hole[n - 1] as i32,
        hole[0] as i32,
        base[0] as i32,
        base[n - 1] as i32,
    ])?;

    fan_fill(ply, &base)?;
    Ok(())
}
