//! Height-field to point-cloud conversion.
//!
//! Every grid cell that is not NODATA becomes one vertex at
//! `(col * cellsize + x_offset, row * cellsize + y_offset, z_offset + value)`,
//! coloured from the overlay or grey when there is none. A row-major index
//! grid records each cell's vertex id (or -1 for skipped cells) so that mesh
//! mode can stitch two triangles per 2x2 cell block, emitting a triangle only
//! when all three of its corners exist.

use log::{info, warn};

use super::grid::Grid;
use super::image::{Overlay, Rgb};
use super::list::TileRecord;
use crate::errors::{PlyError, PlyResult};
use crate::ply::PointCloudBuilder;

/// Colour used for cells without an overlay.
pub const GREY: Rgb = Rgb {
    red: 128,
    green: 128,
    blue: 128,
};

/// World-space offsets applied to every emitted vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offsets {
    /// Added to each x position.
    pub x: f64,
    /// Added to each y position.
    pub y: f64,
    /// Added to each height value.
    pub z: f64,
}

/// Converts one grid into vertices (and optionally triangles) on the
/// builder. Returns the number of vertices emitted.
pub fn import_grid(
    builder: &mut PointCloudBuilder,
    grid: &Grid,
    overlay: Option<&Overlay>,
    offsets: Offsets,
    mesh: bool,
) -> PlyResult<usize> {
    if let Some(overlay) = overlay {
        if overlay.width() != grid.ncols() || overlay.height() != grid.nrows() {
            return Err(PlyError::ParseError(format!(
                "overlay is {}x{} but grid is {}x{}",
                overlay.width(),
                overlay.height(),
                grid.ncols(),
                grid.nrows()
            )));
        }
    }

    let ncols = grid.ncols();
    let nrows = grid.nrows();
    let nodata = grid.nodata();
    let cellsize = grid.cellsize();

    // vertex id per cell, -1 where NODATA was skipped
    let mut ids = vec![-1i32; nrows as usize * ncols as usize];
    let mut emitted = 0usize;
    for row in 0..nrows {
        for col in 0..ncols {
            let value = grid.value(col, row)?;
            if value == nodata {
                continue;
            }
            let colour = match overlay {
                Some(overlay) => overlay.pixel(col, row)?,
                None => GREY,
            };
            let id = builder.add_vertex(
                (f64::from(col) * cellsize + offsets.x) as f32,
                (f64::from(row) * cellsize + offsets.y) as f32,
                (offsets.z + f64::from(value)) as f32,
                colour.red,
                colour.green,
                colour.blue,
            );
            ids[row as usize * ncols as usize + col as usize] = id as i32;
            emitted += 1;
        }
    }

    if mesh {
        let at = |row: u32, col: u32| ids[row as usize * ncols as usize + col as usize];
        for row in 0..nrows - 1 {
            for col in 0..ncols - 1 {
                let a = at(row, col);
                let b = at(row, col + 1);
                let c = at(row + 1, col);
                let d = at(row + 1, col + 1);
                if a != -1 && d != -1 && b != -1 {
                    builder.add_face(&[b, d, a])?;
                }
                if a != -1 && c != -1 && d != -1 {
                    builder.add_face(&[d, c, a])?;
                }
            }
        }
    }

    info!(
        "imported {} of {} cells{}",
        emitted,
        nrows as usize * ncols as usize,
        if mesh { " with mesh" } else { "" }
    );
    Ok(emitted)
}

/// Converts a set of tiles into one model in a common coordinate frame.
///
/// A first pass finds the smallest lower-left corner across all tiles; a
/// second pass emits every tile shifted by its corner's distance from that
/// minimum, so the tiles abut without overlap.
pub fn import_tiles(
    builder: &mut PointCloudBuilder,
    records: &[TileRecord],
    z_offset: f64,
    mesh: bool,
) -> PlyResult<()> {
    let mut xll_min = f64::INFINITY;
    let mut yll_min = f64::INFINITY;
    for record in records {
        let grid = Grid::read_from_path(&record.grid)?;
        xll_min = xll_min.min(grid.xllcorner());
        yll_min = yll_min.min(grid.yllcorner());
    }
    info!("mosaic origin: xllcorner {} yllcorner {}", xll_min, yll_min);

    for record in records {
        let grid = Grid::read_from_path(&record.grid)?;
        let overlay = match &record.image {
            Some(path) => Some(Overlay::read_from_path(path)?),
            None => {
                warn!("{}: no overlay, using grey", record.grid.display());
                None
            }
        };
        let offsets = Offsets {
            x: grid.xllcorner() - xll_min,
            y: grid.yllcorner() - yll_min,
            z: z_offset,
        };
        import_grid(builder, &grid, overlay.as_ref(), offsets, mesh)?;
    }
    Ok(())
}
