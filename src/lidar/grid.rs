//! ESRI ASCII-grid reader.
//!
//! The format is a six-line `<key> <value>` header (`ncols`, `nrows`,
//! `xllcorner`, `yllcorner`, `cellsize`, `NODATA_value`, in any order, each
//! exactly once) followed by `ncols * nrows` whitespace-separated floats in
//! row-major order from north to south. Rows are reversed on load so that
//! row 0 of the in-memory grid is the southern edge, matching the PLY
//! convention of increasing y pointing north.

use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::{PlyError, PlyResult};
use crate::util::split_line;

/// A rectangular height field loaded from an ESRI ASCII grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    ncols: u32,
    nrows: u32,
    xllcorner: f64,
    yllcorner: f64,
    cellsize: f64,
    nodata: f32,
    /// Row-major, row 0 = southern edge.
    values: Vec<f32>,
}

impl Grid {
    /// Reads a grid from a file.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> PlyResult<Grid> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PlyError::IoPath {
            path: path.to_path_buf(),
            source: e,
        })?;
        let grid = Grid::read(&mut BufReader::new(file)).map_err(|e| e.with_path(path))?;
        info!(
            "read {}: {}x{} cells at ({}, {})",
            path.display(),
            grid.ncols,
            grid.nrows,
            grid.xllcorner,
            grid.yllcorner
        );
        Ok(grid)
    }

    /// Reads a grid from any buffered reader.
    pub fn read<R: BufRead>(reader: &mut R) -> PlyResult<Grid> {
        let mut ncols = None;
        let mut nrows = None;
        let mut xllcorner = None;
        let mut yllcorner = None;
        let mut cellsize = None;
        let mut nodata = None;

        let mut line = String::new();
        for _ in 0..6 {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(PlyError::ParseError(
                    "grid header ended before all six keys were seen".to_string(),
                ));
            }
            let tokens = split_line(&line);
            if tokens.len() != 2 {
                return Err(PlyError::ParseError(format!(
                    "grid header line '{}' is not '<key> <value>'",
                    line.trim_end()
                )));
            }
            let (key, value) = (tokens[0], tokens[1]);
            match key {
                "ncols" => set_header_value(&mut ncols, key, parse_u32(value)?)?,
                "nrows" => set_header_value(&mut nrows, key, parse_u32(value)?)?,
                "xllcorner" => set_header_value(&mut xllcorner, key, parse_f64(value)?)?,
                "yllcorner" => set_header_value(&mut yllcorner, key, parse_f64(value)?)?,
                "cellsize" => set_header_value(&mut cellsize, key, parse_f64(value)?)?,
                "NODATA_value" => set_header_value(&mut nodata, key, parse_f32(value)?)?,
                other => {
                    return Err(PlyError::ParseError(format!(
                        "unknown grid header key '{}'",
                        other
                    )))
                }
            }
        }
        let ncols = ncols.ok_or_else(|| missing_key("ncols"))?;
        let nrows = nrows.ok_or_else(|| missing_key("nrows"))?;
        let xllcorner = xllcorner.ok_or_else(|| missing_key("xllcorner"))?;
        let yllcorner = yllcorner.ok_or_else(|| missing_key("yllcorner"))?;
        let cellsize = cellsize.ok_or_else(|| missing_key("cellsize"))?;
        let nodata = nodata.ok_or_else(|| missing_key("NODATA_value"))?;

        let expected = ncols as usize * nrows as usize;
        let mut north_first = Vec::with_capacity(expected);
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            for token in split_line(&line) {
                north_first.push(parse_f32(token)?);
            }
        }
        if north_first.len() != expected {
            return Err(PlyError::ParseError(format!(
                "expected {} grid values, found {}",
                expected,
                north_first.len()
            )));
        }

        // flip north-to-south file order into south-first memory order
        let mut values = Vec::with_capacity(expected);
        for row in (0..nrows as usize).rev() {
            let start = row * ncols as usize;
            values.extend_from_slice(&north_first[start..start + ncols as usize]);
        }

        Ok(Grid {
            ncols,
            nrows,
            xllcorner,
            yllcorner,
            cellsize,
            nodata,
            values,
        })
    }

    /// Number of columns.
    pub fn ncols(&self) -> u32 {
        self.ncols
    }

    /// Number of rows.
    pub fn nrows(&self) -> u32 {
        self.nrows
    }

    /// X coordinate of the lower left corner.
    pub fn xllcorner(&self) -> f64 {
        self.xllcorner
    }

    /// Y coordinate of the lower left corner.
    pub fn yllcorner(&self) -> f64 {
        self.yllcorner
    }

    /// Cell resolution in metres.
    pub fn cellsize(&self) -> f64 {
        self.cellsize
    }

    /// Sentinel marking absent cells.
    pub fn nodata(&self) -> f32 {
        self.nodata
    }

    /// Value at the given cell; row 0 is the southern edge.
    pub fn value(&self, col: u32, row: u32) -> PlyResult<f32> {
        if col >= self.ncols || row >= self.nrows {
            return Err(PlyError::GridIndexOutOfRange(col, row));
        }
        Ok(self.values[row as usize * self.ncols as usize + col as usize])
    }

    /// Overwrites the value at the given cell.
    pub fn set_value(&mut self, col: u32, row: u32, value: f32) -> PlyResult<()> {
        if col >= self.ncols || row >= self.nrows {
            return Err(PlyError::GridIndexOutOfRange(col, row));
        }
        self.values[row as usize * self.ncols as usize + col as usize] = value;
        Ok(())
    }

    /// The header in a printable format.
    pub fn print_header(&self) -> String {
        format!(
            "ncols {}\nnrows {}\nxllcorner {}\nyllcorner {}\ncellsize {}\nNODATA_value {}\n",
            self.ncols, self.nrows, self.xllcorner, self.yllcorner, self.cellsize, self.nodata
        )
    }
}

fn set_header_value<T>(slot: &mut Option<T>, key: &str, value: T) -> PlyResult<()> {
    if slot.is_some() {
        return Err(PlyError::ParseError(format!(
            "duplicate grid header key '{}'",
            key
        )));
    }
    *slot = Some(value);
    Ok(())
}

fn missing_key(key: &str) -> PlyError {
    PlyError::ParseError(format!("grid header is missing '{}'", key))
}

fn parse_u32(token: &str) -> PlyResult<u32> {
    token
        .parse()
        .map_err(|e| PlyError::ParseError(format!("'{}': {}", token, e)))
}

fn parse_f64(token: &str) -> PlyResult<f64> {
    token
        .parse()
        .map_err(|e| PlyError::ParseError(format!("'{}': {}", token, e)))
}

fn parse_f32(token: &str) -> PlyResult<f32> {
    token
        .parse()
        .map_err(|e| PlyError::ParseError(format!("'{}': {}", token, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SMALL: &str = "ncols 3\nnrows 2\nxllcorner 100\nyllcorner 200\n\
                         cellsize 0.5\nNODATA_value -9999\n\
                         1 2 3\n4 5 6\n";

    fn read(text: &str) -> PlyResult<Grid> {
        Grid::read(&mut Cursor::new(text.as_bytes()))
    }

    #[test]
    fn rows_are_flipped_to_south_first() {
        let grid = read(SMALL).unwrap();
        assert_eq!(grid.ncols(), 3);
        assert_eq!(grid.nrows(), 2);
        // the file's last row is the southern edge, so it becomes row 0
        assert_eq!(grid.value(0, 0).unwrap(), 4.0);
        assert_eq!(grid.value(2, 0).unwrap(), 6.0);
        assert_eq!(grid.value(0, 1).unwrap(), 1.0);
    }

    #[test]
    fn header_keys_in_any_order() {
        let text = "cellsize 1\nNODATA_value -9999\nnrows 1\nncols 2\n\
                    yllcorner 0\nxllcorner 0\n7 8\n";
        let grid = read(text).unwrap();
        assert_eq!(grid.cellsize(), 1.0);
        assert_eq!(grid.value(1, 0).unwrap(), 8.0);
    }

    #[test]
    fn duplicate_header_key_rejected() {
        let text = "ncols 2\nncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n7 8\n";
        assert!(matches!(read(text), Err(PlyError::ParseError(_))));
    }

    #[test]
    fn unknown_header_key_rejected() {
        let text = "ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\nzllcorner 0\n7 8\n";
        assert!(matches!(read(text), Err(PlyError::ParseError(_))));
    }

    #[test]
    fn value_count_must_match() {
        let text = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n\
                    NODATA_value -9999\n1 2 3\n";
        assert!(matches!(read(text), Err(PlyError::ParseError(_))));
    }

    #[test]
    fn cell_access_is_checked() {
        let grid = read(SMALL).unwrap();
        assert!(matches!(
            grid.value(3, 0),
            Err(PlyError::GridIndexOutOfRange(3, 0))
        ));
        assert!(matches!(
            grid.value(0, 2),
            Err(PlyError::GridIndexOutOfRange(0, 2))
        ));
    }

    #[test]
    fn set_value_round_trips() {
        let mut grid = read(SMALL).unwrap();
        grid.set_value(1, 1, 42.5).unwrap();
        assert_eq!(grid.value(1, 1).unwrap(), 42.5);
    }

    #[test]
    fn header_prints_canonically() {
        let grid = read(SMALL).unwrap();
        assert!(grid.print_header().starts_with("ncols 3\nnrows 2\n"));
    }
}
