//! List-file parser for multi-tile conversions.
//!
//! One record per line: a grid path optionally followed by an overlay image
//! path, whitespace separated. Blank lines and lines starting with `#` are
//! ignored.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{PlyError, PlyResult};
use crate::util::split_line;

/// One grid/overlay pair named by a list file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRecord {
    /// Path of the ESRI ASCII grid.
    pub grid: PathBuf,
    /// Path of the colour overlay, if any.
    pub image: Option<PathBuf>,
}

/// Reads the tile records of a list file.
pub fn read_list_from_path<P: AsRef<Path>>(path: P) -> PlyResult<Vec<TileRecord>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| PlyError::IoPath {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_list(&text)
}

/// Parses list-file text.
pub fn parse_list(text: &str) -> PlyResult<Vec<TileRecord>> {
    let mut records = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens = split_line(line);
        match tokens.as_slice() {
            [grid] => records.push(TileRecord {
                grid: PathBuf::from(grid),
                image: None,
            }),
            [grid, image] => records.push(TileRecord {
                grid: PathBuf::from(grid),
                image: Some(PathBuf::from(image)),
            }),
            _ => {
                return Err(PlyError::ParseError(format!(
                    "list record '{}' has more than two fields",
                    line
                )))
            }
        }
    }
    Ok(records)
}
