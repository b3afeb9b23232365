//! LiDAR inputs and the height-field importer.

mod grid;
mod image;
mod import;
mod list;

pub use self::grid::Grid;
pub use self::image::{Overlay, Rgb};
pub use self::import::{import_grid, import_tiles, Offsets, GREY};
pub use self::list::{parse_list, read_list_from_path, TileRecord};
