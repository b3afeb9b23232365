//! Library for turning LiDAR height-field rasters into PLY point clouds and
//! meshes, editing PLY files in all three standard encodings, and detecting
//! and closing boundary holes on triangle meshes.
//!
//! # Reading and editing a PLY file
//!
//! ```
//! use lidar_ply::parser::Parser;
//!
//! let text = "ply\nformat ascii 1.0\n\
//!             element vertex 3\n\
//!             property float x\nproperty float y\nproperty float z\n\
//!             end_header\n\
//!             0 0 0\n1 0 0\n0 1 0\n";
//! let mut ply = Parser::new().read_ply(&mut text.as_bytes()).unwrap();
//! assert_eq!(ply.vertex_count(), 3);
//!
//! // colour properties are created on demand
//! ply.set_all_vertex_colors(200, 200, 200).unwrap();
//! ply.scale(2.0, 2.0, 2.0).unwrap();
//! assert_eq!(ply.bounding_box().unwrap().max.x, 2.0);
//! ```
//!
//! # Writing
//!
//! A model writes itself in its current format; switch the format first to
//! re-encode:
//!
//! ```
//! use lidar_ply::parser::Parser;
//! use lidar_ply::writer::Writer;
//! use lidar_ply::Format;
//!
//! let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nend_header\n1.5\n";
//! let mut ply = Parser::new().read_ply(&mut text.as_bytes()).unwrap();
//! ply.set_format(Format::BinaryLittleEndian);
//!
//! let mut out = Vec::new();
//! Writer::new().write_ply(&mut out, &ply).unwrap();
//! assert!(out.starts_with(b"ply\nformat binary_little_endian 1.0\n"));
//! ```
//!
//! # Closing holes
//!
//! ```
//! use lidar_ply::parser::Parser;
//! use lidar_ply::holes;
//!
//! let text = "ply\nformat ascii 1.0\n\
//!             element vertex 3\n\
//!             property float x\nproperty float y\nproperty float z\n\
//!             element face 1\nproperty list uchar int vertex_index\n\
//!             end_header\n\
//!             0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n";
//! let mut ply = Parser::new().read_ply(&mut text.as_bytes()).unwrap();
//!
//! let loops = holes::find_holes(&ply).unwrap();
//! assert_eq!(loops.len(), 1);
//! holes::fan_fill(&mut ply, &loops[0]).unwrap();
//! assert!(holes::find_holes(&ply).unwrap().is_empty());
//! ```

#![warn(missing_docs)]

pub mod errors;
pub mod holes;
pub mod lidar;
pub mod parser;
pub mod ply;
pub mod util;
pub mod writer;

pub use crate::errors::{PlyError, PlyResult};
pub use crate::ply::{
    Bounds, Coords, Element, FixedElement, Format, ListDef, ListElement, Ply, PointCloudBuilder,
    PropertyDef, ScalarType,
};
