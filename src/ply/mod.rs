//! The PLY data model: scalar codec, element storage, the document model and
//! the importer-facing builder.

mod builder;
mod element;
mod key_map;
mod model;
mod scalar;

pub use self::builder::PointCloudBuilder;
pub use self::element::{Element, FixedElement, ListDef, ListElement, PropertyDef};
pub use self::key_map::{Addable, Key, KeyMap};
pub use self::model::{Bounds, Coords, Format, Ply, FACE, VERTEX};
pub use self::scalar::ScalarType;
