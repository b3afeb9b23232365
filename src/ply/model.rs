//! The in-memory PLY model.
//!
//! A [`Ply`] owns a format, a version string, the comment lines and an
//! ordered collection of uniquely named elements. Element order determines
//! both header order and payload order on write; a reader produces elements
//! in file order. On top of that the model exposes the geometry editing
//! surface used by the importer, the hole filler and the command line tools:
//! vertex access and colours, scaling, face appends and the bounding box.

use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::element::{Element, FixedElement, ListElement};
use super::key_map::{Addable, KeyMap};
use super::scalar::ScalarType;
use crate::errors::{PlyError, PlyResult};
use crate::parser::Parser;
use crate::writer::Writer;

/// Name of the element holding vertex data.
pub const VERTEX: &str = "vertex";
/// Name of the element holding face data.
pub const FACE: &str = "face";

/// Payload encoding of a PLY file.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Format {
    /// Human readable; one row per line, fields separated by spaces.
    Ascii,
    /// Raw bytes, most significant byte first.
    BinaryBigEndian,
    /// Raw bytes, least significant byte first.
    BinaryLittleEndian,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(match *self {
            Format::Ascii => "ascii",
            Format::BinaryBigEndian => "binary_big_endian",
            Format::BinaryLittleEndian => "binary_little_endian",
        })
    }
}

impl std::str::FromStr for Format {
    type Err = PlyError;

    fn from_str(s: &str) -> PlyResult<Self> {
        match s {
            "ascii" => Ok(Format::Ascii),
            "binary_big_endian" => Ok(Format::BinaryBigEndian),
            "binary_little_endian" => Ok(Format::BinaryLittleEndian),
            other => Err(PlyError::InvalidFormat(other.to_string())),
        }
    }
}

/// The coordinates of a single vertex, always in double precision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coords {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

/// Minimum and maximum vertex coordinates of a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// The smallest corner.
    pub min: Coords,
    /// The largest corner.
    pub max: Coords,
}

impl Bounds {
    /// Grows the bounds to encompass the given point.
    pub fn grow(&mut self, p: Coords) {
        if p.x < self.min.x {
            self.min.x = p.x;
        }
        if p.y < self.min.y {
            self.min.y = p.y;
        }
        if p.z < self.min.z {
            self.min.z = p.z;
        }
        if p.x > self.max.x {
            self.max.x = p.x;
        }
        if p.y > self.max.y {
            self.max.y = p.y;
        }
        if p.z > self.max.z {
            self.max.z = p.z;
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds {
            min: Coords {
                x: f64::INFINITY,
                y: f64::INFINITY,
                z: f64::INFINITY,
            },
            max: Coords {
                x: f64::NEG_INFINITY,
                y: f64::NEG_INFINITY,
                z: f64::NEG_INFINITY,
            },
        }
    }
}

/// A complete PLY document: header metadata plus element payload.
#[derive(Debug, PartialEq, Clone)]
pub struct Ply {
    format: Format,
    version: String,
    comments: Vec<String>,
    elements: KeyMap<Element>,
    // cached positions of the vertex/face elements; convenience only,
    // always recomputable by name
    vertex_index: Option<usize>,
    face_index: Option<usize>,
}

impl Default for Ply {
    fn default() -> Self {
        Self::new()
    }
}

impl Ply {
    /// Creates an empty ASCII model, version 1.0, no comments, no elements.
    pub fn new() -> Self {
        Ply {
            format: Format::Ascii,
            version: "1.0".to_string(),
            comments: Vec::new(),
            elements: KeyMap::new(),
            vertex_index: None,
            face_index: None,
        }
    }

    /// Current payload format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Sets the payload format. Parse a user-supplied name with
    /// [`Format::from_str`], which reports `InvalidFormat` for anything
    /// outside the three standard encodings.
    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    /// Version string from the `format` header line, nominally `"1.0"`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Overwrites the version string.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// Comment lines, in header order.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Appends a comment line.
    pub fn add_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
    }

    /// The ordered element collection.
    pub fn elements(&self) -> &KeyMap<Element> {
        &self.elements
    }

    pub(crate) fn elements_mut(&mut self) -> &mut KeyMap<Element> {
        &mut self.elements
    }

    /// Adds an element, replacing any element of the same name in place.
    /// Element names within a model are unique.
    pub fn add_element(&mut self, element: Element) {
        self.elements.add(element);
    }

    /// Borrows an element by name.
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.get(name)
    }

    /// Mutably borrows an element by name.
    pub fn element_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements.get_mut(name)
    }

    pub(crate) fn refresh_cached_indices(&mut self) {
        self.vertex_index = self.elements.get_index_of(VERTEX);
        self.face_index = self.elements.get_index_of(FACE);
    }

    fn vertex_element(&self) -> PlyResult<&FixedElement> {
        let element = self
            .vertex_index
            .and_then(|i| self.elements.get_index(i))
            .map(|(_, e)| e)
            .or_else(|| self.elements.get(VERTEX))
            .ok_or(PlyError::MissingElement(VERTEX))?;
        element.as_fixed().ok_or(PlyError::MissingElement(VERTEX))
    }

    fn vertex_element_mut(&mut self) -> PlyResult<&mut FixedElement> {
        if self.vertex_index.is_none() {
            self.vertex_index = self.elements.get_index_of(VERTEX);
        }
        let idx = self.vertex_index.ok_or(PlyError::MissingElement(VERTEX))?;
        self.elements
            .get_index_mut(idx)
            .and_then(|(_, e)| e.as_fixed_mut())
            .ok_or(PlyError::MissingElement(VERTEX))
    }

    fn face_element(&self) -> PlyResult<&ListElement> {
        let element = self
            .face_index
            .and_then(|i| self.elements.get_index(i))
            .map(|(_, e)| e)
            .or_else(|| self.elements.get(FACE))
            .ok_or(PlyError::MissingElement(FACE))?;
        element.as_list().ok_or(PlyError::MissingElement(FACE))
    }

    fn face_element_mut(&mut self) -> PlyResult<&mut ListElement> {
        if self.face_index.is_none() {
            self.face_index = self.elements.get_index_of(FACE);
        }
        let idx = self.face_index.ok_or(PlyError::MissingElement(FACE))?;
        self.elements
            .get_index_mut(idx)
            .and_then(|(_, e)| e.as_list_mut())
            .ok_or(PlyError::MissingElement(FACE))
    }

    /// Number of vertices, zero if the model has no vertex element.
    pub fn vertex_count(&self) -> usize {
        self.vertex_element().map(|e| e.len()).unwrap_or(0)
    }

    /// Number of faces, zero if the model has no face element.
    pub fn face_count(&self) -> usize {
        self.face_element().map(|e| e.len()).unwrap_or(0)
    }

    /// Multiplies every vertex coordinate by the given per-axis factors.
    pub fn scale(&mut self, sx: f64, sy: f64, sz: f64) -> PlyResult<()> {
        let vertex = self.vertex_element_mut()?;
        for row in 0..vertex.len() {
            let x = vertex.get_f64(row, "x")?;
            let y = vertex.get_f64(row, "y")?;
            let z = vertex.get_f64(row, "z")?;
            vertex.set_f64(row, "x", x * sx)?;
            vertex.set_f64(row, "y", y * sy)?;
            vertex.set_f64(row, "z", z * sz)?;
        }
        Ok(())
    }

    /// Sets every vertex to the given colour, creating any missing colour
    /// property as `uchar` first.
    pub fn set_all_vertex_colors(&mut self, red: u8, green: u8, blue: u8) -> PlyResult<()> {
        let vertex = self.vertex_element_mut()?;
        for name in ["red", "green", "blue"] {
            // probe; an unknown property is the cue to add it
            if let Err(PlyError::UnknownProperty(_)) = vertex.get(0, name) {
                vertex.add_property(name, ScalarType::UChar)?;
            }
        }
        for row in 0..vertex.len() {
            vertex.set_f64(row, "red", f64::from(red))?;
            vertex.set_f64(row, "green", f64::from(green))?;
            vertex.set_f64(row, "blue", f64::from(blue))?;
        }
        Ok(())
    }

    /// Sets one vertex's colour. Fails if the colour properties are absent.
    pub fn set_vertex_color(&mut self, index: usize, red: u8, green: u8, blue: u8) -> PlyResult<()> {
        let vertex = self.vertex_element_mut()?;
        vertex.set_f64(index, "red", f64::from(red))?;
        vertex.set_f64(index, "green", f64::from(green))?;
        vertex.set_f64(index, "blue", f64::from(blue))?;
        Ok(())
    }

    /// Appends a copy of vertex `index`, returning the new vertex's index.
    /// All properties are copied, which makes this the cheap way to inherit
    /// colours and normals when synthesising new geometry.
    pub fn duplicate_vertex(&mut self, index: usize) -> PlyResult<usize> {
        self.vertex_element_mut()?.duplicate_row(index)
    }

    /// Overwrites one vertex's coordinates.
    pub fn set_vertex_position(&mut self, index: usize, x: f64, y: f64, z: f64) -> PlyResult<()> {
        let vertex = self.vertex_element_mut()?;
        vertex.set_f64(index, "x", x)?;
        vertex.set_f64(index, "y", y)?;
        vertex.set_f64(index, "z", z)?;
        Ok(())
    }

    /// Appends a face given its vertex indices. The indices are not checked
    /// against the vertex count.
    pub fn add_face(&mut self, indices: &[i32]) -> PlyResult<usize> {
        let texts: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        self.face_element_mut()?.append_row(&refs)
    }

    /// Returns the vertex indices of face `index` as text tokens.
    pub fn face_row(&self, index: usize) -> PlyResult<Vec<String>> {
        self.face_element()?.get_row(index)
    }

    /// Returns the coordinates of vertex `index`.
    pub fn vertex_coords(&self, index: usize) -> PlyResult<Coords> {
        let vertex = self.vertex_element()?;
        Ok(Coords {
            x: vertex.get_f64(index, "x")?,
            y: vertex.get_f64(index, "y")?,
            z: vertex.get_f64(index, "z")?,
        })
    }

    /// Computes the min/max over `x`, `y`, `z` across all vertices.
    pub fn bounding_box(&self) -> PlyResult<Bounds> {
        let vertex = self.vertex_element()?;
        let mut bounds = Bounds::default();
        for row in 0..vertex.len() {
            bounds.grow(Coords {
                x: vertex.get_f64(row, "x")?,
                y: vertex.get_f64(row, "y")?,
                z: vertex.get_f64(row, "z")?,
            });
        }
        Ok(bounds)
    }

    /// Renders the complete header, `ply` through `end_header`, as it would
    /// be written to a file. Elements without rows are suppressed.
    pub fn print_header(&self) -> String {
        let mut out = String::from("ply\n");
        out.push_str(&format!("format {} {}\n", self.format, self.version));
        for comment in &self.comments {
            out.push_str(&format!("comment {}\n", comment));
        }
        for (_, element) in &self.elements {
            if !element.is_empty() {
                out.push_str(&element.header_text());
            }
        }
        out.push_str("end_header\n");
        out
    }

    /// Reads a model from a file. The file is opened in binary mode and
    /// closed before this returns; on error the partial model is discarded.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> PlyResult<Ply> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PlyError::IoPath {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut reader = BufReader::new(file);
        let ply = Parser::new()
            .read_ply(&mut reader)
            .map_err(|e| e.with_path(path))?;
        info!(
            "read {}: {} vertices, {} faces",
            path.display(),
            ply.vertex_count(),
            ply.face_count()
        );
        Ok(ply)
    }

    /// Writes the model to a file in its current format. Writing never
    /// mutates the model; the file is closed before this returns.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> PlyResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| PlyError::IoPath {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        Writer::new()
            .write_ply(&mut writer, self)
            .map_err(|e| e.with_path(path))?;
        writer.flush().map_err(|e| PlyError::IoPath {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!("wrote {} ({} format)", path.display(), self.format);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply::element::ListDef;

    fn small_model() -> Ply {
        let mut ply = Ply::new();
        let mut vertex = FixedElement::new(VERTEX);
        vertex.add_property("x", ScalarType::Float).unwrap();
        vertex.add_property("y", ScalarType::Float).unwrap();
        vertex.add_property("z", ScalarType::Float).unwrap();
        for (x, y, z) in [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 2.0, 3.0)] {
            let row = vertex.append_row(vec![0, 0, 0]).unwrap();
            vertex.set_f64(row, "x", x).unwrap();
            vertex.set_f64(row, "y", y).unwrap();
            vertex.set_f64(row, "z", z).unwrap();
        }
        ply.add_element(Element::Fixed(vertex));
        let face = ListElement::new(
            FACE,
            ListDef::new(ScalarType::UChar, ScalarType::Int, "vertex_index"),
        );
        ply.add_element(Element::List(face));
        ply
    }

    #[test]
    fn format_parse() {
        assert_eq!("ascii".parse::<Format>().unwrap(), Format::Ascii);
        assert_eq!(
            "binary_big_endian".parse::<Format>().unwrap(),
            Format::BinaryBigEndian
        );
        assert!(matches!(
            "binary_middle_endian".parse::<Format>(),
            Err(PlyError::InvalidFormat(_))
        ));
    }

    #[test]
    fn counts_and_coords() {
        let ply = small_model();
        assert_eq!(ply.vertex_count(), 3);
        assert_eq!(ply.face_count(), 0);
        let c = ply.vertex_coords(2).unwrap();
        assert_eq!((c.x, c.y, c.z), (0.0, 2.0, 3.0));
    }

    #[test]
    fn bounding_box_covers_all_vertices() {
        let ply = small_model();
        let b = ply.bounding_box().unwrap();
        assert_eq!((b.min.x, b.max.x), (0.0, 1.0));
        assert_eq!((b.min.y, b.max.y), (0.0, 2.0));
        assert_eq!((b.min.z, b.max.z), (0.0, 3.0));
    }

    #[test]
    fn scale_multiplies_each_axis() {
        let mut ply = small_model();
        ply.scale(2.0, 3.0, 0.5).unwrap();
        let c = ply.vertex_coords(2).unwrap();
        assert_eq!((c.x, c.y, c.z), (0.0, 6.0, 1.5));
    }

    #[test]
    fn scale_without_vertex_element_fails() {
        let mut ply = Ply::new();
        assert!(matches!(
            ply.scale(1.0, 1.0, 1.0),
            Err(PlyError::MissingElement(VERTEX))
        ));
    }

    #[test]
    fn colour_probe_adds_missing_properties() {
        let mut ply = small_model();
        ply.set_all_vertex_colors(10, 20, 30).unwrap();
        let vertex = ply.element(VERTEX).unwrap().as_fixed().unwrap();
        assert_eq!(vertex.properties().len(), 6);
        assert_eq!(vertex.get(1, "green").unwrap(), "20");
        // second call goes down the existing-property path
        ply.set_all_vertex_colors(1, 2, 3).unwrap();
        let vertex = ply.element(VERTEX).unwrap().as_fixed().unwrap();
        assert_eq!(vertex.properties().len(), 6);
        assert_eq!(vertex.get(0, "blue").unwrap(), "3");
    }

    #[test]
    fn single_vertex_colour_requires_existing_properties() {
        let mut ply = small_model();
        assert!(matches!(
            ply.set_vertex_color(0, 1, 2, 3),
            Err(PlyError::UnknownProperty(_))
        ));
        ply.set_all_vertex_colors(0, 0, 0).unwrap();
        ply.set_vertex_color(0, 9, 9, 9).unwrap();
        let vertex = ply.element(VERTEX).unwrap().as_fixed().unwrap();
        assert_eq!(vertex.get(0, "red").unwrap(), "9");
    }

    #[test]
    fn duplicate_vertex_appends_copy() {
        let mut ply = small_model();
        let j = ply.duplicate_vertex(1).unwrap();
        assert_eq!(j, 3);
        assert_eq!(ply.vertex_count(), 4);
        assert_eq!(ply.vertex_coords(3).unwrap(), ply.vertex_coords(1).unwrap());
    }

    #[test]
    fn faces_append_and_read_back() {
        let mut ply = small_model();
        ply.add_face(&[0, 1, 2]).unwrap();
        assert_eq!(ply.face_count(), 1);
        assert_eq!(ply.face_row(0).unwrap(), vec!["0", "1", "2"]);
    }

    #[test]
    fn header_suppresses_empty_elements() {
        let ply = small_model();
        let header = ply.print_header();
        assert!(header.contains("element vertex 3"));
        assert!(!header.contains("element face"));
        assert!(header.ends_with("end_header\n"));
    }
}
