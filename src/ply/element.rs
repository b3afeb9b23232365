//! Element storage: the two flavours of PLY element and their row codecs.
//!
//! A [`FixedElement`] owns an ordered list of scalar properties and rows of
//! matching width. A [`ListElement`] owns exactly one list property; each of
//! its rows is an independently sized run of scalars. Both store their values
//! as type-tagged `u64` words (see [`super::scalar`]), so a row is nothing
//! more than a `Vec<u64>` interpreted through the schema.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::{BufRead, ErrorKind, Write};

use super::model::Format;
use super::scalar::{word_as_len, ScalarType};
use crate::errors::{PlyError, PlyResult};
use crate::util::split_line;

/// A named, typed column of a fixed element.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PropertyDef {
    /// Property name, unique within its element.
    pub name: String,
    /// Declared scalar type; set once at schema creation.
    pub data_type: ScalarType,
}

impl PropertyDef {
    /// Creates a new property definition.
    pub fn new(name: impl Into<String>, data_type: ScalarType) -> Self {
        PropertyDef {
            name: name.into(),
            data_type,
        }
    }
}

/// The single list property of a list element.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ListDef {
    /// Type encoding the per-row length on the wire.
    pub count_type: ScalarType,
    /// Type of the list members.
    pub item_type: ScalarType,
    /// Property name, e.g. `vertex_index`.
    pub name: String,
}

impl ListDef {
    /// Creates a new list property definition.
    pub fn new(count_type: ScalarType, item_type: ScalarType, name: impl Into<String>) -> Self {
        ListDef {
            count_type,
            item_type,
            name: name.into(),
        }
    }
}

/// An element whose rows all share the same fixed-width schema, e.g.
/// `element vertex 8` with one `property float x` line per column.
#[derive(Debug, PartialEq, Clone)]
pub struct FixedElement {
    name: String,
    /// Row count declared in the header; only consulted while reading the
    /// payload. After that the row vector itself is authoritative.
    count: usize,
    properties: Vec<PropertyDef>,
    rows: Vec<Vec<u64>>,
}

impl FixedElement {
    /// Creates an empty element with no properties and no rows.
    pub fn new(name: impl Into<String>) -> Self {
        FixedElement {
            name: name.into(),
            count: 0,
            properties: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared header count, used when reading the payload.
    pub fn declared_count(&self) -> usize {
        self.count
    }

    /// Sets the declared header count.
    pub fn set_declared_count(&mut self, count: usize) {
        self.count = count;
    }

    /// Actual number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the element holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The ordered property schema.
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    /// Appends a property column.
    ///
    /// Existing rows are extended with a zero scalar so that every row keeps
    /// the same width as the schema.
    pub fn add_property(&mut self, name: impl Into<String>, data_type: ScalarType) -> PlyResult<()> {
        let name = name.into();
        if self.properties.iter().any(|p| p.name == name) {
            return Err(PlyError::DuplicateProperty(name));
        }
        self.properties.push(PropertyDef::new(name, data_type));
        for row in &mut self.rows {
            row.push(0);
        }
        Ok(())
    }

    fn property_index(&self, name: &str) -> PlyResult<usize> {
        self.properties
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| PlyError::UnknownProperty(name.to_string()))
    }

    fn check_row(&self, row: usize) -> PlyResult<()> {
        if row >= self.rows.len() {
            return Err(PlyError::RowIndexOutOfRange(row));
        }
        Ok(())
    }

    /// Returns one scalar as text.
    ///
    /// The property lookup happens before the row check, so probing an empty
    /// element for a property still reports `UnknownProperty`.
    pub fn get(&self, row: usize, property: &str) -> PlyResult<String> {
        let idx = self.property_index(property)?;
        self.check_row(row)?;
        Ok(self.properties[idx].data_type.unpack_ascii(self.rows[row][idx]))
    }

    /// Parses `value` under the property's type and stores it.
    pub fn set(&mut self, row: usize, property: &str, value: &str) -> PlyResult<()> {
        let idx = self.property_index(property)?;
        self.check_row(row)?;
        self.rows[row][idx] = self.properties[idx].data_type.pack_ascii(value)?;
        Ok(())
    }

    /// Returns one scalar converted to `f64`.
    pub fn get_f64(&self, row: usize, property: &str) -> PlyResult<f64> {
        let idx = self.property_index(property)?;
        self.check_row(row)?;
        let word = self.rows[row][idx];
        Ok(match self.properties[idx].data_type {
            ScalarType::Float => f64::from(f32::from_bits(word as u32)),
            ScalarType::Double => f64::from_bits(word),
            ScalarType::Char => f64::from(word as u8 as i8),
            ScalarType::Short => f64::from(word as u16 as i16),
            ScalarType::Int => f64::from(word as u32 as i32),
            _ => word as f64,
        })
    }

    /// Stores an `f64` converted to the property's type.
    pub fn set_f64(&mut self, row: usize, property: &str, value: f64) -> PlyResult<()> {
        let idx = self.property_index(property)?;
        self.check_row(row)?;
        self.rows[row][idx] = match self.properties[idx].data_type {
            ScalarType::Float => u64::from((value as f32).to_bits()),
            ScalarType::Double => value.to_bits(),
            ScalarType::Char => (value as i8) as u8 as u64,
            ScalarType::Short => (value as i16) as u16 as u64,
            ScalarType::Int => (value as i32) as u32 as u64,
            ScalarType::UChar => (value as u8) as u64,
            ScalarType::UShort => (value as u16) as u64,
            ScalarType::UInt => (value as u32) as u64,
        };
        Ok(())
    }

    /// Appends a row of pre-packed words. No type checking is done, but the
    /// width must match the property count.
    pub fn append_row(&mut self, words: Vec<u64>) -> PlyResult<usize> {
        if words.len() != self.properties.len() {
            return Err(PlyError::ArityMismatch {
                got: words.len(),
                expected: self.properties.len(),
            });
        }
        self.rows.push(words);
        Ok(self.rows.len() - 1)
    }

    /// Copies an existing row verbatim, returning the new row's index.
    pub fn duplicate_row(&mut self, row: usize) -> PlyResult<usize> {
        self.check_row(row)?;
        let copy = self.rows[row].clone();
        self.rows.push(copy);
        Ok(self.rows.len() - 1)
    }

    fn header_text(&self) -> String {
        let mut out = format!("element {} {}\n", self.name, self.rows.len());
        for p in &self.properties {
            out.push_str(&format!("property {} {}\n", p.data_type, p.name));
        }
        out
    }

    fn read_rows_ascii<R: BufRead>(&mut self, reader: &mut R) -> PlyResult<()> {
        let mut line = String::with_capacity(128);
        for i in 0..self.count {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(unexpected_eof(&self.name, self.count, i));
            }
            let tokens = split_line(&line);
            if tokens.len() != self.properties.len() {
                return Err(PlyError::ArityMismatch {
                    got: tokens.len(),
                    expected: self.properties.len(),
                });
            }
            let mut row = Vec::with_capacity(tokens.len());
            for (token, p) in tokens.iter().zip(&self.properties) {
                row.push(p.data_type.pack_ascii(token)?);
            }
            self.rows.push(row);
        }
        Ok(())
    }

    fn read_rows_binary<R: BufRead, B: ByteOrder>(&mut self, reader: &mut R) -> PlyResult<()> {
        for i in 0..self.count {
            let mut row = Vec::with_capacity(self.properties.len());
            for p in &self.properties {
                let word = p
                    .data_type
                    .read_word::<R, B>(reader)
                    .map_err(|e| eof_context(e, &self.name, self.count, i))?;
                row.push(word);
            }
            self.rows.push(row);
        }
        Ok(())
    }

    fn write_rows_ascii<W: Write>(&self, writer: &mut W) -> PlyResult<()> {
        for row in &self.rows {
            let mut line = String::new();
            for (i, (word, p)) in row.iter().zip(&self.properties).enumerate() {
                if i > 0 {
                    line.push(' ');
                }
                line.push_str(&p.data_type.unpack_ascii(*word));
            }
            line.push('\n');
            writer.write_all(line.as_bytes())?;
        }
        Ok(())
    }

    fn write_rows_binary<W: Write, B: ByteOrder>(&self, writer: &mut W) -> PlyResult<()> {
        for row in &self.rows {
            for (word, p) in row.iter().zip(&self.properties) {
                p.data_type.write_word::<W, B>(writer, *word)?;
            }
        }
        Ok(())
    }
}

/// An element holding exactly one variable-length list property, e.g.
/// `element face 12` with `property list uchar int vertex_index`.
#[derive(Debug, PartialEq, Clone)]
pub struct ListElement {
    name: String,
    count: usize,
    schema: ListDef,
    /// Each row stores the list members only; the on-wire length is derived.
    rows: Vec<Vec<u64>>,
}

impl ListElement {
    /// Creates an empty list element with the given schema.
    pub fn new(name: impl Into<String>, schema: ListDef) -> Self {
        ListElement {
            name: name.into(),
            count: 0,
            schema,
            rows: Vec::new(),
        }
    }

    /// Element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared header count, used when reading the payload.
    pub fn declared_count(&self) -> usize {
        self.count
    }

    /// Sets the declared header count.
    pub fn set_declared_count(&mut self, count: usize) {
        self.count = count;
    }

    /// Actual number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the element holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The list property schema.
    pub fn schema(&self) -> &ListDef {
        &self.schema
    }

    /// Replaces the list schema. Call before appending any rows; existing
    /// rows are reinterpreted, not converted.
    pub fn set_schema(&mut self, count_type: ScalarType, item_type: ScalarType, name: impl Into<String>) {
        self.schema = ListDef::new(count_type, item_type, name);
    }

    /// Returns one row as text tokens, one per list member.
    pub fn get_row(&self, row: usize) -> PlyResult<Vec<String>> {
        let words = self
            .rows
            .get(row)
            .ok_or(PlyError::RowIndexOutOfRange(row))?;
        Ok(words
            .iter()
            .map(|w| self.schema.item_type.unpack_ascii(*w))
            .collect())
    }

    /// Parses text tokens under the item type and appends them as a new row.
    pub fn append_row(&mut self, values: &[&str]) -> PlyResult<usize> {
        let mut row = Vec::with_capacity(values.len());
        for v in values {
            row.push(self.schema.item_type.pack_ascii(v)?);
        }
        self.rows.push(row);
        Ok(self.rows.len() - 1)
    }

    fn header_text(&self) -> String {
        format!(
            "element {} {}\nproperty list {} {} {}\n",
            self.name,
            self.rows.len(),
            self.schema.count_type,
            self.schema.item_type,
            self.schema.name
        )
    }

    fn read_rows_ascii<R: BufRead>(&mut self, reader: &mut R) -> PlyResult<()> {
        let mut line = String::with_capacity(128);
        for i in 0..self.count {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(unexpected_eof(&self.name, self.count, i));
            }
            let tokens = split_line(&line);
            if tokens.is_empty() {
                return Err(PlyError::ParseError(format!(
                    "empty list row in element '{}'",
                    self.name
                )));
            }
            let len_word = self.schema.count_type.pack_ascii(tokens[0])?;
            let len = word_as_len(self.schema.count_type, len_word)?;
            if tokens.len() - 1 != len {
                return Err(PlyError::ArityMismatch {
                    got: tokens.len() - 1,
                    expected: len,
                });
            }
            let mut row = Vec::with_capacity(len);
            for token in &tokens[1..] {
                row.push(self.schema.item_type.pack_ascii(token)?);
            }
            self.rows.push(row);
        }
        Ok(())
    }

    fn read_rows_binary<R: BufRead, B: ByteOrder>(&mut self, reader: &mut R) -> PlyResult<()> {
        for i in 0..self.count {
            let len_word = self
                .schema
                .count_type
                .read_word::<R, B>(reader)
                .map_err(|e| eof_context(e, &self.name, self.count, i))?;
            let len = word_as_len(self.schema.count_type, len_word)?;
            let mut row = Vec::with_capacity(len);
            for _ in 0..len {
                row.push(
                    self.schema
                        .item_type
                        .read_word::<R, B>(reader)
                        .map_err(|e| eof_context(e, &self.name, self.count, i))?,
                );
            }
            self.rows.push(row);
        }
        Ok(())
    }

    fn write_rows_ascii<W: Write>(&self, writer: &mut W) -> PlyResult<()> {
        for row in &self.rows {
            let mut line = self.schema.count_type.unpack_ascii(row.len() as u64);
            for word in row {
                line.push(' ');
                line.push_str(&self.schema.item_type.unpack_ascii(*word));
            }
            line.push('\n');
            writer.write_all(line.as_bytes())?;
        }
        Ok(())
    }

    fn write_rows_binary<W: Write, B: ByteOrder>(&self, writer: &mut W) -> PlyResult<()> {
        for row in &self.rows {
            self.schema
                .count_type
                .write_word::<W, B>(writer, row.len() as u64)?;
            for word in row {
                self.schema.item_type.write_word::<W, B>(writer, *word)?;
            }
        }
        Ok(())
    }
}

/// A PLY element of either flavour.
///
/// The two variants share the operations the reader and writer need; the
/// dispatch is a plain match, one arm per flavour.
#[derive(Debug, PartialEq, Clone)]
pub enum Element {
    /// Fixed-width rows, one scalar per declared property.
    Fixed(FixedElement),
    /// Variable-length rows under a single list property.
    List(ListElement),
}

impl Element {
    /// Element name.
    pub fn name(&self) -> &str {
        match self {
            Element::Fixed(e) => e.name(),
            Element::List(e) => e.name(),
        }
    }

    /// Actual number of rows.
    pub fn len(&self) -> usize {
        match self {
            Element::Fixed(e) => e.len(),
            Element::List(e) => e.len(),
        }
    }

    /// True if the element holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Declared header count, used when reading the payload.
    pub fn declared_count(&self) -> usize {
        match self {
            Element::Fixed(e) => e.declared_count(),
            Element::List(e) => e.declared_count(),
        }
    }

    /// Sets the declared header count.
    pub fn set_declared_count(&mut self, count: usize) {
        match self {
            Element::Fixed(e) => e.set_declared_count(count),
            Element::List(e) => e.set_declared_count(count),
        }
    }

    /// The `element`/`property` header block for this element. The row count
    /// written is the actual row count, not the declared one.
    pub fn header_text(&self) -> String {
        match self {
            Element::Fixed(e) => e.header_text(),
            Element::List(e) => e.header_text(),
        }
    }

    /// Reads `declared_count` rows from the payload in the given format.
    pub fn read_rows<R: BufRead>(&mut self, reader: &mut R, format: Format) -> PlyResult<()> {
        match (self, format) {
            (Element::Fixed(e), Format::Ascii) => e.read_rows_ascii(reader),
            (Element::Fixed(e), Format::BinaryBigEndian) => {
                e.read_rows_binary::<R, BigEndian>(reader)
            }
            (Element::Fixed(e), Format::BinaryLittleEndian) => {
                e.read_rows_binary::<R, LittleEndian>(reader)
            }
            (Element::List(e), Format::Ascii) => e.read_rows_ascii(reader),
            (Element::List(e), Format::BinaryBigEndian) => {
                e.read_rows_binary::<R, BigEndian>(reader)
            }
            (Element::List(e), Format::BinaryLittleEndian) => {
                e.read_rows_binary::<R, LittleEndian>(reader)
            }
        }
    }

    /// Writes every row to the payload in the given format.
    pub fn write_rows<W: Write>(&self, writer: &mut W, format: Format) -> PlyResult<()> {
        match (self, format) {
            (Element::Fixed(e), Format::Ascii) => e.write_rows_ascii(writer),
            (Element::Fixed(e), Format::BinaryBigEndian) => {
                e.write_rows_binary::<W, BigEndian>(writer)
            }
            (Element::Fixed(e), Format::BinaryLittleEndian) => {
                e.write_rows_binary::<W, LittleEndian>(writer)
            }
            (Element::List(e), Format::Ascii) => e.write_rows_ascii(writer),
            (Element::List(e), Format::BinaryBigEndian) => {
                e.write_rows_binary::<W, BigEndian>(writer)
            }
            (Element::List(e), Format::BinaryLittleEndian) => {
                e.write_rows_binary::<W, LittleEndian>(writer)
            }
        }
    }

    /// Borrows the fixed flavour, if that is what this element is.
    pub fn as_fixed(&self) -> Option<&FixedElement> {
        match self {
            Element::Fixed(e) => Some(e),
            Element::List(_) => None,
        }
    }

    /// Mutably borrows the fixed flavour.
    pub fn as_fixed_mut(&mut self) -> Option<&mut FixedElement> {
        match self {
            Element::Fixed(e) => Some(e),
            Element::List(_) => None,
        }
    }

    /// Borrows the list flavour, if that is what this element is.
    pub fn as_list(&self) -> Option<&ListElement> {
        match self {
            Element::List(e) => Some(e),
            Element::Fixed(_) => None,
        }
    }

    /// Mutably borrows the list flavour.
    pub fn as_list_mut(&mut self) -> Option<&mut ListElement> {
        match self {
            Element::List(e) => Some(e),
            Element::Fixed(_) => None,
        }
    }
}

fn unexpected_eof(name: &str, expected: usize, got: usize) -> PlyError {
    PlyError::Io(std::io::Error::new(
        ErrorKind::UnexpectedEof,
        format!(
            "unexpected end of file while reading element '{}' (expected {}, got {})",
            name, expected, got
        ),
    ))
}

fn eof_context(err: PlyError, name: &str, expected: usize, got: usize) -> PlyError {
    match err {
        PlyError::Io(ref io_err) if io_err.kind() == ErrorKind::UnexpectedEof => {
            unexpected_eof(name, expected, got)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn xyz_element() -> FixedElement {
        let mut e = FixedElement::new("vertex");
        e.add_property("x", ScalarType::Float).unwrap();
        e.add_property("y", ScalarType::Float).unwrap();
        e.add_property("z", ScalarType::Float).unwrap();
        e
    }

    #[test]
    fn duplicate_property_rejected() {
        let mut e = xyz_element();
        assert!(matches!(
            e.add_property("x", ScalarType::Double),
            Err(PlyError::DuplicateProperty(_))
        ));
    }

    #[test]
    fn late_property_zero_fills_rows() {
        let mut e = xyz_element();
        e.append_row(vec![
            ScalarType::Float.pack_ascii("1").unwrap(),
            ScalarType::Float.pack_ascii("2").unwrap(),
            ScalarType::Float.pack_ascii("3").unwrap(),
        ])
        .unwrap();
        e.add_property("red", ScalarType::UChar).unwrap();
        assert_eq!(e.get(0, "red").unwrap(), "0");
        // new appends must now be four wide
        assert!(matches!(
            e.append_row(vec![0, 0, 0]),
            Err(PlyError::ArityMismatch { got: 3, expected: 4 })
        ));
        assert!(e.append_row(vec![0, 0, 0, 0]).is_ok());
    }

    #[test]
    fn get_set_round_trip() {
        let mut e = xyz_element();
        e.append_row(vec![0, 0, 0]).unwrap();
        e.set(0, "y", "2.5").unwrap();
        assert_eq!(e.get(0, "y").unwrap(), "2.5");
        assert_eq!(e.get_f64(0, "y").unwrap(), 2.5);
        assert!(matches!(
            e.get(0, "w"),
            Err(PlyError::UnknownProperty(_))
        ));
        assert!(matches!(
            e.get(3, "x"),
            Err(PlyError::RowIndexOutOfRange(3))
        ));
    }

    #[test]
    fn duplicate_row_copies_verbatim() {
        let mut e = xyz_element();
        e.append_row(vec![1, 2, 3]).unwrap();
        let j = e.duplicate_row(0).unwrap();
        assert_eq!(j, 1);
        assert_eq!(e.len(), 2);
        assert_eq!(e.get(1, "x").unwrap(), e.get(0, "x").unwrap());
    }

    #[test]
    fn ascii_row_read_checks_arity() {
        let mut e = xyz_element();
        e.set_declared_count(1);
        let mut cursor = Cursor::new(b"1.0 2.0\n".to_vec());
        let mut el = Element::Fixed(e);
        assert!(matches!(
            el.read_rows(&mut cursor, Format::Ascii),
            Err(PlyError::ArityMismatch { got: 2, expected: 3 })
        ));
    }

    #[test]
    fn fixed_binary_round_trip() {
        let mut e = xyz_element();
        e.append_row(vec![
            ScalarType::Float.pack_ascii("1.5").unwrap(),
            ScalarType::Float.pack_ascii("-2.25").unwrap(),
            ScalarType::Float.pack_ascii("0.125").unwrap(),
        ])
        .unwrap();
        let el = Element::Fixed(e.clone());

        for format in [Format::BinaryBigEndian, Format::BinaryLittleEndian] {
            let mut buf = Vec::new();
            el.write_rows(&mut buf, format).unwrap();
            assert_eq!(buf.len(), 12);

            let mut back = xyz_element();
            back.set_declared_count(1);
            let mut back = Element::Fixed(back);
            let mut cursor = Cursor::new(buf);
            back.read_rows(&mut cursor, format).unwrap();
            assert_eq!(back.as_fixed().unwrap().rows, e.rows);
        }
    }

    #[test]
    fn list_round_trip_all_formats() {
        let schema = ListDef::new(ScalarType::UChar, ScalarType::Int, "vertex_index");
        let mut e = ListElement::new("face", schema.clone());
        e.append_row(&["0", "1", "2"]).unwrap();
        e.append_row(&["2", "3", "0", "1"]).unwrap();
        let el = Element::List(e.clone());

        for format in [
            Format::Ascii,
            Format::BinaryBigEndian,
            Format::BinaryLittleEndian,
        ] {
            let mut buf = Vec::new();
            el.write_rows(&mut buf, format).unwrap();

            let mut back = ListElement::new("face", schema.clone());
            back.set_declared_count(2);
            let mut back = Element::List(back);
            let mut cursor = Cursor::new(buf);
            back.read_rows(&mut cursor, format).unwrap();
            assert_eq!(back.as_list().unwrap().rows, e.rows);
        }
    }

    #[test]
    fn list_ascii_length_token_is_checked() {
        let schema = ListDef::new(ScalarType::UChar, ScalarType::Int, "vertex_index");
        let mut e = ListElement::new("face", schema);
        e.set_declared_count(1);
        let mut el = Element::List(e);
        let mut cursor = Cursor::new(b"3 0 1\n".to_vec());
        assert!(matches!(
            el.read_rows(&mut cursor, Format::Ascii),
            Err(PlyError::ArityMismatch { got: 2, expected: 3 })
        ));
    }

    #[test]
    fn header_text_uses_actual_row_count() {
        let mut e = xyz_element();
        e.set_declared_count(99);
        e.append_row(vec![0, 0, 0]).unwrap();
        let el = Element::Fixed(e);
        assert_eq!(
            el.header_text(),
            "element vertex 1\nproperty float x\nproperty float y\nproperty float z\n"
        );
    }

    #[test]
    fn truncated_binary_payload_reports_eof() {
        let mut e = xyz_element();
        e.set_declared_count(2);
        let mut el = Element::Fixed(e);
        let mut cursor = Cursor::new(vec![0u8; 12]); // one row, two declared
        let err = el
            .read_rows(&mut cursor, Format::BinaryLittleEndian)
            .unwrap_err();
        assert!(err.to_string().contains("expected 2, got 1"));
    }
}
