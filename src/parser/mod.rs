//! Reads ASCII or binary PLY data into a [`Ply`].
//!
//! The header is a finite-state line parser over the grammar in
//! [`grammar`]; the payload is then streamed element by element, each
//! element decoding its own rows under the declared format. Header lines are
//! consumed byte-exactly (up to and including `\n`), so for binary files the
//! payload starts at precisely the byte after `end_header\n` and no stray
//! byte is ever swallowed.

mod grammar;

pub use self::grammar::Line;

use log::debug;
use std::io::BufRead;

use self::grammar::grammar as grammar_rules;
use crate::errors::{PlyError, PlyResult};
use crate::ply::{Element, FixedElement, ListDef, ListElement, Ply, ScalarType};
use crate::util::LocationTracker;

/// Reads data given by a `BufRead` into a [`Ply`].
///
/// # Examples
///
/// ```
/// use lidar_ply::parser::Parser;
///
/// let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nend_header\n0.5\n";
/// let mut bytes = text.as_bytes();
/// let ply = Parser::new().read_ply(&mut bytes).unwrap();
/// assert_eq!(ply.vertex_count(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser;

/// An element block being assembled while the header is parsed.
///
/// An `element` line opens a block whose flavour is unknown until its first
/// property line arrives; the block is sealed by the next `element` line or
/// by `end_header`.
enum Block {
    None,
    Pending { name: String, count: usize },
    Open(Element),
}

impl Parser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Parser
    }

    /// Reads a complete PLY document: header, then payload.
    pub fn read_ply<R: BufRead>(&self, reader: &mut R) -> PlyResult<Ply> {
        let mut location = LocationTracker::new();
        let mut ply = self.read_header(reader, &mut location)?;
        self.read_payload(reader, &mut ply)?;
        ply.refresh_cached_indices();
        Ok(ply)
    }

    /// Reads the header up to and including `end_header`, returning a model
    /// whose elements carry their declared counts but no rows yet.
    pub fn read_header<R: BufRead>(
        &self,
        reader: &mut R,
        location: &mut LocationTracker,
    ) -> PlyResult<Ply> {
        let line = self
            .next_line(reader, location)?
            .ok_or_else(|| self.malformed(location, "missing 'ply' magic number"))?;
        match self.parse_line(&line, location)? {
            Line::MagicNumber => {}
            _ => return Err(self.malformed(location, "first line must be 'ply'")),
        }

        let line = self
            .next_line(reader, location)?
            .ok_or_else(|| self.malformed(location, "missing format line"))?;
        let mut ply = Ply::new();
        match self.parse_line(&line, location)? {
            Line::Format { name, version } => {
                ply.set_format(name.parse()?);
                ply.set_version(version);
            }
            _ => return Err(self.malformed(location, "second line must be 'format <fmt> <version>'")),
        }

        let mut block = Block::None;
        loop {
            let line = self
                .next_line(reader, location)?
                .ok_or_else(|| self.malformed(location, "unexpected end of file (missing 'end_header')"))?;
            match self.parse_line(&line, location)? {
                Line::Comment(c) => ply.add_comment(c),
                Line::Element { name, count } => {
                    self.seal_block(&mut ply, block, location)?;
                    if ply.elements().contains_key(&name) {
                        return Err(self.malformed(
                            location,
                            &format!("duplicate element '{}'", name),
                        ));
                    }
                    block = Block::Pending { name, count };
                }
                Line::Property { type_name, name } => {
                    let data_type = ScalarType::parse(&type_name)?;
                    block = match block {
                        Block::None => {
                            return Err(PlyError::PropertyBeforeElement(location.line_index))
                        }
                        Block::Pending { name: elem, count } => {
                            let mut element = FixedElement::new(elem);
                            element.set_declared_count(count);
                            element.add_property(name, data_type)?;
                            Block::Open(Element::Fixed(element))
                        }
                        Block::Open(Element::Fixed(mut element)) => {
                            element.add_property(name, data_type)?;
                            Block::Open(Element::Fixed(element))
                        }
                        Block::Open(Element::List(_)) => {
                            return Err(self.malformed(
                                location,
                                "a list element takes exactly one property",
                            ))
                        }
                    };
                }
                Line::PropertyList {
                    count_type,
                    item_type,
                    name,
                } => {
                    let count_type = ScalarType::parse(&count_type)?;
                    let item_type = ScalarType::parse(&item_type)?;
                    block = match block {
                        Block::None => {
                            return Err(PlyError::PropertyBeforeElement(location.line_index))
                        }
                        Block::Pending { name: elem, count } => {
                            let mut element = ListElement::new(
                                elem,
                                ListDef::new(count_type, item_type, name),
                            );
                            element.set_declared_count(count);
                            Block::Open(Element::List(element))
                        }
                        Block::Open(_) => {
                            return Err(self.malformed(
                                location,
                                "a list property must be the first property of its element",
                            ))
                        }
                    };
                }
                Line::EndHeader => {
                    self.seal_block(&mut ply, block, location)?;
                    break;
                }
                Line::MagicNumber => {
                    return Err(self.malformed(location, "unexpected 'ply'"))
                }
                Line::Format { .. } => {
                    return Err(self.malformed(location, "unexpected second format line"))
                }
            }
        }
        debug!(
            "header parsed: {} format, {} elements",
            ply.format(),
            ply.elements().len()
        );
        Ok(ply)
    }

    /// Reads every element's rows in header order, under the model's format.
    pub fn read_payload<R: BufRead>(&self, reader: &mut R, ply: &mut Ply) -> PlyResult<()> {
        let format = ply.format();
        for (_, element) in ply.elements_mut() {
            debug!(
                "reading {} rows of element '{}'",
                element.declared_count(),
                element.name()
            );
            element.read_rows(reader, format)?;
        }
        Ok(())
    }

    /// Reads one raw header line including the terminating `\n`, strips the
    /// line ending, and rejects non-UTF-8 bytes.
    fn next_line<R: BufRead>(
        &self,
        reader: &mut R,
        location: &mut LocationTracker,
    ) -> PlyResult<Option<String>> {
        let mut buf = Vec::new();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        location.next_line();
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        String::from_utf8(buf)
            .map(Some)
            .map_err(|_| self.malformed(location, "header line is not valid UTF-8"))
    }

    fn parse_line(&self, line: &str, location: &LocationTracker) -> PlyResult<Line> {
        grammar_rules::line(line).map_err(|e| PlyError::MalformedHeader {
            line: location.line_index,
            reason: format!("'{}': {}", line, e),
        })
    }

    fn seal_block(
        &self,
        ply: &mut Ply,
        block: Block,
        location: &LocationTracker,
    ) -> PlyResult<()> {
        match block {
            Block::None => Ok(()),
            Block::Pending { name, .. } => Err(self.malformed(
                location,
                &format!("element '{}' has no properties", name),
            )),
            Block::Open(element) => {
                ply.add_element(element);
                Ok(())
            }
        }
    }

    fn malformed(&self, location: &LocationTracker, reason: &str) -> PlyError {
        PlyError::MalformedHeader {
            line: location.line_index,
            reason: reason.to_string(),
        }
    }
}
