//! Writes a [`Ply`] to any `Write` sink.
//!
//! Writing is a pure read of the model: the header is rendered first (in
//! ASCII whatever the payload format), then each element streams its rows in
//! header order. Elements without rows are suppressed from both the header
//! and the payload.

use std::io::Write;

use crate::errors::PlyResult;
use crate::ply::Ply;

/// Writes `Ply` models in any of the three standard encodings.
///
/// # Examples
///
/// ```
/// use lidar_ply::parser::Parser;
/// use lidar_ply::writer::Writer;
///
/// let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nend_header\n0.5\n";
/// let ply = Parser::new().read_ply(&mut text.as_bytes()).unwrap();
///
/// let mut out = Vec::new();
/// Writer::new().write_ply(&mut out, &ply).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), text);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Writer;

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Writer
    }

    /// Writes the complete document, header and payload, in the model's
    /// current format.
    pub fn write_ply<W: Write>(&self, writer: &mut W, ply: &Ply) -> PlyResult<()> {
        writer.write_all(ply.print_header().as_bytes())?;
        let format = ply.format();
        for (_, element) in ply.elements() {
            if !element.is_empty() {
                element.write_rows(writer, format)?;
            }
        }
        Ok(())
    }
}
