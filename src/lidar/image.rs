//! Colour overlay images.
//!
//! An overlay is an RGB raster co-registered with a height-field grid. Two
//! sources are supported: ImageMagick text dumps (`convert image.png
//! image.txt`) and PNG files. Images store row 0 at the top; the overlay is
//! flipped vertically on load so that its row 0 aligns with grid row 0, the
//! southern edge.

use log::info;
use std::fs;
use std::path::Path;

use crate::errors::{PlyError, PlyResult};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const MAGICK_HEADER: &str = "# ImageMagick pixel enumeration:";

/// One overlay pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red, 0-255.
    pub red: u8,
    /// Green, 0-255.
    pub green: u8,
    /// Blue, 0-255.
    pub blue: u8,
}

/// An RGB raster with row 0 at the southern edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Overlay {
    /// Reads an overlay from a file, sniffing PNG against the ImageMagick
    /// text format.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> PlyResult<Overlay> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| PlyError::IoPath {
            path: path.to_path_buf(),
            source: e,
        })?;
        let overlay = if data.starts_with(&PNG_SIGNATURE) {
            Overlay::read_png(&data)
        } else {
            let text = std::str::from_utf8(&data).map_err(|_| {
                PlyError::ParseError("overlay is neither PNG nor UTF-8 text".to_string())
            })?;
            Overlay::read_magick_text(text)
        }
        .map_err(|e| e.with_path(path))?;
        info!(
            "read {}: {}x{} overlay",
            path.display(),
            overlay.width,
            overlay.height
        );
        Ok(overlay)
    }

    /// Parses an ImageMagick pixel enumeration dump.
    pub fn read_magick_text(text: &str) -> PlyResult<Overlay> {
        let mut lines = text.lines();
        let header = lines
            .next()
            .ok_or_else(|| PlyError::ParseError("empty overlay text".to_string()))?;
        let dims = header
            .strip_prefix(MAGICK_HEADER)
            .ok_or_else(|| {
                PlyError::ParseError("missing ImageMagick pixel enumeration header".to_string())
            })?
            .trim();
        let mut fields = dims.split(',');
        let width = parse_dim(fields.next())?;
        let height = parse_dim(fields.next())?;

        let mut pixels = vec![
            Rgb {
                red: 0,
                green: 0,
                blue: 0
            };
            width as usize * height as usize
        ];
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (coords, rest) = line.split_once(':').ok_or_else(|| {
                PlyError::ParseError(format!("pixel line '{}' has no coordinate", line))
            })?;
            let (x, y) = coords.split_once(',').ok_or_else(|| {
                PlyError::ParseError(format!("bad pixel coordinate '{}'", coords))
            })?;
            let x = parse_dim(Some(x))?;
            let y = parse_dim(Some(y))?;
            if x >= width || y >= height {
                return Err(PlyError::PixelOutOfRange(x, y));
            }
            let open = rest.find('(').ok_or_else(|| {
                PlyError::ParseError(format!("pixel line '{}' has no colour triple", line))
            })?;
            let close = rest[open..].find(')').ok_or_else(|| {
                PlyError::ParseError(format!("pixel line '{}' has no colour triple", line))
            })? + open;
            let mut channels = rest[open + 1..close].split(',');
            let red = parse_channel(channels.next())?;
            let green = parse_channel(channels.next())?;
            let blue = parse_channel(channels.next())?;
            // flip: dump row 0 is the top, overlay row 0 is the bottom
            let row = (height - 1 - y) as usize;
            pixels[row * width as usize + x as usize] = Rgb { red, green, blue };
        }

        Ok(Overlay {
            width,
            height,
            pixels,
        })
    }

    /// Decodes an 8-bit RGB or RGBA PNG.
    pub fn read_png(data: &[u8]) -> PlyResult<Overlay> {
        let decoder = png::Decoder::new(data);
        let mut reader = decoder
            .read_info()
            .map_err(|e| PlyError::ParseError(format!("PNG: {}", e)))?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let frame = reader
            .next_frame(&mut buf)
            .map_err(|e| PlyError::ParseError(format!("PNG: {}", e)))?;
        if frame.bit_depth != png::BitDepth::Eight {
            return Err(PlyError::ParseError(
                "PNG overlay must be 8 bits per channel".to_string(),
            ));
        }
        let stride = match frame.color_type {
            png::ColorType::Rgb => 3,
            png::ColorType::Rgba => 4,
            other => {
                return Err(PlyError::ParseError(format!(
                    "PNG overlay must be RGB or RGBA, not {:?}",
                    other
                )))
            }
        };
        let (width, height) = (frame.width, frame.height);
        let bytes = &buf[..frame.buffer_size()];
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        // flip: PNG row 0 is the top, overlay row 0 is the bottom
        for y in (0..height as usize).rev() {
            let row = &bytes[y * width as usize * stride..];
            for x in 0..width as usize {
                pixels.push(Rgb {
                    red: row[x * stride],
                    green: row[x * stride + 1],
                    blue: row[x * stride + 2],
                });
            }
        }
        Ok(Overlay {
            width,
            height,
            pixels,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at the given coordinate; row 0 is the southern edge.
    pub fn pixel(&self, x: u32, y: u32) -> PlyResult<Rgb> {
        if x >= self.width || y >= self.height {
            return Err(PlyError::PixelOutOfRange(x, y));
        }
        Ok(self.pixels[y as usize * self.width as usize + x as usize])
    }
}

fn parse_dim(token: Option<&str>) -> PlyResult<u32> {
    let token = token
        .ok_or_else(|| PlyError::ParseError("truncated dimension list".to_string()))?
        .trim();
    token
        .parse()
        .map_err(|e| PlyError::ParseError(format!("'{}': {}", token, e)))
}

fn parse_channel(token: Option<&str>) -> PlyResult<u8> {
    let token = token
        .ok_or_else(|| PlyError::ParseError("truncated colour triple".to_string()))?
        .trim();
    token
        .parse()
        .map_err(|e| PlyError::ParseError(format!("'{}': {}", token, e)))
}
