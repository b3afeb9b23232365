//! Scalar types and the 64-bit word codec.
//!
//! Every payload value, whatever its declared type, is carried in memory as a
//! `u64` word. Integers occupy their natural low-order bits; `float` and
//! `double` store their IEEE-754 bit pattern (for `float`, in the low 32
//! bits). A word is only meaningful together with its [`ScalarType`], which
//! is therefore passed to every pack/unpack operation. This keeps row storage
//! homogeneous and lets the reader decode schemas it has never seen before.

use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::errors::{PlyError, PlyResult};
use crate::util::{expand_exponent, trim_float_text};

/// Scalar type used to encode properties in the payload.
///
/// The set is fixed by the PLY format: 8/16/32-bit integers in signed and
/// unsigned flavours plus the two IEEE-754 float widths.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ScalarType {
    /// Signed 8 bit integer.
    Char,
    /// Unsigned 8 bit integer.
    UChar,
    /// Signed 16 bit integer.
    Short,
    /// Unsigned 16 bit integer.
    UShort,
    /// Signed 32 bit integer.
    Int,
    /// Unsigned 32 bit integer.
    UInt,
    /// 32 bit floating point number.
    Float,
    /// 64 bit floating point number.
    Double,
}

impl ScalarType {
    /// Parses a canonical PLY type name.
    pub fn parse(name: &str) -> PlyResult<ScalarType> {
        match name {
            "char" => Ok(ScalarType::Char),
            "uchar" => Ok(ScalarType::UChar),
            "short" => Ok(ScalarType::Short),
            "ushort" => Ok(ScalarType::UShort),
            "int" => Ok(ScalarType::Int),
            "uint" => Ok(ScalarType::UInt),
            "float" => Ok(ScalarType::Float),
            "double" => Ok(ScalarType::Double),
            other => Err(PlyError::UnknownType(other.to_string())),
        }
    }

    /// The canonical name as written in a header.
    pub fn name(&self) -> &'static str {
        match *self {
            ScalarType::Char => "char",
            ScalarType::UChar => "uchar",
            ScalarType::Short => "short",
            ScalarType::UShort => "ushort",
            ScalarType::Int => "int",
            ScalarType::UInt => "uint",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        match *self {
            ScalarType::Char | ScalarType::UChar => 1,
            ScalarType::Short | ScalarType::UShort => 2,
            ScalarType::Int | ScalarType::UInt => 4,
            ScalarType::Float => 4,
            ScalarType::Double => 8,
        }
    }

    /// True for the six integer variants.
    pub fn is_integer(&self) -> bool {
        !matches!(*self, ScalarType::Float | ScalarType::Double)
    }

    /// Bit mask covering the type's width.
    fn mask(&self) -> u64 {
        match self.size() {
            1 => 0xFF,
            2 => 0xFFFF,
            4 => 0xFFFF_FFFF,
            _ => u64::MAX,
        }
    }

    fn signed_min(&self) -> i64 {
        match *self {
            ScalarType::Char => i64::from(i8::MIN),
            ScalarType::Short => i64::from(i16::MIN),
            ScalarType::Int => i64::from(i32::MIN),
            // unsigned types admit no negative input at all
            _ => 0,
        }
    }

    /// Parses a decimal text token into a word.
    ///
    /// Integer tokens must fit the type's unsigned range; negative tokens are
    /// accepted for the signed variants and stored as the type-width bit
    /// pattern without sign-extension into the upper word bits. Floats store
    /// their bit pattern, each parsed by a routine of its own width.
    pub fn pack_ascii(&self, token: &str) -> PlyResult<u64> {
        match *self {
            ScalarType::Float => {
                let v: f32 = token
                    .parse()
                    .map_err(|e| PlyError::ParseError(format!("'{}': {}", token, e)))?;
                Ok(u64::from(v.to_bits()))
            }
            ScalarType::Double => {
                let v: f64 = token
                    .parse()
                    .map_err(|e| PlyError::ParseError(format!("'{}': {}", token, e)))?;
                Ok(v.to_bits())
            }
            _ => {
                let v: i64 = token
                    .parse()
                    .map_err(|e| PlyError::ParseError(format!("'{}': {}", token, e)))?;
                if v < 0 {
                    if v < self.signed_min() {
                        return Err(PlyError::ValueOutOfRange(token.to_string(), self.name()));
                    }
                    Ok((v as u64) & self.mask())
                } else {
                    if (v as u64) > self.mask() {
                        return Err(PlyError::ValueOutOfRange(token.to_string(), self.name()));
                    }
                    Ok(v as u64)
                }
            }
        }
    }

    /// Formats a word as a decimal text token.
    ///
    /// Integers print the stored bit pattern in unsigned base 10. Floats
    /// print the shortest decimal that reparses to the same bits, always as
    /// plain decimal (exponents are expanded per [`expand_exponent`]) with
    /// trailing zeros trimmed per [`trim_float_text`].
    pub fn unpack_ascii(&self, word: u64) -> String {
        match *self {
            ScalarType::Float => {
                trim_float_text(expand_exponent(&format!("{:?}", f32::from_bits(word as u32))))
            }
            ScalarType::Double => {
                trim_float_text(expand_exponent(&format!("{:?}", f64::from_bits(word))))
            }
            _ => (word & self.mask()).to_string(),
        }
    }

    /// Assembles a word from `size()` wire bytes in byte order `B`.
    ///
    /// Integers are widened into the `u64` accumulator; floats are arranged
    /// so the stored word is the native bit pattern whatever the source
    /// endianness.
    pub fn pack_bytes<B: ByteOrder>(&self, bytes: &[u8]) -> u64 {
        match *self {
            ScalarType::Char | ScalarType::UChar => u64::from(bytes[0]),
            ScalarType::Short | ScalarType::UShort => u64::from(B::read_u16(bytes)),
            ScalarType::Int | ScalarType::UInt => u64::from(B::read_u32(bytes)),
            ScalarType::Float => u64::from(B::read_f32(bytes).to_bits()),
            ScalarType::Double => B::read_f64(bytes).to_bits(),
        }
    }

    /// Appends the `size()` wire bytes of a word in byte order `B`.
    pub fn unpack_bytes<B: ByteOrder>(&self, word: u64, out: &mut Vec<u8>) {
        let mut buf = [0u8; 8];
        let n = self.size();
        match *self {
            ScalarType::Char | ScalarType::UChar => buf[0] = word as u8,
            ScalarType::Short | ScalarType::UShort => B::write_u16(&mut buf[..2], word as u16),
            ScalarType::Int | ScalarType::UInt => B::write_u32(&mut buf[..4], word as u32),
            ScalarType::Float => B::write_f32(&mut buf[..4], f32::from_bits(word as u32)),
            ScalarType::Double => B::write_f64(&mut buf[..8], f64::from_bits(word)),
        }
        out.extend_from_slice(&buf[..n]);
    }

    /// Reads one scalar of this type from a binary payload stream.
    pub fn read_word<R: Read, B: ByteOrder>(&self, reader: &mut R) -> PlyResult<u64> {
        let word = match *self {
            ScalarType::Char | ScalarType::UChar => u64::from(reader.read_u8()?),
            ScalarType::Short | ScalarType::UShort => u64::from(reader.read_u16::<B>()?),
            ScalarType::Int | ScalarType::UInt => u64::from(reader.read_u32::<B>()?),
            ScalarType::Float => u64::from(reader.read_f32::<B>()?.to_bits()),
            ScalarType::Double => reader.read_f64::<B>()?.to_bits(),
        };
        Ok(word)
    }

    /// Writes one scalar of this type to a binary payload stream.
    pub fn write_word<W: Write, B: ByteOrder>(&self, writer: &mut W, word: u64) -> PlyResult<()> {
        match *self {
            ScalarType::Char | ScalarType::UChar => writer.write_u8(word as u8)?,
            ScalarType::Short | ScalarType::UShort => writer.write_u16::<B>(word as u16)?,
            ScalarType::Int | ScalarType::UInt => writer.write_u32::<B>(word as u32)?,
            ScalarType::Float => writer.write_f32::<B>(f32::from_bits(word as u32))?,
            ScalarType::Double => writer.write_f64::<B>(f64::from_bits(word))?,
        }
        Ok(())
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ScalarType {
    type Err = PlyError;

    fn from_str(s: &str) -> PlyResult<Self> {
        ScalarType::parse(s)
    }
}

/// Reads a word as a list length, failing on float length types.
pub(crate) fn word_as_len(ty: ScalarType, word: u64) -> PlyResult<usize> {
    if !ty.is_integer() {
        return Err(PlyError::ParseError(format!(
            "list length must be an integer type, not {}",
            ty
        )));
    }
    Ok(word as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, LittleEndian};

    const ALL: [ScalarType; 8] = [
        ScalarType::Char,
        ScalarType::UChar,
        ScalarType::Short,
        ScalarType::UShort,
        ScalarType::Int,
        ScalarType::UInt,
        ScalarType::Float,
        ScalarType::Double,
    ];

    #[test]
    fn name_round_trip() {
        for ty in ALL {
            assert_eq!(ScalarType::parse(ty.name()).unwrap(), ty);
        }
        assert!(matches!(
            ScalarType::parse("int8"),
            Err(PlyError::UnknownType(_))
        ));
    }

    #[test]
    fn sizes() {
        let sizes: Vec<usize> = ALL.iter().map(|t| t.size()).collect();
        assert_eq!(sizes, vec![1, 1, 2, 2, 4, 4, 4, 8]);
    }

    #[test]
    fn ascii_identity_integers() {
        for (ty, token) in [
            (ScalarType::Char, "100"),
            (ScalarType::UChar, "255"),
            (ScalarType::Short, "32000"),
            (ScalarType::UShort, "65535"),
            (ScalarType::Int, "2000000000"),
            (ScalarType::UInt, "4294967295"),
        ] {
            let word = ty.pack_ascii(token).unwrap();
            assert_eq!(ty.unpack_ascii(word), token);
        }
    }

    #[test]
    fn ascii_identity_floats() {
        for token in ["1.5", "-0.25", "6.28125", "0.0"] {
            let word = ScalarType::Float.pack_ascii(token).unwrap();
            assert_eq!(ScalarType::Float.unpack_ascii(word), token);
            let word = ScalarType::Double.pack_ascii(token).unwrap();
            assert_eq!(ScalarType::Double.unpack_ascii(word), token);
        }
    }

    #[test]
    fn extreme_floats_print_plain_decimal() {
        for token in ["0.00000001", "250000000000000000000.0"] {
            let word = ScalarType::Float.pack_ascii(token).unwrap();
            let text = ScalarType::Float.unpack_ascii(word);
            assert!(!text.contains(['e', 'E']), "got '{}'", text);
            assert_eq!(ScalarType::Float.pack_ascii(&text).unwrap(), word);

            let word = ScalarType::Double.pack_ascii(token).unwrap();
            let text = ScalarType::Double.unpack_ascii(word);
            assert!(!text.contains(['e', 'E']), "got '{}'", text);
            assert_eq!(ScalarType::Double.pack_ascii(&text).unwrap(), word);
        }
    }

    #[test]
    fn float_word_is_bit_pattern() {
        let word = ScalarType::Float.pack_ascii("1.0").unwrap();
        assert_eq!(word, u64::from(1.0f32.to_bits()));
        let word = ScalarType::Double.pack_ascii("1.0").unwrap();
        assert_eq!(word, 1.0f64.to_bits());
    }

    #[test]
    fn negative_is_width_bit_pattern() {
        // no sign-extension into the upper word bits
        assert_eq!(ScalarType::Char.pack_ascii("-1").unwrap(), 0xFF);
        assert_eq!(ScalarType::Short.pack_ascii("-2").unwrap(), 0xFFFE);
        assert_eq!(ScalarType::Int.pack_ascii("-1").unwrap(), 0xFFFF_FFFF);
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(matches!(
            ScalarType::UChar.pack_ascii("256"),
            Err(PlyError::ValueOutOfRange(..))
        ));
        assert!(matches!(
            ScalarType::UChar.pack_ascii("-1"),
            Err(PlyError::ValueOutOfRange(..))
        ));
        assert!(matches!(
            ScalarType::Char.pack_ascii("-129"),
            Err(PlyError::ValueOutOfRange(..))
        ));
        assert!(matches!(
            ScalarType::UShort.pack_ascii("65536"),
            Err(PlyError::ValueOutOfRange(..))
        ));
    }

    #[test]
    fn malformed_token_rejected() {
        assert!(matches!(
            ScalarType::Int.pack_ascii("five"),
            Err(PlyError::ParseError(_))
        ));
        assert!(matches!(
            ScalarType::Float.pack_ascii("1.2.3"),
            Err(PlyError::ParseError(_))
        ));
    }

    #[test]
    fn bytes_identity_both_endians() {
        for ty in ALL {
            let word = match ty {
                ScalarType::Float => u64::from(3.25f32.to_bits()),
                ScalarType::Double => 3.25f64.to_bits(),
                _ => 0x17 & ty.mask(),
            };
            let mut be = Vec::new();
            ty.unpack_bytes::<BigEndian>(word, &mut be);
            assert_eq!(be.len(), ty.size());
            assert_eq!(ty.pack_bytes::<BigEndian>(&be), word);

            let mut le = Vec::new();
            ty.unpack_bytes::<LittleEndian>(word, &mut le);
            assert_eq!(le.len(), ty.size());
            assert_eq!(ty.pack_bytes::<LittleEndian>(&le), word);
        }
    }

    #[test]
    fn endianness_reverses_bytes() {
        let word = ScalarType::Int.pack_ascii("305419896").unwrap(); // 0x12345678
        let mut be = Vec::new();
        ScalarType::Int.unpack_bytes::<BigEndian>(word, &mut be);
        assert_eq!(be, vec![0x12, 0x34, 0x56, 0x78]);
        let mut le = Vec::new();
        ScalarType::Int.unpack_bytes::<LittleEndian>(word, &mut le);
        assert_eq!(le, vec![0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn float_bytes_same_word_from_either_endianness() {
        let word = u64::from(6.5f32.to_bits());
        let mut be = Vec::new();
        ScalarType::Float.unpack_bytes::<BigEndian>(word, &mut be);
        let mut le = Vec::new();
        ScalarType::Float.unpack_bytes::<LittleEndian>(word, &mut le);
        assert_eq!(ScalarType::Float.pack_bytes::<BigEndian>(&be), word);
        assert_eq!(ScalarType::Float.pack_bytes::<LittleEndian>(&le), word);
        let mut rev = le.clone();
        rev.reverse();
        assert_eq!(rev, be);
    }

    #[test]
    fn stream_identity() {
        let word = ScalarType::Double.pack_ascii("-12.125").unwrap();
        let mut buf = Vec::new();
        ScalarType::Double
            .write_word::<_, BigEndian>(&mut buf, word)
            .unwrap();
        let mut cursor = std::io::Cursor::new(buf);
        let back = ScalarType::Double
            .read_word::<_, BigEndian>(&mut cursor)
            .unwrap();
        assert_eq!(back, word);
    }
}
