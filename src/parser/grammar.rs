//! PEG grammar for PLY header lines.
//!
//! The grammar classifies one header line at a time. Type and format names
//! are captured as raw identifiers rather than matched against the allowed
//! sets, so the parser can distinguish an unknown type or format from a line
//! that is structurally malformed.

/// A single parsed header line.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Line {
    /// The `ply` magic number line.
    MagicNumber,
    /// A `format <name> <version>` line.
    Format {
        /// Raw format name, validated by the parser.
        name: String,
        /// Version text, e.g. `1.0`.
        version: String,
    },
    /// A `comment ...` line.
    Comment(String),
    /// An `element <name> <count>` line.
    Element {
        /// Element name.
        name: String,
        /// Declared row count.
        count: usize,
    },
    /// A `property <type> <name>` line.
    Property {
        /// Raw scalar type name, validated by the parser.
        type_name: String,
        /// Property name.
        name: String,
    },
    /// A `property list <count_type> <item_type> <name>` line.
    PropertyList {
        /// Raw length type name.
        count_type: String,
        /// Raw member type name.
        item_type: String,
        /// Property name.
        name: String,
    },
    /// The `end_header` terminator line.
    EndHeader,
}

peg::parser! {pub grammar grammar() for str {

rule space() = [' '|'\t']+

rule ident() -> &'input str
    = s:$(['a'..='z'|'A'..='Z'|'_']['a'..='z'|'A'..='Z'|'0'..='9'|'_'|'-']*) { s }

rule text() -> &'input str
    = s:$((!['\n'|'\r'][_])+) { s }

rule count() -> Option<usize>
    = n:$(['0'..='9']+) { n.parse::<usize>().ok() }

rule version() -> &'input str
    = v:$(['0'..='9']+ "." ['0'..='9']+) { v }

pub rule magic_number()
    = "ply"

pub rule format() -> (String, String)
    = "format" space() f:ident() space() v:version() {
        (f.to_string(), v.to_string())
    }

pub rule comment() -> String
    = "comment" space() c:text() { c.to_string() }
    / "comment" space()? { String::new() }

pub rule element() -> Option<(String, usize)>
    = "element" space() id:ident() space() n:count() {
        n.map(|n| (id.to_string(), n))
    }

pub rule property() -> Line
    = "property" space() "list" space() ct:ident() space() it:ident() space() id:ident() {
        Line::PropertyList {
            count_type: ct.to_string(),
            item_type: it.to_string(),
            name: id.to_string(),
        }
    }
    / "property" space() t:ident() space() id:ident() {
        Line::Property {
            type_name: t.to_string(),
            name: id.to_string(),
        }
    }

pub rule end_header()
    = "end_header"

rule trimmed_line() -> Line
    = magic_number() { Line::MagicNumber }
    / end_header() { Line::EndHeader }
    / v:format() { Line::Format { name: v.0, version: v.1 } }
    / v:comment() { Line::Comment(v) }
    / v:element() {? v.map(|(name, count)| Line::Element { name, count }).ok_or("element count") }
    / v:property() { v }

pub rule line() -> Line
    = l:trimmed_line() space()? line_break()? { l }

rule line_break()
    = "\r\n" / ['\n'|'\r']

}}
