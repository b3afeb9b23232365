//! Small helpers shared by the header parser, the ASCII payload codec and
//! the grid reader.

/// Splits a line into non-empty whitespace-separated tokens.
///
/// All whitespace separates, including the `\n` (and any `\r`) still present
/// on lines coming straight from `read_line`, so callers never see a token
/// carrying its line ending.
pub fn split_line(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Rewrites float text in exponential notation as plain decimal.
///
/// The shortest-round-trip formatter switches to `1e-8`-style notation for
/// large and small magnitudes, but PLY ASCII payloads carry plain decimals.
/// The digits are kept verbatim and only the radix point moves, so the
/// result reparses to exactly the same bits. Text without an exponent is
/// returned unchanged.
pub fn expand_exponent(text: &str) -> String {
    let Some(e_pos) = text.find(['e', 'E']) else {
        return text.to_string();
    };
    let Ok(exp) = text[e_pos + 1..].parse::<i64>() else {
        return text.to_string();
    };
    let mantissa = &text[..e_pos];
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let (int_digits, frac_digits) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    let digits: String = format!("{}{}", int_digits, frac_digits);
    let point = int_digits.len() as i64 + exp;

    let mut out = String::from(sign);
    if point <= 0 {
        out.push_str("0.");
        for _ in 0..-point {
            out.push('0');
        }
        out.push_str(&digits);
    } else if point >= digits.len() as i64 {
        out.push_str(&digits);
        for _ in 0..point - digits.len() as i64 {
            out.push('0');
        }
        out.push_str(".0");
    } else {
        out.push_str(&digits[..point as usize]);
        out.push('.');
        out.push_str(&digits[point as usize..]);
    }
    out
}

/// Trims trailing zeros from decimal float text.
///
/// If removing the zeros would leave the text ending in the radix point, one
/// zero is kept (`"3.000"` becomes `"3.0"`, not `"3."`). Text without a
/// radix point is returned untouched.
pub fn trim_float_text(mut text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.push('0');
    }
    text
}

/// Tracks the current line number while parsing.
///
/// This is primarily used to add line-context to I/O and parse errors.
#[derive(Debug, Clone, Copy)]
pub struct LocationTracker {
    /// Current 1-based line index in the input stream.
    pub line_index: usize,
}

impl LocationTracker {
    /// Creates a new tracker at the start of a stream.
    pub fn new() -> Self {
        LocationTracker { line_index: 0 }
    }

    /// Advances the tracker to the next line.
    pub fn next_line(&mut self) {
        self.line_index += 1;
    }
}

impl Default for LocationTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_empty_tokens() {
        assert_eq!(split_line("1 2  3"), vec!["1", "2", "3"]);
        assert_eq!(split_line("  a\tb "), vec!["a", "b"]);
        assert_eq!(split_line(""), Vec::<&str>::new());
    }

    #[test]
    fn split_strips_line_endings() {
        // raw read_line output keeps its newline
        assert_eq!(split_line("0 0 0\n"), vec!["0", "0", "0"]);
        assert_eq!(split_line("1 2\r\n"), vec!["1", "2"]);
        assert_eq!(split_line("1 \r"), vec!["1"]);
        assert_eq!(split_line("\n"), Vec::<&str>::new());
    }

    #[test]
    fn expand_leaves_plain_decimals_alone() {
        assert_eq!(expand_exponent("1.5"), "1.5");
        assert_eq!(expand_exponent("-0.25"), "-0.25");
        assert_eq!(expand_exponent("120"), "120");
    }

    #[test]
    fn expand_negative_exponents() {
        assert_eq!(expand_exponent("1e-8"), "0.00000001");
        assert_eq!(expand_exponent("-2.5e-3"), "-0.0025");
        assert_eq!(expand_exponent("1.25e-1"), "0.125");
    }

    #[test]
    fn expand_positive_exponents() {
        assert_eq!(expand_exponent("1.25e2"), "125.0");
        assert_eq!(expand_exponent("1.5e21"), "1500000000000000000000.0");
        assert_eq!(expand_exponent("-4e3"), "-4000.0");
    }

    #[test]
    fn expand_point_inside_digits() {
        assert_eq!(expand_exponent("1.2345e2"), "123.45");
    }

    #[test]
    fn trim_removes_trailing_zeros() {
        assert_eq!(trim_float_text("1.2500".to_string()), "1.25");
        assert_eq!(trim_float_text("0.5".to_string()), "0.5");
    }

    #[test]
    fn trim_keeps_one_zero_after_point() {
        assert_eq!(trim_float_text("3.000000".to_string()), "3.0");
        assert_eq!(trim_float_text("-2.0".to_string()), "-2.0");
    }

    #[test]
    fn trim_leaves_integers_alone() {
        assert_eq!(trim_float_text("120".to_string()), "120");
    }
}
