//! Token readers on top of [`LineCursor`].
//!
//! Numeric values are parsed without locale dependence. Length-like values
//! are multiplied by the scene's linear scale when `is_scale` is requested.

use std::io::BufRead;

use vrml_math::{DVec2, DVec3, Rotation, CONFUSION};

use super::cursor::LineCursor;
use crate::error::{VrmlError, VrmlResult};
use crate::node::IndexBlock;

/// Smallest value accepted where only positive numbers are allowed.
const POSITIVE_TOLERANCE: f64 = 0.001 * CONFUSION;

/// Reads VRML tokens and values.
pub struct VrmlReader<R> {
    cursor: LineCursor<R>,
    linear_scale: f64,
}

impl<R: BufRead> VrmlReader<R> {
    pub fn new(input: R, linear_scale: f64) -> Self {
        Self {
            cursor: LineCursor::new(input),
            linear_scale,
        }
    }

    pub fn linear_scale(&self) -> f64 {
        self.linear_scale
    }

    pub fn line_count(&self) -> usize {
        self.cursor.line_count()
    }

    pub fn cursor(&mut self) -> &mut LineCursor<R> {
        &mut self.cursor
    }

    pub fn next_significant(&mut self) -> VrmlResult<()> {
        self.cursor.next_significant()
    }

    /// Move to the next significant character and consume it if it is `c`.
    pub fn accept(&mut self, c: u8) -> VrmlResult<bool> {
        self.cursor.next_significant()?;
        Ok(self.cursor.consume_if(c))
    }

    /// Require `c` as the next significant character.
    pub fn expect(&mut self, c: u8) -> VrmlResult<()> {
        if self.accept(c)? {
            Ok(())
        } else {
            Err(VrmlError::format(format!("expected '{}'", c as char)))
        }
    }

    /// Read characters up to the next delimiter.
    pub fn read_word(&mut self) -> VrmlResult<String> {
        self.cursor.next_significant()?;
        let rest = self.cursor.rest();
        let len = rest
            .iter()
            .position(|&c| is_delimiter(c))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(VrmlError::StringInput);
        }
        let word = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.cursor.advance(len);
        Ok(word)
    }

    /// Read one floating-point value.
    pub fn read_scalar(&mut self, is_scale: bool, only_positive: bool) -> VrmlResult<f64> {
        let value = self.read_raw_scalar(only_positive)?;
        Ok(if is_scale {
            value * self.linear_scale
        } else {
            value
        })
    }

    fn read_raw_scalar(&mut self, only_positive: bool) -> VrmlResult<f64> {
        self.cursor.next_significant()?;
        let rest = self.cursor.rest();
        let len = scan_real(rest);
        if len == 0 {
            return Err(VrmlError::NumericInput(token_preview(rest)));
        }
        let text = std::str::from_utf8(&rest[..len])
            .map_err(|_| VrmlError::NumericInput(token_preview(rest)))?;
        let value: f64 = text
            .parse()
            .map_err(|_| VrmlError::NumericInput(text.to_string()))?;
        if only_positive && value < POSITIVE_TOLERANCE {
            return Err(VrmlError::IrrelevantNumber(value));
        }
        self.cursor.advance(len);
        Ok(value)
    }

    /// Read two values; scaling applies to both once both are valid.
    pub fn read_vec2(&mut self, is_scale: bool, only_positive: bool) -> VrmlResult<DVec2> {
        let x = self.read_raw_scalar(only_positive)?;
        let y = self.read_raw_scalar(only_positive)?;
        let v = DVec2::new(x, y);
        Ok(if is_scale { v * self.linear_scale } else { v })
    }

    /// Read three values; scaling applies to all once all are valid.
    pub fn read_vec3(&mut self, is_scale: bool, only_positive: bool) -> VrmlResult<DVec3> {
        let x = self.read_raw_scalar(only_positive)?;
        let y = self.read_raw_scalar(only_positive)?;
        let z = self.read_raw_scalar(only_positive)?;
        let v = DVec3::new(x, y, z);
        Ok(if is_scale { v * self.linear_scale } else { v })
    }

    /// Read an SFRotation (`x y z angle`).
    pub fn read_rotation(&mut self) -> VrmlResult<Rotation> {
        let axis = self.read_vec3(false, false)?;
        let angle = self.read_raw_scalar(false)?;
        Ok(Rotation::new(axis, angle))
    }

    /// Read a signed integer.
    pub fn read_integer(&mut self) -> VrmlResult<i64> {
        self.cursor.next_significant()?;
        let rest = self.cursor.rest();
        let sign = usize::from(matches!(rest.first(), Some(b'+' | b'-')));
        let digits = rest[sign..].iter().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Err(VrmlError::NumericInput(token_preview(rest)));
        }
        let text = String::from_utf8_lossy(&rest[..sign + digits]).into_owned();
        let value = text
            .parse::<i64>()
            .map_err(|_| VrmlError::NumericInput(text.clone()))?;
        self.cursor.advance(sign + digits);
        Ok(value)
    }

    /// Read an SFBool (`TRUE` or `FALSE`).
    pub fn read_bool(&mut self) -> VrmlResult<bool> {
        match self.read_word()?.as_str() {
            "TRUE" => Ok(true),
            "FALSE" => Ok(false),
            other => Err(VrmlError::format(format!("expected TRUE or FALSE, got {other:?}"))),
        }
    }

    /// Read a double-quoted string, resolving backslash escapes.
    pub fn read_string(&mut self) -> VrmlResult<String> {
        self.cursor.next_significant()?;
        if !self.cursor.consume_if(b'"') {
            return Err(VrmlError::format("expected '\"' opening a string"));
        }
        let bytes = self.read_quoted_tail()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read up to and past the closing quote. A string may span lines; its
    /// line breaks are kept as `\n` and `#` inside it is not a comment.
    fn read_quoted_tail(&mut self) -> VrmlResult<Vec<u8>> {
        let mut bytes = Vec::new();
        loop {
            match self.cursor.bump() {
                Some(b'"') => return Ok(bytes),
                Some(b'\\') => match self.cursor.bump() {
                    Some(c) => bytes.push(c),
                    None => return Err(VrmlError::format("unterminated string")),
                },
                Some(b'\r') if self.cursor.peek() == Some(b'\n') => {}
                Some(c) => bytes.push(c),
                None => match self.cursor.read_raw_line() {
                    Err(VrmlError::EndOfFile) => {
                        return Err(VrmlError::format("unterminated string"))
                    }
                    other => other?,
                },
            }
        }
    }

    /// Read an MFString: a single string or a bracketed list of strings.
    pub fn read_string_list(&mut self) -> VrmlResult<Vec<String>> {
        if !self.accept(b'[')? {
            return Ok(vec![self.read_string()?]);
        }
        let mut strings = Vec::new();
        while !self.accept(b']')? {
            strings.push(self.read_string()?);
        }
        Ok(strings)
    }

    /// Read an MFVec3f / MFColor value.
    pub fn read_vec3_array(&mut self, is_scale: bool) -> VrmlResult<Vec<DVec3>> {
        if !self.accept(b'[')? {
            return Ok(vec![self.read_vec3(is_scale, false)?]);
        }
        let mut values = Vec::new();
        while !self.accept(b']')? {
            values.push(self.read_vec3(is_scale, false)?);
        }
        Ok(values)
    }

    /// Read an MFVec2f value.
    pub fn read_vec2_array(&mut self, is_scale: bool) -> VrmlResult<Vec<DVec2>> {
        if !self.accept(b'[')? {
            return Ok(vec![self.read_vec2(is_scale, false)?]);
        }
        let mut values = Vec::new();
        while !self.accept(b']')? {
            values.push(self.read_vec2(is_scale, false)?);
        }
        Ok(values)
    }

    /// Read a bracketed list of index multiplets separated by negative values.
    ///
    /// `[0,1,2,-1,3,4,5,-1]` yields the blocks `[0,1,2]` and `[3,4,5]`; the
    /// terminator of the last block is optional.
    pub fn read_index_blocks(&mut self) -> VrmlResult<Vec<IndexBlock>> {
        if !self.accept(b'[')? {
            return Err(VrmlError::format("expected '[' opening an index list"));
        }
        let mut blocks = Vec::new();
        let mut pending: Vec<u32> = Vec::new();
        loop {
            // closing bracket right after a terminator or a comma
            if self.accept(b']')? {
                flush_block(&mut blocks, &mut pending)?;
                break;
            }
            let value = self.read_integer()?;
            let closing = self.accept(b']')?;
            if value >= 0 {
                let index = u32::try_from(value)
                    .map_err(|_| VrmlError::NumericInput(value.to_string()))?;
                pending.push(index);
            }
            if value < 0 || closing {
                flush_block(&mut blocks, &mut pending)?;
            }
            if closing {
                break;
            }
        }
        Ok(blocks)
    }

    /// Skip a bracketed construct whose opening bracket was already consumed.
    ///
    /// Depth starts at zero, every `open` increments it and every `close`
    /// decrements it; scanning stops once the depth goes negative.
    pub fn skip_bracketed(&mut self, open: u8, close: u8) -> VrmlResult<()> {
        let mut depth = 0i32;
        while depth >= 0 {
            self.cursor.next_significant()?;
            while let Some(c) = self.cursor.bump() {
                if c == b'"' {
                    self.read_quoted_tail()?;
                    break;
                } else if c == open {
                    depth += 1;
                    break;
                } else if c == close {
                    depth -= 1;
                    break;
                }
            }
        }
        Ok(())
    }
}

fn flush_block(blocks: &mut Vec<IndexBlock>, pending: &mut Vec<u32>) -> VrmlResult<()> {
    if pending.is_empty() {
        return Ok(());
    }
    blocks
        .try_reserve(1)
        .map_err(|_| VrmlError::Allocation("index block list".to_string()))?;
    blocks.push(IndexBlock::try_from_slice(pending)?);
    pending.clear();
    Ok(())
}

fn is_delimiter(c: u8) -> bool {
    matches!(
        c,
        b' ' | b'\t' | b'\r' | b'\n' | b'{' | b'}' | b',' | b'[' | b']'
    )
}

/// Length of the longest prefix of `s` in floating-point lexical form, or 0.
fn scan_real(s: &[u8]) -> usize {
    let digits_from = |i: usize| s[i..].iter().take_while(|c| c.is_ascii_digit()).count();

    let mut i = usize::from(matches!(s.first(), Some(b'+' | b'-')));
    let int_digits = digits_from(i);
    i += int_digits;
    let mut frac_digits = 0;
    if s.get(i) == Some(&b'.') {
        frac_digits = digits_from(i + 1);
        if int_digits + frac_digits > 0 {
            i += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return 0;
    }
    if let Some(b'e' | b'E') = s.get(i) {
        let mut j = i + 1;
        if let Some(b'+' | b'-') = s.get(j) {
            j += 1;
        }
        let exp_digits = digits_from(j);
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }
    i
}

fn token_preview(rest: &[u8]) -> String {
    let len = rest
        .iter()
        .position(|&c| is_delimiter(c))
        .unwrap_or(rest.len())
        .min(32);
    String::from_utf8_lossy(&rest[..len]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorStatus;

    fn reader(text: &str) -> VrmlReader<&[u8]> {
        VrmlReader::new(text.as_bytes(), 1.0)
    }

    #[test]
    fn test_read_word_stops_at_delimiters() {
        let mut r = reader("  Transform{ children[");
        assert_eq!(r.read_word().unwrap(), "Transform");
        assert!(r.accept(b'{').unwrap());
        assert_eq!(r.read_word().unwrap(), "children");
        assert!(matches!(r.read_word(), Err(VrmlError::StringInput)));
    }

    #[test]
    fn test_read_scalar_forms() {
        let mut r = reader("1 -2.5 .5 3. 1e3 -4.0E-2 7e");
        assert_eq!(r.read_scalar(false, false).unwrap(), 1.0);
        assert_eq!(r.read_scalar(false, false).unwrap(), -2.5);
        assert_eq!(r.read_scalar(false, false).unwrap(), 0.5);
        assert_eq!(r.read_scalar(false, false).unwrap(), 3.0);
        assert_eq!(r.read_scalar(false, false).unwrap(), 1000.0);
        assert!((r.read_scalar(false, false).unwrap() + 0.04).abs() < 1e-12);
        // exponent marker without digits is not part of the number
        assert_eq!(r.read_scalar(false, false).unwrap(), 7.0);
    }

    #[test]
    fn test_read_scalar_rejects_non_numbers() {
        let mut r = reader("abc");
        let err = r.read_scalar(false, false).unwrap_err();
        assert_eq!(err.status(), ErrorStatus::NumericInputError);

        let mut r = reader("-.");
        assert_eq!(
            r.read_scalar(false, false).unwrap_err().status(),
            ErrorStatus::NumericInputError
        );
    }

    #[test]
    fn test_scale_application() {
        let mut r = VrmlReader::new("5 5".as_bytes(), 2.0);
        assert_eq!(r.read_scalar(true, false).unwrap(), 10.0);
        assert_eq!(r.read_scalar(false, false).unwrap(), 5.0);
    }

    #[test]
    fn test_only_positive() {
        let mut r = reader("0 -1 0.25");
        assert_eq!(
            r.read_scalar(false, true).unwrap_err().status(),
            ErrorStatus::IrrelevantNumber
        );
    }

    #[test]
    fn test_read_vec3_scales_all_components() {
        let mut r = VrmlReader::new("1 2 3".as_bytes(), 0.5);
        assert_eq!(r.read_vec3(true, false).unwrap(), DVec3::new(0.5, 1.0, 1.5));

        let mut r = reader("1 0 3");
        assert_eq!(
            r.read_vec3(false, true).unwrap_err().status(),
            ErrorStatus::IrrelevantNumber
        );
    }

    #[test]
    fn test_read_vec2_across_lines() {
        let mut r = reader("0.25\n  # comment\n 0.75");
        assert_eq!(r.read_vec2(false, false).unwrap(), DVec2::new(0.25, 0.75));
    }

    #[test]
    fn test_index_blocks_with_terminators() {
        let mut r = reader("[0,1,2,-1,3,4,5,-1]");
        let blocks = r.read_index_blocks().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].as_slice(), &[0, 1, 2]);
        assert_eq!(blocks[1].as_slice(), &[3, 4, 5]);
        assert_eq!(blocks[0].len(), 3);
        assert_eq!(blocks[1].len(), 3);
    }

    #[test]
    fn test_index_blocks_without_final_terminator() {
        let mut r = reader("[ 0 1 2 3, -1,\n 4, 5, 6 ]");
        let blocks = r.read_index_blocks().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].as_slice(), &[0, 1, 2, 3]);
        assert_eq!(blocks[1].as_slice(), &[4, 5, 6]);
    }

    #[test]
    fn test_index_blocks_empty_and_missing_bracket() {
        let mut r = reader("[ ]");
        assert!(r.read_index_blocks().unwrap().is_empty());

        let mut r = reader("0 1 2");
        assert_eq!(
            r.read_index_blocks().unwrap_err().status(),
            ErrorStatus::VrmlFormatError
        );

        let mut r = reader("[ 0 1 x ]");
        assert_eq!(
            r.read_index_blocks().unwrap_err().status(),
            ErrorStatus::NumericInputError
        );
    }

    #[test]
    fn test_read_strings() {
        let mut r = reader(r#""plain" "with \"quotes\"" [ "a", "b#c" ]"#);
        assert_eq!(r.read_string().unwrap(), "plain");
        assert_eq!(r.read_string().unwrap(), "with \"quotes\"");
        assert_eq!(r.read_string_list().unwrap(), vec!["a", "b#c"]);
    }

    #[test]
    fn test_string_spanning_lines() {
        let mut r = reader("[ \"a multi\nline # string\" \"crlf\r\nend\" ] # note\nBox");
        assert_eq!(
            r.read_string_list().unwrap(),
            vec!["a multi\nline # string", "crlf\nend"]
        );
        assert_eq!(r.read_word().unwrap(), "Box");
        assert_eq!(r.line_count(), 4);

        let mut open = reader("\"never\nclosed");
        assert_eq!(open.read_string().unwrap_err().status(), ErrorStatus::VrmlFormatError);
    }

    #[test]
    fn test_read_bool() {
        let mut r = reader("TRUE FALSE yes");
        assert!(r.read_bool().unwrap());
        assert!(!r.read_bool().unwrap());
        assert!(r.read_bool().is_err());
    }

    #[test]
    fn test_read_vec3_array() {
        let mut r = reader("[ 0 0 0, 1 0 0,\n 1 1 0 ] 4 5 6");
        let points = r.read_vec3_array(false).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2], DVec3::new(1.0, 1.0, 0.0));
        assert_eq!(r.read_vec3_array(false).unwrap(), vec![DVec3::new(4.0, 5.0, 6.0)]);
    }

    #[test]
    fn test_skip_bracketed_nesting() {
        let mut r = reader("field MFNode x [ Group { } ]\n  exposedField SFVec3f y 0 0 0 ] Box");
        r.skip_bracketed(b'[', b']').unwrap();
        assert_eq!(r.read_word().unwrap(), "Box");
    }

    #[test]
    fn test_skip_bracketed_ignores_quoted_brackets() {
        let mut r = reader("description \"}\" url [ \"a{b\",\n \"c\n}\" ] } Sphere");
        r.skip_bracketed(b'{', b'}').unwrap();
        assert_eq!(r.read_word().unwrap(), "Sphere");
    }
}
