//! Byte-level lexing over an immutable input buffer.
//!
//! A [`Scanner`] is created once per input, mutated by every parse primitive,
//! and discarded after use. All lexing is strict JSON: the whitespace set is
//! exactly space, tab, CR and LF, numbers follow the RFC 8259 grammar, and
//! strings reject raw control bytes.

use crate::error::ParseError;

/// Nesting levels permitted before the reader gives up, unless overridden.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Construction options for a [`Scanner`].
///
/// Every option is a typed field, so an unrecognized option cannot be
/// expressed at all.
#[derive(Debug, Clone, Copy)]
pub struct ScannerOptions {
    /// Skip a UTF-8 byte order mark (`EF BB BF`) at the start of input.
    ///
    /// Default: `true`.
    pub skip_bom: bool,
    /// Skip whitespace at the start of input.
    ///
    /// Default: `true`.
    pub skip_leading_whitespace: bool,
    /// Maximum container nesting depth accepted by the value reader.
    ///
    /// Deeper input fails with [`ParseError::RecursionLimitExceeded`] instead
    /// of exhausting the call stack. Default: [`DEFAULT_MAX_DEPTH`].
    pub max_depth: usize,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            skip_bom: true,
            skip_leading_whitespace: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A cursor over a borrowed byte buffer with strict JSON lexing primitives.
///
/// One scanner serves exactly one decode operation; it is not reusable across
/// unrelated inputs.
#[derive(Debug)]
pub struct Scanner<'a> {
    data: &'a [u8],
    cur: usize,
    options: ScannerOptions,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner with default options, skipping a leading BOM and
    /// leading whitespace.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, ScannerOptions::default())
    }

    /// Creates a scanner with explicit options.
    #[must_use]
    pub fn with_options(data: &'a [u8], options: ScannerOptions) -> Self {
        let mut s = Self {
            data,
            cur: 0,
            options,
        };
        if s.options.skip_bom {
            s.skip_bom();
        }
        if s.options.skip_leading_whitespace {
            s.skip_whitespace();
        }
        s
    }

    /// Returns `true` once the cursor has passed the last input byte.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.cur >= self.data.len()
    }

    /// Requires that nothing but whitespace remains after the value that was
    /// read, enforcing "exactly one JSON value per input".
    ///
    /// # Errors
    ///
    /// [`ParseError::UnexpectedToken`] if a non-whitespace byte remains.
    pub fn finalize(&mut self) -> Result<(), ParseError> {
        self.skip_whitespace();
        if !self.is_eof() {
            return Err(ParseError::UnexpectedToken);
        }
        Ok(())
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.options.max_depth
    }

    /// Consumes the UTF-8 BOM if present at the cursor.
    pub(crate) fn skip_bom(&mut self) -> bool {
        if self.data.len() >= self.cur + 3 && self.data[self.cur..self.cur + 3] == [0xEF, 0xBB, 0xBF]
        {
            self.cur += 3;
            return true;
        }
        false
    }

    /// Reads the byte at the cursor, or the 0 sentinel past end of input.
    pub(crate) fn peek(&self) -> u8 {
        if self.cur >= self.data.len() {
            return 0;
        }
        self.data[self.cur]
    }

    /// Consumes and returns one byte, or the 0 sentinel past end of input.
    pub(crate) fn advance(&mut self) -> u8 {
        if self.cur >= self.data.len() {
            return 0;
        }
        let c = self.data[self.cur];
        self.cur += 1;
        c
    }

    pub(crate) fn skip_byte(&mut self, b: u8) -> bool {
        if self.cur < self.data.len() && self.data[self.cur] == b {
            self.cur += 1;
            return true;
        }
        false
    }

    /// Consumes an exact byte sequence, or nothing at all on mismatch.
    pub(crate) fn skip_sequence(&mut self, seq: &[u8]) -> bool {
        if self.cur + seq.len() > self.data.len() {
            return false;
        }
        if &self.data[self.cur..self.cur + seq.len()] != seq {
            return false;
        }
        self.cur += seq.len();
        true
    }

    /// Skips the strict JSON whitespace set: space, tab, CR, LF. No other
    /// Unicode whitespace is recognized.
    pub(crate) fn skip_whitespace(&mut self) {
        while self.cur < self.data.len() {
            match self.data[self.cur] {
                b' ' | b'\t' | b'\n' | b'\r' => self.cur += 1,
                _ => return,
            }
        }
    }

    fn is_digit(&self) -> bool {
        self.cur < self.data.len() && self.data[self.cur].is_ascii_digit()
    }

    fn skip_digits(&mut self) -> bool {
        let start = self.cur;
        while self.is_digit() {
            self.cur += 1;
        }
        self.cur > start
    }

    /// Parses a string literal starting at the cursor.
    ///
    /// Two-phase strategy: an optimistic scan copies the literal verbatim
    /// when it contains no escape and no raw control byte. Otherwise parsing
    /// restarts from the opening quote in an escape-aware pass.
    pub(crate) fn parse_string(&mut self) -> Result<String, ParseError> {
        if self.peek() != b'"' {
            return Err(ParseError::UnexpectedToken);
        }
        self.cur += 1;

        let start = self.cur;
        let mut escaped = false;

        // Fast path for strings without escapes.
        while self.cur < self.data.len() {
            let c = self.data[self.cur];
            if c <= 0x1F {
                return Err(ParseError::InvalidString);
            }
            if c == b'\\' {
                escaped = true;
                break;
            }
            if c == b'"' {
                let raw = &self.data[start..self.cur];
                self.cur += 1;
                return std::str::from_utf8(raw)
                    .map(str::to_owned)
                    .map_err(|_| ParseError::InvalidString);
            }
            self.cur += 1;
        }

        // Reached end of input without a closing quote.
        if !escaped {
            return Err(ParseError::InvalidString);
        }

        // Slow path: reparse from the opening quote, decoding escapes.
        self.cur = start;
        let mut buf = Vec::new();
        loop {
            if self.is_eof() {
                return Err(ParseError::InvalidString);
            }
            let c = self.advance();
            if c <= 0x1F {
                return Err(ParseError::InvalidString);
            }
            if c == b'"' {
                break;
            }
            if c == b'\\' {
                match self.peek() {
                    e @ (b'"' | b'\\' | b'/') => {
                        self.cur += 1;
                        buf.push(e);
                    }
                    b'b' => {
                        self.cur += 1;
                        buf.push(0x08);
                    }
                    b'f' => {
                        self.cur += 1;
                        buf.push(0x0C);
                    }
                    b'n' => {
                        self.cur += 1;
                        buf.push(b'\n');
                    }
                    b'r' => {
                        self.cur += 1;
                        buf.push(b'\r');
                    }
                    b't' => {
                        self.cur += 1;
                        buf.push(b'\t');
                    }
                    b'u' => {
                        self.cur += 1;
                        let ch = self.parse_escaped_scalar()?;
                        let mut utf8 = [0u8; 4];
                        buf.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
                    }
                    _ => return Err(ParseError::InvalidString),
                }
            } else {
                buf.push(c);
            }
        }
        String::from_utf8(buf).map_err(|_| ParseError::InvalidString)
    }

    /// Reads the four hex digits of a `\u` escape as one UTF-16 code unit.
    fn parse_code_unit(&mut self) -> Result<u16, ParseError> {
        if self.data.len() < self.cur + 4 {
            return Err(ParseError::InvalidUnicodeEscape);
        }
        let mut unit: u16 = 0;
        for i in 0..4 {
            let digit = match self.data[self.cur + i] {
                b @ b'0'..=b'9' => b - b'0',
                b @ b'a'..=b'f' => b - b'a' + 10,
                b @ b'A'..=b'F' => b - b'A' + 10,
                _ => return Err(ParseError::InvalidUnicodeEscape),
            };
            unit = (unit << 4) | u16::from(digit);
        }
        self.cur += 4;
        Ok(unit)
    }

    /// Decodes one `\u` escape, combining a high/low surrogate pair into a
    /// single scalar when both halves are present back to back.
    ///
    /// A lone surrogate half is accepted rather than rejected; since Rust
    /// strings cannot carry unpaired surrogates it decodes to U+FFFD.
    fn parse_escaped_scalar(&mut self) -> Result<char, ParseError> {
        let unit = self.parse_code_unit()?;
        match unit {
            0xD800..=0xDBFF => {
                if self.peek() == b'\\' && self.data.get(self.cur + 1) == Some(&b'u') {
                    let mark = self.cur;
                    self.cur += 2;
                    let low = self.parse_code_unit()?;
                    if (0xDC00..=0xDFFF).contains(&low) {
                        let scalar = 0x10000
                            + ((u32::from(unit) - 0xD800) << 10)
                            + (u32::from(low) - 0xDC00);
                        return char::from_u32(scalar).ok_or(ParseError::InvalidUnicodeEscape);
                    }
                    // Not a low half; let it parse as its own escape.
                    self.cur = mark;
                }
                Ok(char::REPLACEMENT_CHARACTER)
            }
            0xDC00..=0xDFFF => Ok(char::REPLACEMENT_CHARACTER),
            _ => char::from_u32(u32::from(unit)).ok_or(ParseError::InvalidUnicodeEscape),
        }
    }

    /// Parses a number literal, validating the strict JSON grammar before
    /// converting to `f64`.
    ///
    /// A literal that is grammatically valid but overflows `f64` yields
    /// [`ParseError::NumericValueOutOfRange`]; underflow to zero is accepted
    /// silently.
    pub(crate) fn parse_number(&mut self) -> Result<f64, ParseError> {
        let start = self.cur;

        self.skip_byte(b'-');

        // Integer part: a lone 0, or a nonzero digit followed by digits.
        if self.skip_byte(b'0') {
            if self.is_digit() {
                return Err(ParseError::InvalidNumber);
            }
        } else {
            if self.cur >= self.data.len() || !(b'1'..=b'9').contains(&self.data[self.cur]) {
                return Err(ParseError::InvalidNumber);
            }
            self.cur += 1;
            self.skip_digits();
        }

        // Fractional part.
        if self.skip_byte(b'.') {
            if !self.skip_digits() {
                return Err(ParseError::InvalidNumber);
            }
            // A second dot after a valid decimal part is an error.
            if self.skip_byte(b'.') {
                return Err(ParseError::InvalidNumber);
            }
        }

        // Exponent part.
        if self.skip_byte(b'e') || self.skip_byte(b'E') {
            if !self.skip_byte(b'+') {
                self.skip_byte(b'-');
            }
            if !self.skip_digits() {
                return Err(ParseError::InvalidNumber);
            }
            // A second exponent marker after a valid one is an error.
            if self.skip_byte(b'e') || self.skip_byte(b'E') {
                return Err(ParseError::InvalidNumber);
            }
        }

        let literal = std::str::from_utf8(&self.data[start..self.cur])
            .map_err(|_| ParseError::InvalidNumber)?;
        let value: f64 = literal.parse().map_err(|_| ParseError::InvalidNumber)?;
        if value.is_infinite() {
            return Err(ParseError::NumericValueOutOfRange);
        }
        Ok(value)
    }
}
