//! Low-level JSON text emission with an error latch.
//!
//! The [`Decorator`] owns all character-level concerns: string escaping,
//! float formatting, and structural punctuation. Emission methods return
//! nothing; the first failure latches, every later call becomes a no-op, and
//! the latched error surfaces from [`Decorator::into_result`]. Partial output
//! written before the failure must be discarded by the caller.

use core::fmt;

use crate::error::EncodeError;
use crate::marshal::Marshal;

/// An incremental JSON writer over any [`fmt::Write`] sink.
///
/// Values are appended through [`value`], [`array`] and [`object`]; the
/// single accumulated error is collected at the end with [`into_result`].
///
/// [`value`]: Decorator::value
/// [`array`]: Decorator::array
/// [`object`]: Decorator::object
/// [`into_result`]: Decorator::into_result
pub struct Decorator<'w> {
    out: &'w mut dyn fmt::Write,
    float_precision: usize,
    err: Option<EncodeError>,
}

impl<'w> Decorator<'w> {
    pub(crate) fn new(out: &'w mut dyn fmt::Write, float_precision: usize) -> Self {
        Self {
            out,
            float_precision,
            err: None,
        }
    }

    /// Consumes the decorator, yielding the latched error if any emission
    /// failed.
    ///
    /// # Errors
    ///
    /// The first [`EncodeError`] that occurred, in emission order.
    pub fn into_result(self) -> Result<(), EncodeError> {
        match self.err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub(crate) fn latched(&self) -> bool {
        self.err.is_some()
    }

    pub(crate) fn latch(&mut self, e: EncodeError) {
        if self.err.is_none() {
            self.err = Some(e);
        }
    }

    fn put(&mut self, s: &str) {
        if self.err.is_some() {
            return;
        }
        if let Err(e) = self.out.write_str(s) {
            self.latch(EncodeError::Sink(e));
        }
    }

    /// Emits the `null` literal.
    pub fn null(&mut self) {
        self.put("null");
    }

    /// Emits `true` or `false`.
    pub fn boolean(&mut self, v: bool) {
        self.put(if v { "true" } else { "false" });
    }

    /// Emits a float at the configured precision.
    ///
    /// NaN and the infinities latch [`EncodeError::NonFiniteFloat`] without
    /// writing anything.
    pub fn float(&mut self, v: f64) {
        if !v.is_finite() {
            self.latch(EncodeError::NonFiniteFloat(v));
            return;
        }
        let s = format_float(v, self.float_precision);
        self.put(&s);
    }

    /// Emits a signed integer exactly, with no precision applied.
    pub fn integer(&mut self, v: i128) {
        self.put(&v.to_string());
    }

    /// Emits an unsigned integer exactly, with no precision applied.
    pub fn unsigned(&mut self, v: u128) {
        self.put(&v.to_string());
    }

    /// Emits a quoted, escaped string literal.
    pub fn string(&mut self, v: &str) {
        self.put("\"");
        self.scramble(v);
        self.put("\"");
    }

    /// Appends one array built by the closure.
    ///
    /// The surrounding brackets and element commas are emitted here; the
    /// closure only supplies elements. An error returned by the closure
    /// latches.
    pub fn array<F>(&mut self, build: F)
    where
        F: FnOnce(&mut ArrayWriter<'_, '_>) -> Result<(), EncodeError>,
    {
        if self.latched() {
            return;
        }
        let mut writer = ArrayWriter {
            dec: self,
            elements: 0,
        };
        let result = build(&mut writer);
        let elements = writer.elements;
        if let Err(e) = result {
            self.latch(e);
        }
        self.array_end(elements == 0);
    }

    /// Appends one object built by the closure.
    ///
    /// Structural braces, member commas and key quoting are emitted here; the
    /// closure only supplies members. An error returned by the closure
    /// latches.
    pub fn object<F>(&mut self, build: F)
    where
        F: FnOnce(&mut ObjectWriter<'_, '_>) -> Result<(), EncodeError>,
    {
        if self.latched() {
            return;
        }
        let mut writer = ObjectWriter {
            dec: self,
            members: 0,
        };
        let result = build(&mut writer);
        let members = writer.members;
        if let Err(e) = result {
            self.latch(e);
        }
        self.object_end(members == 0);
    }

    /// Appends any marshalable value.
    pub fn value<T: Marshal + ?Sized>(&mut self, v: &T) {
        if self.latched() {
            return;
        }
        if let Err(e) = v.marshal(self) {
            self.latch(e);
        }
    }

    pub(crate) fn object_field(&mut self, name: &str, first: bool) {
        self.put(if first { "{\"" } else { ",\"" });
        self.scramble(name);
        self.put("\":");
    }

    fn object_end(&mut self, was_empty: bool) {
        self.put(if was_empty { "{}" } else { "}" });
    }

    pub(crate) fn array_element(&mut self, first: bool) {
        self.put(if first { "[" } else { "," });
    }

    fn array_end(&mut self, was_empty: bool) {
        self.put(if was_empty { "[]" } else { "]" });
    }

    /// Writes the body of a string literal, escaping as it goes.
    ///
    /// Runs of passthrough bytes are written in one batch. The two-character
    /// mnemonics cover the usual suspects, remaining control characters get
    /// a lowercase `\u00xx` escape, and `/` is never escaped.
    fn scramble(&mut self, s: &str) {
        if s.is_empty() || self.latched() {
            return;
        }
        // Lowercase escapes for the control characters without a mnemonic.
        const CONTROL: [&str; 32] = [
            "\\u0000", "\\u0001", "\\u0002", "\\u0003", "\\u0004", "\\u0005", "\\u0006", "\\u0007",
            "\\u0008", "\\u0009", "\\u000a", "\\u000b", "\\u000c", "\\u000d", "\\u000e", "\\u000f",
            "\\u0010", "\\u0011", "\\u0012", "\\u0013", "\\u0014", "\\u0015", "\\u0016", "\\u0017",
            "\\u0018", "\\u0019", "\\u001a", "\\u001b", "\\u001c", "\\u001d", "\\u001e", "\\u001f",
        ];

        let bytes = s.as_bytes();
        let mut run = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let escape: &str = match b {
                0x08 => "\\b",
                0x0C => "\\f",
                b'\n' => "\\n",
                b'\r' => "\\r",
                b'\t' => "\\t",
                b'\\' => "\\\\",
                b'"' => "\\\"",
                b if b < 0x20 => CONTROL[usize::from(b)],
                _ => continue,
            };
            if run < i {
                self.put(&s[run..i]);
            }
            run = i + 1;
            self.put(escape);
        }
        if run < bytes.len() {
            self.put(&s[run..]);
        }
    }
}

impl fmt::Debug for Decorator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorator")
            .field("float_precision", &self.float_precision)
            .field("err", &self.err)
            .finish_non_exhaustive()
    }
}

/// Builder handed to array-producing closures and [`MarshalArray`]
/// implementations.
///
/// [`MarshalArray`]: crate::MarshalArray
#[derive(Debug)]
pub struct ArrayWriter<'a, 'w> {
    dec: &'a mut Decorator<'w>,
    elements: usize,
}

impl ArrayWriter<'_, '_> {
    /// Appends one element, emitting the separating comma as needed.
    pub fn element<T: Marshal + ?Sized>(&mut self, value: &T) {
        self.dec.array_element(self.elements == 0);
        self.elements += 1;
        self.dec.value(value);
    }

    /// Returns `true` once an error has latched, so loops can stop early.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.dec.latched()
    }
}

/// Builder handed to object-producing closures and [`MarshalObject`]
/// implementations.
///
/// [`MarshalObject`]: crate::MarshalObject
#[derive(Debug)]
pub struct ObjectWriter<'a, 'w> {
    dec: &'a mut Decorator<'w>,
    members: usize,
}

impl ObjectWriter<'_, '_> {
    /// Appends one `key: value` member, emitting separators and key quoting.
    pub fn member<T: Marshal + ?Sized>(&mut self, key: &str, value: &T) {
        self.dec.object_field(key, self.members == 0);
        self.members += 1;
        self.dec.value(value);
    }

    /// Returns `true` once an error has latched, so loops can stop early.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.dec.latched()
    }
}

/// Formats `v` with at most `precision` significant digits, choosing between
/// fixed and scientific notation the way `%g` does.
///
/// Scientific notation is used when the decimal exponent is below -4 or at
/// least `precision`; the exponent is rendered with an explicit sign and at
/// least two digits. Trailing zeros in the significand are removed.
pub(crate) fn format_float(v: f64, precision: usize) -> String {
    let digits = precision.max(1);

    // Render once in scientific form to learn the decimal exponent after
    // rounding to the requested number of digits.
    let sci = format!("{:.*e}", digits - 1, v);
    let (mantissa, exp) = match sci.rsplit_once('e') {
        Some((m, e)) => match e.parse::<i32>() {
            Ok(exp) => (m, exp),
            Err(_) => return sci,
        },
        None => return sci,
    };

    if exp < -4 || exp >= digits_as_i32(digits) {
        let mantissa = trim_zeros(mantissa);
        let (sign, magnitude) = if exp < 0 { ('-', -exp) } else { ('+', exp) };
        return format!("{mantissa}e{sign}{magnitude:02}");
    }

    let decimals = digits_as_i32(digits) - 1 - exp;
    debug_assert!(decimals >= 0);
    let fixed = format!("{:.*}", usize::try_from(decimals).unwrap_or(0), v);
    trim_zeros(&fixed).to_owned()
}

fn digits_as_i32(digits: usize) -> i32 {
    i32::try_from(digits).unwrap_or(i32::MAX)
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
