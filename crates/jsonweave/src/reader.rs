//! Recursive-descent reading of JSON values from a [`Scanner`].
//!
//! Two consumption styles share one grammar walk: [`read_value`] materializes
//! a [`Value`] tree, while [`read_object_with`] and [`read_array_with`] hand
//! each top-level member to a caller-supplied callback without building the
//! container.

use crate::error::ParseError;
use crate::scanner::Scanner;
use crate::value::{Array, Map, Value};

/// Decodes a complete JSON document from `data`.
///
/// The input must hold exactly one JSON value; trailing non-whitespace bytes
/// are an error. This is the one-call entry point over [`Scanner::new`],
/// [`read_value`] and [`Scanner::finalize`].
///
/// # Examples
///
/// ```
/// use jsonweave::{Value, decode};
///
/// let v = decode(br#"{"on": true}"#)?;
/// assert_eq!(v.as_object().and_then(|m| m["on"].as_bool()), Some(true));
/// # Ok::<(), jsonweave::ParseError>(())
/// ```
///
/// # Errors
///
/// Any [`ParseError`] raised by the grammar walk, or
/// [`ParseError::UnexpectedToken`] for trailing input.
pub fn decode(data: &[u8]) -> Result<Value, ParseError> {
    let mut scanner = Scanner::new(data);
    let value = read_value(&mut scanner)?;
    scanner.finalize()?;
    Ok(value)
}

/// Reads one JSON value of any kind from the scanner.
///
/// The scanner is left positioned after the value; callers wanting to reject
/// trailing input follow up with [`Scanner::finalize`].
///
/// # Errors
///
/// [`ParseError::UnexpectedEof`] on empty input, otherwise whichever error
/// the mismatching production raises.
pub fn read_value(scanner: &mut Scanner<'_>) -> Result<Value, ParseError> {
    value_at(scanner, 0)
}

fn value_at(scanner: &mut Scanner<'_>, depth: usize) -> Result<Value, ParseError> {
    scanner.skip_whitespace();
    if scanner.is_eof() {
        return Err(ParseError::UnexpectedEof);
    }
    match scanner.peek() {
        b'{' => {
            let mut map = Map::new();
            object_body(scanner, depth, &mut |key, value| {
                map.insert(key, value);
                Ok::<(), ParseError>(())
            })?;
            Ok(Value::Object(map))
        }
        b'[' => {
            let mut items = Array::new();
            array_body(scanner, depth, &mut |value| {
                items.push(value);
                Ok::<(), ParseError>(())
            })?;
            Ok(Value::Array(items))
        }
        b'"' => scanner.parse_string().map(Value::String),
        b't' => {
            if scanner.skip_sequence(b"true") {
                Ok(Value::Boolean(true))
            } else {
                Err(ParseError::UnexpectedToken)
            }
        }
        b'f' => {
            if scanner.skip_sequence(b"false") {
                Ok(Value::Boolean(false))
            } else {
                Err(ParseError::UnexpectedToken)
            }
        }
        b'n' => {
            if scanner.skip_sequence(b"null") {
                Ok(Value::Null)
            } else {
                Err(ParseError::UnexpectedToken)
            }
        }
        b'-' | b'0'..=b'9' => scanner.parse_number().map(Value::Number),
        _ => Err(ParseError::UnexpectedToken),
    }
}

/// Reads a JSON object into a [`Map`].
///
/// Duplicate keys are not an error; the last occurrence wins.
///
/// # Errors
///
/// [`ParseError::UnexpectedToken`] if the input does not start with `{`, or
/// any error raised while reading members.
pub fn read_object(scanner: &mut Scanner<'_>) -> Result<Map, ParseError> {
    let mut map = Map::new();
    object_body(scanner, 0, &mut |key, value| {
        map.insert(key, value);
        Ok::<(), ParseError>(())
    })?;
    Ok(map)
}

/// Reads a JSON array into an [`Array`].
///
/// # Errors
///
/// [`ParseError::UnexpectedToken`] if the input does not start with `[`, or
/// any error raised while reading elements.
pub fn read_array(scanner: &mut Scanner<'_>) -> Result<Array, ParseError> {
    let mut items = Array::new();
    array_body(scanner, 0, &mut |value| {
        items.push(value);
        Ok::<(), ParseError>(())
    })?;
    Ok(items)
}

/// Reads a JSON object, invoking `visit` once per member in input order.
///
/// Member values below the top level are still materialized as [`Value`]
/// trees, but the object itself is never collected, so duplicate keys reach
/// the callback individually. An error returned by the callback aborts the
/// read and propagates verbatim.
///
/// # Errors
///
/// Grammar errors converted through `E: From<ParseError>`, or whatever the
/// callback returns.
pub fn read_object_with<E, F>(scanner: &mut Scanner<'_>, mut visit: F) -> Result<(), E>
where
    E: From<ParseError>,
    F: FnMut(String, Value) -> Result<(), E>,
{
    object_body(scanner, 0, &mut visit)
}

/// Reads a JSON array, invoking `visit` once per element in input order.
///
/// The counterpart of [`read_object_with`] for arrays.
///
/// # Errors
///
/// Grammar errors converted through `E: From<ParseError>`, or whatever the
/// callback returns.
pub fn read_array_with<E, F>(scanner: &mut Scanner<'_>, mut visit: F) -> Result<(), E>
where
    E: From<ParseError>,
    F: FnMut(Value) -> Result<(), E>,
{
    array_body(scanner, 0, &mut visit)
}

fn object_body<E, F>(scanner: &mut Scanner<'_>, depth: usize, visit: &mut F) -> Result<(), E>
where
    E: From<ParseError>,
    F: FnMut(String, Value) -> Result<(), E>,
{
    if depth >= scanner.max_depth() {
        return Err(ParseError::RecursionLimitExceeded.into());
    }
    scanner.skip_whitespace();
    if !scanner.skip_byte(b'{') {
        return Err(ParseError::UnexpectedToken.into());
    }
    scanner.skip_whitespace();
    if scanner.skip_byte(b'}') {
        return Ok(());
    }
    loop {
        scanner.skip_whitespace();
        if scanner.is_eof() {
            return Err(ParseError::UnexpectedEof.into());
        }
        let key = scanner.parse_string().map_err(E::from)?;
        scanner.skip_whitespace();
        if !scanner.skip_byte(b':') {
            return Err(ParseError::UnexpectedToken.into());
        }
        let value = value_at(scanner, depth + 1).map_err(E::from)?;
        visit(key, value)?;
        scanner.skip_whitespace();
        if scanner.is_eof() {
            return Err(ParseError::UnexpectedEof.into());
        }
        if scanner.skip_byte(b',') {
            continue;
        }
        if scanner.skip_byte(b'}') {
            return Ok(());
        }
        return Err(ParseError::UnexpectedToken.into());
    }
}

fn array_body<E, F>(scanner: &mut Scanner<'_>, depth: usize, visit: &mut F) -> Result<(), E>
where
    E: From<ParseError>,
    F: FnMut(Value) -> Result<(), E>,
{
    if depth >= scanner.max_depth() {
        return Err(ParseError::RecursionLimitExceeded.into());
    }
    scanner.skip_whitespace();
    if !scanner.skip_byte(b'[') {
        return Err(ParseError::UnexpectedToken.into());
    }
    scanner.skip_whitespace();
    if scanner.skip_byte(b']') {
        return Ok(());
    }
    loop {
        let value = value_at(scanner, depth + 1).map_err(E::from)?;
        visit(value)?;
        scanner.skip_whitespace();
        if scanner.is_eof() {
            return Err(ParseError::UnexpectedEof.into());
        }
        if scanner.skip_byte(b',') {
            continue;
        }
        if scanner.skip_byte(b']') {
            return Ok(());
        }
        return Err(ParseError::UnexpectedToken.into());
    }
}
