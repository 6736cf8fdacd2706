//! Value-to-JSON marshaling.
//!
//! [`Marshal`] is the single encoding entry trait. Its default [`marshal`]
//! body probes an ordered chain of capabilities (object, array, string,
//! plain text) and renders through the first one the type opts into.
//! Primitives override [`marshal`] directly; custom types usually implement
//! one capability trait plus the matching `as_*` hook.
//!
//! [`marshal`]: Marshal::marshal

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use bstr::ByteSlice;

use crate::decorator::{ArrayWriter, Decorator, ObjectWriter};
use crate::error::EncodeError;
use crate::value::Value;

/// Options controlling text production.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Maximum significant digits used when formatting floats.
    ///
    /// Default: 6. Use 17 for an exact `f64` round trip.
    pub float_precision: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { float_precision: 6 }
    }
}

/// Renders a value as a JSON object, one member at a time.
pub trait MarshalObject {
    /// Emits the object's members through `w`.
    ///
    /// # Errors
    ///
    /// Any [`EncodeError`]; it latches in the underlying decorator.
    fn marshal_object(&self, w: &mut ObjectWriter<'_, '_>) -> Result<(), EncodeError>;
}

/// Renders a value as a JSON array, one element at a time.
pub trait MarshalArray {
    /// Emits the array's elements through `w`.
    ///
    /// # Errors
    ///
    /// Any [`EncodeError`]; it latches in the underlying decorator.
    fn marshal_array(&self, w: &mut ArrayWriter<'_, '_>) -> Result<(), EncodeError>;
}

/// Renders a value as a JSON string.
pub trait MarshalString {
    /// Produces the raw string content; quoting and escaping happen later.
    ///
    /// # Errors
    ///
    /// Any [`EncodeError`]; it latches in the underlying decorator.
    fn marshal_string(&self) -> Result<String, EncodeError>;
}

/// A value that can be rendered as JSON text.
///
/// The default [`marshal`] body dispatches over capabilities in a fixed
/// priority order: object, then array, then string, then plain text. A type
/// claiming several capabilities is rendered by the highest-priority one; a
/// type claiming none fails with [`EncodeError::UnsupportedType`].
///
/// # Examples
///
/// ```
/// use jsonweave::{EncodeError, Marshal, MarshalObject, ObjectWriter, encode};
///
/// struct Point {
///     x: f64,
///     y: f64,
/// }
///
/// impl MarshalObject for Point {
///     fn marshal_object(&self, w: &mut ObjectWriter<'_, '_>) -> Result<(), EncodeError> {
///         w.member("x", &self.x);
///         w.member("y", &self.y);
///         Ok(())
///     }
/// }
///
/// impl Marshal for Point {
///     fn as_marshal_object(&self) -> Option<&dyn MarshalObject> {
///         Some(self)
///     }
/// }
///
/// let text = encode(&Point { x: 1.0, y: 2.5 })?;
/// assert_eq!(text, r#"{"x":1,"y":2.5}"#);
/// # Ok::<(), EncodeError>(())
/// ```
///
/// [`marshal`]: Marshal::marshal
pub trait Marshal {
    /// Writes this value into the decorator.
    ///
    /// # Errors
    ///
    /// [`EncodeError::UnsupportedType`] when no capability is claimed, or
    /// whatever the selected capability returns.
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        if let Some(obj) = self.as_marshal_object() {
            d.object(|w| obj.marshal_object(w));
            return Ok(());
        }
        if let Some(arr) = self.as_marshal_array() {
            d.array(|w| arr.marshal_array(w));
            return Ok(());
        }
        if let Some(s) = self.as_marshal_string() {
            let content = s.marshal_string()?;
            d.string(&content);
            return Ok(());
        }
        if let Some(text) = self.as_text() {
            let mut content = String::new();
            fmt::write(&mut content, format_args!("{text}"))
                .map_err(|_| EncodeError::custom("text rendering failure"))?;
            d.string(&content);
            return Ok(());
        }
        Err(EncodeError::UnsupportedType(std::any::type_name::<Self>()))
    }

    /// Opts into rendering as a JSON object. Highest priority.
    fn as_marshal_object(&self) -> Option<&dyn MarshalObject> {
        None
    }

    /// Opts into rendering as a JSON array. Probed after object.
    fn as_marshal_array(&self) -> Option<&dyn MarshalArray> {
        None
    }

    /// Opts into rendering as a JSON string. Probed after array.
    fn as_marshal_string(&self) -> Option<&dyn MarshalString> {
        None
    }

    /// Opts into rendering the [`fmt::Display`] output as a JSON string.
    /// Lowest priority.
    fn as_text(&self) -> Option<&dyn fmt::Display> {
        None
    }
}

impl Marshal for bool {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        d.boolean(*self);
        Ok(())
    }
}

macro_rules! marshal_signed {
    ($($t:ty),*) => {$(
        impl Marshal for $t {
            fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
                d.integer(i128::from(*self));
                Ok(())
            }
        }
    )*};
}

macro_rules! marshal_unsigned {
    ($($t:ty),*) => {$(
        impl Marshal for $t {
            fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
                d.unsigned(u128::from(*self));
                Ok(())
            }
        }
    )*};
}

marshal_signed!(i8, i16, i32, i64, i128);
marshal_unsigned!(u8, u16, u32, u64, u128);

impl Marshal for isize {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        d.integer(*self as i128);
        Ok(())
    }
}

impl Marshal for usize {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        d.unsigned(*self as u128);
        Ok(())
    }
}

impl Marshal for f64 {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        d.float(*self);
        Ok(())
    }
}

impl Marshal for f32 {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        d.float(f64::from(*self));
        Ok(())
    }
}

impl Marshal for str {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        d.string(self);
        Ok(())
    }
}

impl Marshal for String {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        d.string(self);
        Ok(())
    }
}

impl<T: Marshal + ?Sized> Marshal for &T {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        (**self).marshal(d)
    }
}

impl<T: Marshal + ?Sized> Marshal for Box<T> {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        (**self).marshal(d)
    }
}

impl<T: Marshal + ?Sized> Marshal for Rc<T> {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        (**self).marshal(d)
    }
}

impl<T: Marshal + ?Sized> Marshal for Arc<T> {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        (**self).marshal(d)
    }
}

/// `None` renders as `null`.
impl<T: Marshal> Marshal for Option<T> {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        match self {
            Some(v) => v.marshal(d),
            None => {
                d.null();
                Ok(())
            }
        }
    }
}

impl<T: Marshal> Marshal for [T] {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        d.array(|w| {
            for item in self {
                w.element(item);
                if w.failed() {
                    break;
                }
            }
            Ok(())
        });
        Ok(())
    }
}

impl<T: Marshal> Marshal for Vec<T> {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        self.as_slice().marshal(d)
    }
}

impl<T: Marshal, const N: usize> Marshal for [T; N] {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        self.as_slice().marshal(d)
    }
}

impl<V: Marshal> Marshal for BTreeMap<String, V> {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        d.object(|w| {
            for (key, value) in self {
                w.member(key, value);
                if w.failed() {
                    break;
                }
            }
            Ok(())
        });
        Ok(())
    }
}

impl<V: Marshal, S: std::hash::BuildHasher> Marshal for HashMap<String, V, S> {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        // Stable repeatable output requires sorted keys.
        let mut keys: Vec<&String> = self.keys().collect();
        keys.sort_unstable();
        d.object(|w| {
            for key in keys {
                w.member(key, &self[key]);
                if w.failed() {
                    break;
                }
            }
            Ok(())
        });
        Ok(())
    }
}

impl Marshal for Value {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        match self {
            Self::Null => {
                d.null();
                Ok(())
            }
            Self::Boolean(b) => b.marshal(d),
            Self::Number(n) => n.marshal(d),
            Self::String(s) => s.marshal(d),
            Self::Array(items) => items.as_slice().marshal(d),
            Self::Object(map) => map.marshal(d),
        }
    }
}

/// Adapts a closure into an array-producing value.
///
/// # Examples
///
/// ```
/// use jsonweave::{ArrayFn, EncodeError, encode};
///
/// let squares = ArrayFn(|w: &mut jsonweave::ArrayWriter<'_, '_>| {
///     for i in 1..=3u32 {
///         w.element(&(i * i));
///     }
///     Ok(())
/// });
/// assert_eq!(encode(&squares)?, "[1,4,9]");
/// # Ok::<(), EncodeError>(())
/// ```
pub struct ArrayFn<F>(pub F);

impl<F> Marshal for ArrayFn<F>
where
    F: Fn(&mut ArrayWriter<'_, '_>) -> Result<(), EncodeError>,
{
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        d.array(&self.0);
        Ok(())
    }
}

/// Adapts a closure into an object-producing value.
pub struct ObjectFn<F>(pub F);

impl<F> Marshal for ObjectFn<F>
where
    F: Fn(&mut ObjectWriter<'_, '_>) -> Result<(), EncodeError>,
{
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        d.object(&self.0);
        Ok(())
    }
}

/// A byte slice rendered as a JSON string.
///
/// JSON strings carry text, so the bytes must be interpreted as UTF-8. The
/// default mode substitutes U+FFFD for invalid sequences; [`Bytes::strict`]
/// fails on them instead.
#[derive(Debug, Clone, Copy)]
pub struct Bytes<'a> {
    bytes: &'a [u8],
    strict: bool,
}

impl<'a> Bytes<'a> {
    /// Wraps bytes for lossy rendering: invalid UTF-8 becomes U+FFFD.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            strict: false,
        }
    }

    /// Wraps bytes for strict rendering: invalid UTF-8 is an error.
    #[must_use]
    pub fn strict(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            strict: true,
        }
    }
}

impl Marshal for Bytes<'_> {
    fn marshal(&self, d: &mut Decorator<'_>) -> Result<(), EncodeError> {
        if self.strict {
            match self.bytes.to_str() {
                Ok(s) => d.string(s),
                Err(_) => {
                    return Err(EncodeError::UnsupportedType("non-UTF-8 byte sequence"));
                }
            }
        } else {
            d.string(&self.bytes.to_str_lossy());
        }
        Ok(())
    }
}

/// Encodes a value to a JSON string with default options.
///
/// # Examples
///
/// ```
/// use jsonweave::encode;
///
/// assert_eq!(encode(&vec![1u32, 2, 3])?, "[1,2,3]");
/// # Ok::<(), jsonweave::EncodeError>(())
/// ```
///
/// # Errors
///
/// The first [`EncodeError`] raised while marshaling.
pub fn encode<T: Marshal + ?Sized>(value: &T) -> Result<String, EncodeError> {
    encode_with(value, EncodeOptions::default())
}

/// Encodes a value to a JSON string with explicit options.
///
/// # Errors
///
/// The first [`EncodeError`] raised while marshaling.
pub fn encode_with<T: Marshal + ?Sized>(
    value: &T,
    options: EncodeOptions,
) -> Result<String, EncodeError> {
    let mut out = String::new();
    encode_to(value, &mut out, options)?;
    Ok(out)
}

/// Encodes a value into any [`fmt::Write`] sink.
///
/// On error the sink may hold a partial prefix of the output; the caller is
/// expected to discard it.
///
/// # Errors
///
/// The first [`EncodeError`] raised while marshaling, including sink write
/// failures as [`EncodeError::Sink`].
pub fn encode_to<T, W>(value: &T, out: &mut W, options: EncodeOptions) -> Result<(), EncodeError>
where
    T: Marshal + ?Sized,
    W: fmt::Write,
{
    let mut decorator = Decorator::new(out, options.float_precision);
    decorator.value(value);
    decorator.into_result()
}
