//! A strict JSON decoder paired with a flexible incremental encoder.
//!
//! The decoding side accepts exactly the [RFC 8259] grammar (no comments,
//! no trailing commas, no relaxed literals) and produces either a dynamic
//! [`Value`] tree or a stream of callbacks over top-level container members.
//! The encoding side renders anything implementing [`Marshal`] as compact
//! JSON text, with builder closures for custom arrays and objects.
//!
//! ```
//! use jsonweave::{Value, decode, encode};
//!
//! let value = decode(b" [1, 2, 3] ")?;
//! assert_eq!(value, Value::Array(vec![
//!     Value::Number(1.0),
//!     Value::Number(2.0),
//!     Value::Number(3.0),
//! ]));
//! assert_eq!(encode(&value)?, "[1,2,3]");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Decoding and encoding deliberately do not round-trip byte for byte:
//! numbers re-render at the configured float precision and object members
//! re-emit in sorted key order.
//!
//! [RFC 8259]: https://datatracker.ietf.org/doc/html/rfc8259

mod decorator;
mod error;
mod marshal;
mod reader;
mod scanner;
mod value;

#[cfg(test)]
mod tests;

pub use decorator::{ArrayWriter, Decorator, ObjectWriter};
pub use error::{EncodeError, ParseError};
pub use marshal::{
    ArrayFn, Bytes, EncodeOptions, Marshal, MarshalArray, MarshalObject, MarshalString, ObjectFn,
    encode, encode_to, encode_with,
};
pub use reader::{decode, read_array, read_array_with, read_object, read_object_with, read_value};
pub use scanner::{DEFAULT_MAX_DEPTH, Scanner, ScannerOptions};
pub use value::{Array, Map, Value};
