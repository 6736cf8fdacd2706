use std::collections::{BTreeMap, HashMap};
use std::fmt;

use rstest::rstest;

use crate::decorator::{ArrayWriter, ObjectWriter};
use crate::error::EncodeError;
use crate::marshal::{
    ArrayFn, Bytes, EncodeOptions, Marshal, MarshalArray, MarshalObject, MarshalString, ObjectFn,
    encode, encode_to, encode_with,
};
use crate::value::{Map, Value};

#[test]
fn primitives() {
    assert_eq!(encode(&true).unwrap(), "true");
    assert_eq!(encode(&false).unwrap(), "false");
    assert_eq!(encode(&Value::Null).unwrap(), "null");
    assert_eq!(encode(&Option::<i32>::None).unwrap(), "null");
    assert_eq!(encode(&Some(7i32)).unwrap(), "7");
    assert_eq!(encode(&0u8).unwrap(), "0");
    assert_eq!(encode(&-42i64).unwrap(), "-42");
    assert_eq!(encode(&i64::MIN).unwrap(), "-9223372036854775808");
    assert_eq!(encode(&u64::MAX).unwrap(), "18446744073709551615");
    assert_eq!(encode("hello").unwrap(), r#""hello""#);
    assert_eq!(encode(&String::from("owned")).unwrap(), r#""owned""#);
    assert_eq!(encode("").unwrap(), r#""""#);
}

#[test]
fn integers_ignore_float_precision() {
    let options = EncodeOptions { float_precision: 2 };
    assert_eq!(encode_with(&123_456_789i64, options).unwrap(), "123456789");
}

#[rstest]
#[case(0.0, "0")]
#[case(1.0, "1")]
#[case(0.5, "0.5")]
#[case(-2.5, "-2.5")]
#[case(100.0, "100")]
#[case(3.14159265359, "3.14159")]
#[case(1e20, "1e+20")]
#[case(1e-7, "1e-07")]
fn floats_at_default_precision(#[case] input: f64, #[case] want: &str) {
    assert_eq!(encode(&input).unwrap(), want);
}

#[rstest]
#[case(3.14159, 3, "3.14")]
#[case(123_456_789.0, 6, "1.23457e+08")]
#[case(0.000_123_456_7, 4, "0.0001235")]
#[case(1.23e20, 3, "1.23e+20")]
#[case(1.23e-20, 3, "1.23e-20")]
fn floats_at_explicit_precision(#[case] input: f64, #[case] precision: usize, #[case] want: &str) {
    let options = EncodeOptions {
        float_precision: precision,
    };
    assert_eq!(encode_with(&input, options).unwrap(), want);
}

#[rstest]
#[case(f64::NAN)]
#[case(f64::INFINITY)]
#[case(f64::NEG_INFINITY)]
fn non_finite_floats_are_rejected(#[case] input: f64) {
    assert!(matches!(
        encode(&input).unwrap_err(),
        EncodeError::NonFiniteFloat(_)
    ));
}

#[test]
fn sequences() {
    assert_eq!(encode(&Vec::<i32>::new()).unwrap(), "[]");
    assert_eq!(encode(&vec![1u32, 2, 3]).unwrap(), "[1,2,3]");
    assert_eq!(encode(&[1.5f64, -0.5]).unwrap(), "[1.5,-0.5]");
    assert_eq!(
        encode(&vec![vec!["a"], vec!["b", "c"]]).unwrap(),
        r#"[["a"],["b","c"]]"#
    );
    assert_eq!(
        encode(&vec![Some(1i32), None, Some(3)]).unwrap(),
        "[1,null,3]"
    );
}

#[test]
fn btree_map_members_in_key_order() {
    let mut map = BTreeMap::new();
    map.insert("b".to_string(), 1i32);
    map.insert("a".to_string(), 2i32);
    assert_eq!(encode(&map).unwrap(), r#"{"a":2,"b":1}"#);
    assert_eq!(encode(&BTreeMap::<String, i32>::new()).unwrap(), "{}");
}

#[test]
fn hash_map_members_are_sorted() {
    let mut map = HashMap::new();
    map.insert("zeta".to_string(), 1i32);
    map.insert("alpha".to_string(), 2i32);
    map.insert("mid".to_string(), 3i32);
    assert_eq!(encode(&map).unwrap(), r#"{"alpha":2,"mid":3,"zeta":1}"#);
}

#[test]
fn value_tree() {
    let mut map = Map::new();
    map.insert("list".into(), Value::Array(vec![Value::Null, Value::Boolean(true)]));
    map.insert("n".into(), Value::Number(2.5));
    let v = Value::Object(map);
    assert_eq!(encode(&v).unwrap(), r#"{"list":[null,true],"n":2.5}"#);
    assert_eq!(v.to_string(), r#"{"list":[null,true],"n":2.5}"#);
}

#[rstest]
#[case("plain", r#""plain""#)]
#[case("with \"quotes\"", r#""with \"quotes\"""#)]
#[case("back\\slash", r#""back\\slash""#)]
#[case("a/b", r#""a/b""#)]
#[case("tab\there", r#""tab\there""#)]
#[case("line\nbreak", r#""line\nbreak""#)]
#[case("\r\u{8}\u{c}", r#""\r\b\f""#)]
#[case("\u{1b}[0m", r#""\u001b[0m""#)]
#[case("héllo wörld 😀", "\"héllo wörld 😀\"")]
fn string_escaping(#[case] input: &str, #[case] want: &str) {
    assert_eq!(encode(input).unwrap(), want);
}

#[test]
fn all_control_characters_escape() {
    let input: String = (0u8..0x20).map(char::from).collect();
    let want = concat!(
        "\"",
        "\\u0000\\u0001\\u0002\\u0003\\u0004\\u0005\\u0006\\u0007",
        "\\b\\t\\n\\u000b\\f\\r\\u000e\\u000f",
        "\\u0010\\u0011\\u0012\\u0013\\u0014\\u0015\\u0016\\u0017",
        "\\u0018\\u0019\\u001a\\u001b\\u001c\\u001d\\u001e\\u001f",
        "\"",
    );
    assert_eq!(encode(input.as_str()).unwrap(), want);
}

struct Celsius(f64);

impl MarshalString for Celsius {
    fn marshal_string(&self) -> Result<String, EncodeError> {
        Ok(format!("{}C", self.0))
    }
}

impl Marshal for Celsius {
    fn as_marshal_string(&self) -> Option<&dyn MarshalString> {
        Some(self)
    }
}

struct Fibs(usize);

impl MarshalArray for Fibs {
    fn marshal_array(&self, w: &mut ArrayWriter<'_, '_>) -> Result<(), EncodeError> {
        let (mut a, mut b) = (0u64, 1u64);
        for _ in 0..self.0 {
            w.element(&a);
            (a, b) = (b, a + b);
        }
        Ok(())
    }
}

impl Marshal for Fibs {
    fn as_marshal_array(&self) -> Option<&dyn MarshalArray> {
        Some(self)
    }
}

struct Endpoint {
    host: &'static str,
    port: u16,
}

impl MarshalObject for Endpoint {
    fn marshal_object(&self, w: &mut ObjectWriter<'_, '_>) -> Result<(), EncodeError> {
        w.member("host", self.host);
        w.member("port", &self.port);
        Ok(())
    }
}

impl Marshal for Endpoint {
    fn as_marshal_object(&self) -> Option<&dyn MarshalObject> {
        Some(self)
    }
}

struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{:08x}", self.0)
    }
}

impl Marshal for RequestId {
    fn as_text(&self) -> Option<&dyn fmt::Display> {
        Some(self)
    }
}

#[test]
fn custom_string_capability() {
    assert_eq!(encode(&Celsius(21.5)).unwrap(), r#""21.5C""#);
}

#[test]
fn custom_array_capability() {
    assert_eq!(encode(&Fibs(6)).unwrap(), "[0,1,1,2,3,5]");
    assert_eq!(encode(&Fibs(0)).unwrap(), "[]");
}

#[test]
fn custom_object_capability() {
    let e = Endpoint {
        host: "localhost",
        port: 8080,
    };
    assert_eq!(encode(&e).unwrap(), r#"{"host":"localhost","port":8080}"#);
    assert_eq!(encode(&vec![&e, &e]).unwrap(),
        r#"[{"host":"localhost","port":8080},{"host":"localhost","port":8080}]"#);
}

#[test]
fn text_capability_renders_display_output() {
    assert_eq!(encode(&RequestId(0xAB)).unwrap(), r#""req-000000ab""#);
}

// Claims every capability at once; object must win.
struct Greedy;

impl MarshalObject for Greedy {
    fn marshal_object(&self, w: &mut ObjectWriter<'_, '_>) -> Result<(), EncodeError> {
        w.member("kind", "object");
        Ok(())
    }
}

impl MarshalArray for Greedy {
    fn marshal_array(&self, w: &mut ArrayWriter<'_, '_>) -> Result<(), EncodeError> {
        w.element("array");
        Ok(())
    }
}

impl MarshalString for Greedy {
    fn marshal_string(&self) -> Result<String, EncodeError> {
        Ok("string".into())
    }
}

impl Marshal for Greedy {
    fn as_marshal_object(&self) -> Option<&dyn MarshalObject> {
        Some(self)
    }

    fn as_marshal_array(&self) -> Option<&dyn MarshalArray> {
        Some(self)
    }

    fn as_marshal_string(&self) -> Option<&dyn MarshalString> {
        Some(self)
    }
}

#[test]
fn capability_priority_object_first() {
    assert_eq!(encode(&Greedy).unwrap(), r#"{"kind":"object"}"#);
}

// Same type, array and string capabilities only; array must win.
struct LessGreedy;

impl MarshalArray for LessGreedy {
    fn marshal_array(&self, w: &mut ArrayWriter<'_, '_>) -> Result<(), EncodeError> {
        w.element("array");
        Ok(())
    }
}

impl MarshalString for LessGreedy {
    fn marshal_string(&self) -> Result<String, EncodeError> {
        Ok("string".into())
    }
}

impl Marshal for LessGreedy {
    fn as_marshal_array(&self) -> Option<&dyn MarshalArray> {
        Some(self)
    }

    fn as_marshal_string(&self) -> Option<&dyn MarshalString> {
        Some(self)
    }
}

#[test]
fn capability_priority_array_over_string() {
    assert_eq!(encode(&LessGreedy).unwrap(), r#"["array"]"#);
}

struct Opaque;

impl Marshal for Opaque {}

#[test]
fn no_capability_is_unsupported() {
    let err = encode(&Opaque).unwrap_err();
    match err {
        EncodeError::UnsupportedType(name) => assert!(name.contains("Opaque")),
        other => panic!("unexpected error: {other:?}"),
    }
}

struct Broken;

impl MarshalString for Broken {
    fn marshal_string(&self) -> Result<String, EncodeError> {
        Err(EncodeError::custom("broken marshaler"))
    }
}

impl Marshal for Broken {
    fn as_marshal_string(&self) -> Option<&dyn MarshalString> {
        Some(self)
    }
}

#[test]
fn capability_error_propagates() {
    assert_eq!(
        encode(&Broken).unwrap_err(),
        EncodeError::custom("broken marshaler")
    );
}

#[test]
fn first_error_wins_over_later_ones() {
    let err = encode(&vec![
        Value::Number(f64::NAN),
        Value::Number(f64::INFINITY),
    ])
    .unwrap_err();
    assert!(matches!(err, EncodeError::NonFiniteFloat(v) if v.is_nan()));
}

#[test]
fn array_fn_builds_elements() {
    let evens = ArrayFn(|w: &mut ArrayWriter<'_, '_>| {
        for i in 0..4u32 {
            w.element(&(i * 2));
        }
        Ok(())
    });
    assert_eq!(encode(&evens).unwrap(), "[0,2,4,6]");
}

#[test]
fn object_fn_builds_members() {
    let obj = ObjectFn(|w: &mut ObjectWriter<'_, '_>| {
        w.member("id", &1u32);
        w.member("tags", &vec!["a", "b"]);
        Ok(())
    });
    assert_eq!(encode(&obj).unwrap(), r#"{"id":1,"tags":["a","b"]}"#);

    let empty = ObjectFn(|_: &mut ObjectWriter<'_, '_>| Ok(()));
    assert_eq!(encode(&empty).unwrap(), "{}");
}

#[test]
fn builder_closure_error_latches() {
    let obj = ObjectFn(|w: &mut ObjectWriter<'_, '_>| {
        w.member("before", &1u32);
        Err(EncodeError::custom("gave up"))
    });
    assert_eq!(encode(&obj).unwrap_err(), EncodeError::custom("gave up"));
}

#[test]
fn nested_builders() {
    let outer = ArrayFn(|w: &mut ArrayWriter<'_, '_>| {
        w.element(&ObjectFn(|w: &mut ObjectWriter<'_, '_>| {
            w.member("n", &1u32);
            Ok(())
        }));
        w.element(&Fibs(3));
        Ok(())
    });
    assert_eq!(encode(&outer).unwrap(), r#"[{"n":1},[0,1,1]]"#);
}

#[test]
fn bytes_lossy_substitutes_replacement() {
    assert_eq!(encode(&Bytes::new(b"ok")).unwrap(), r#""ok""#);
    assert_eq!(
        encode(&Bytes::new(b"bad \xff byte")).unwrap(),
        "\"bad \u{fffd} byte\""
    );
}

#[test]
fn bytes_strict_rejects_invalid_utf8() {
    assert_eq!(encode(&Bytes::strict(b"ok")).unwrap(), r#""ok""#);
    assert_eq!(
        encode(&Bytes::strict(b"bad \xff byte")).unwrap_err(),
        EncodeError::UnsupportedType("non-UTF-8 byte sequence")
    );
}

/// Accepts a fixed number of bytes, then refuses everything.
struct FailingSink {
    budget: usize,
    written: String,
}

impl fmt::Write for FailingSink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.written.len() + s.len() > self.budget {
            return Err(fmt::Error);
        }
        self.written.push_str(s);
        Ok(())
    }
}

#[test]
fn sink_failure_latches_and_surfaces() {
    let mut sink = FailingSink {
        budget: 4,
        written: String::new(),
    };
    let err = encode_to(
        &vec!["a", "b", "c", "d", "e"],
        &mut sink,
        EncodeOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err, EncodeError::Sink(fmt::Error));
    // Nothing after the failed write landed in the sink.
    assert!(sink.written.len() <= 4);
}

#[test]
fn encode_to_appends_to_existing_buffer() {
    let mut out = String::from("data: ");
    encode_to(&vec![1u8, 2], &mut out, EncodeOptions::default()).unwrap();
    assert_eq!(out, "data: [1,2]");
}

#[test]
fn shared_pointers_delegate() {
    let boxed: Box<dyn Marshal> = Box::new(5u32);
    assert_eq!(encode(&boxed).unwrap(), "5");
    assert_eq!(encode(&std::rc::Rc::new("rc")).unwrap(), r#""rc""#);
    assert_eq!(encode(&std::sync::Arc::new(vec![true])).unwrap(), "[true]");
}
