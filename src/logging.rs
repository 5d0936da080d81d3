//! String renderings of BSON values for debugging and diffing.
//!
//! Two forms are produced: a compact single line (the [`std::fmt::Display`]
//! impls) and an indented multi-line form (`to_indented_string`). Both are
//! deterministic, so they are safe to pin in golden tests, and both
//! preserve information the ordinary renderings drop: non-canonical NaN bit
//! patterns, the int32/int64 distinction, and binary subtypes.

use std::fmt::{self, Write};

use crate::{array::Array, bson::Bson, document::Document};

/// The maximum depth rendered; composites nested deeper appear as `{...}` /
/// `[...]`.
pub const LOG_MAX_DEPTH: usize = 20;

pub(crate) fn write_compact(f: &mut fmt::Formatter<'_>, v: &Bson) -> fmt::Result {
    write_value(f, v, None, 1)
}

pub(crate) fn write_compact_document(f: &mut fmt::Formatter<'_>, doc: &Document) -> fmt::Result {
    write_document(f, doc, None, 1)
}

pub(crate) fn write_compact_array(f: &mut fmt::Formatter<'_>, arr: &Array) -> fmt::Result {
    write_array(f, arr, None, 1)
}

pub(crate) fn indented_string(v: &Bson) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_value(&mut out, v, Some(0), 1);
    out
}

pub(crate) fn indented_document_string(doc: &Document) -> String {
    let mut out = String::new();
    let _ = write_document(&mut out, doc, Some(0), 1);
    out
}

pub(crate) fn indented_array_string(arr: &Array) -> String {
    let mut out = String::new();
    let _ = write_array(&mut out, arr, Some(0), 1);
    out
}

fn write_document<W: Write>(
    out: &mut W,
    doc: &Document,
    indent: Option<usize>,
    depth: usize,
) -> fmt::Result {
    if doc.is_empty() {
        return out.write_str("{}");
    }
    if depth > LOG_MAX_DEPTH {
        return out.write_str("{...}");
    }

    match indent {
        None => {
            out.write_char('{')?;
            for (i, (name, value)) in doc.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_quoted(out, name)?;
                out.write_str(": ")?;
                write_value(out, value, None, depth + 1)?;
            }
            out.write_char('}')
        }
        Some(level) => {
            out.write_str("{\n")?;
            for (name, value) in doc.iter() {
                write_indent(out, level + 1)?;
                write_quoted(out, name)?;
                out.write_str(": ")?;
                write_value(out, value, Some(level + 1), depth + 1)?;
                out.write_str(",\n")?;
            }
            write_indent(out, level)?;
            out.write_char('}')
        }
    }
}

fn write_array<W: Write>(
    out: &mut W,
    arr: &Array,
    indent: Option<usize>,
    depth: usize,
) -> fmt::Result {
    if arr.is_empty() {
        return out.write_str("[]");
    }
    if depth > LOG_MAX_DEPTH {
        return out.write_str("[...]");
    }

    match indent {
        None => {
            out.write_char('[')?;
            for (i, value) in arr.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_value(out, value, None, depth + 1)?;
            }
            out.write_char(']')
        }
        Some(level) => {
            out.write_str("[\n")?;
            for value in arr.iter() {
                write_indent(out, level + 1)?;
                write_value(out, value, Some(level + 1), depth + 1)?;
                out.write_str(",\n")?;
            }
            write_indent(out, level)?;
            out.write_char(']')
        }
    }
}

fn write_value<W: Write>(out: &mut W, v: &Bson, indent: Option<usize>, depth: usize) -> fmt::Result {
    match v {
        Bson::Document(doc) => write_document(out, doc, indent, depth),

        Bson::Array(arr) => write_array(out, arr, indent, depth),

        Bson::RawDocument(raw) => write!(out, "RawDocument<{}>", raw.len()),
        Bson::RawArray(raw) => write!(out, "RawArray<{}>", raw.len()),

        Bson::Double(v) => write_double(out, *v),

        Bson::String(s) => write_quoted(out, s),

        Bson::Binary(bin) => write!(out, "{}", bin),

        Bson::ObjectId(oid) => write!(out, "ObjectId({})", oid),

        Bson::Boolean(v) => write!(out, "{}", v),

        Bson::DateTime(dt) => write!(out, "{}", dt),

        Bson::Null => out.write_str("null"),

        Bson::RegularExpression(re) => write!(out, "{}", re),

        Bson::Int32(v) => write!(out, "{}", v),

        Bson::Timestamp(ts) => write!(out, "{}", ts),

        Bson::Int64(v) => write!(out, "int64({})", v),

        Bson::Decimal128(d) => write!(out, "{:?}", d),
    }
}

fn write_indent<W: Write>(out: &mut W, level: usize) -> fmt::Result {
    for _ in 0..level {
        out.write_str("  ")?;
    }
    Ok(())
}

/// Writes a key or string value backtick-quoted, falling back to an escaped
/// double-quoted form when the text itself contains backticks or control
/// characters.
fn write_quoted<W: Write>(out: &mut W, s: &str) -> fmt::Result {
    if s.contains('`') || s.chars().any(char::is_control) {
        write!(out, "{:?}", s)
    } else {
        write!(out, "`{}`", s)
    }
}

/// Renders a double so that every bit pattern stays distinguishable: the
/// canonical NaN is `NaN`, any other NaN carries its bits, and integral
/// values keep a trailing `.0`.
fn write_double<W: Write>(out: &mut W, v: f64) -> fmt::Result {
    if v.is_nan() {
        let bits = v.to_bits();
        if bits != f64::NAN.to_bits() {
            return write!(out, "NaN({:b})", bits);
        }
        return out.write_str("NaN");
    }
    if v == f64::INFINITY {
        return out.write_str("+Inf");
    }
    if v == f64::NEG_INFINITY {
        return out.write_str("-Inf");
    }

    let s = v.to_string();
    if s.contains('.') {
        out.write_str(&s)
    } else {
        write!(out, "{}.0", s)
    }
}

#[cfg(test)]
mod tests {
    use crate::{array, doc, Bson};

    #[test]
    fn compact_rendering_is_stable() {
        let doc = doc! {
            "a": 1,
            "b": "text",
            "c": array![true, 2.5],
            "d": 1i64,
            "e": doc! {},
        };

        assert_eq!(
            doc.to_string(),
            "{`a`: 1, `b`: `text`, `c`: [true, 2.5], `d`: int64(1), `e`: {}}"
        );
    }

    #[test]
    fn indented_rendering_is_stable() {
        let doc = doc! { "a": 1, "b": array![true] };

        assert_eq!(
            doc.to_indented_string(),
            "{\n  `a`: 1,\n  `b`: [\n    true,\n  ],\n}"
        );
    }

    #[test]
    fn doubles_keep_their_identity() {
        assert_eq!(Bson::Double(42.0).to_string(), "42.0");
        assert_eq!(Bson::Double(0.5).to_string(), "0.5");
        assert_eq!(Bson::Double(f64::INFINITY).to_string(), "+Inf");
        assert_eq!(Bson::Double(f64::NEG_INFINITY).to_string(), "-Inf");
        assert_eq!(Bson::Double(f64::NAN).to_string(), "NaN");

        let weird = f64::from_bits(f64::NAN.to_bits() | 1);
        let rendered = Bson::Double(weird).to_string();
        assert!(rendered.starts_with("NaN("), "{}", rendered);
        assert_ne!(rendered, Bson::Double(f64::NAN).to_string());
    }

    #[test]
    fn awkward_keys_fall_back_to_escaped_quotes() {
        let doc = doc! { "tick`tock": 1, "tab\there": 2 };
        assert_eq!(
            doc.to_string(),
            "{\"tick`tock\": 1, \"tab\\there\": 2}"
        );
    }

    #[test]
    fn depth_is_capped() {
        let mut doc = doc! { "leaf": 1 };
        for _ in 0..30 {
            doc = doc! { "next": doc };
        }

        let rendered = doc.to_string();
        assert!(rendered.contains("{...}"), "{}", rendered);
        assert!(!rendered.contains("leaf"));
    }

    #[test]
    fn raw_values_render_by_length() {
        let raw = doc! { "a": 1 }.encode().expect("encode");
        let doc = doc! { "sub": crate::Bson::RawDocument(raw) };
        assert_eq!(doc.to_string(), "{`sub`: RawDocument<12>}");
    }
}
