//! BSON to canonical extended JSON.

use serde_json::{json, Value};

use crate::{bson::Bson, document::Document, error::Result};

/// Converts a BSON value to its canonical extended JSON form.
///
/// Raw composites are decoded on the way; a malformed raw value surfaces as
/// a decoding error.
pub fn to_value(v: &Bson) -> Result<Value> {
    let value = match v {
        Bson::Double(v) => json!({ "$numberDouble": double_string(*v) }),

        Bson::String(s) => Value::String(s.clone()),

        Bson::Document(doc) => value_for_document(doc)?,

        Bson::Array(arr) => Value::Array(
            arr.iter()
                .map(to_value)
                .collect::<Result<Vec<_>>>()?,
        ),

        Bson::Binary(bin) => json!({
            "$binary": {
                "base64": bin.to_base64(),
                "subType": hex::encode([u8::from(bin.subtype)]),
            }
        }),

        Bson::ObjectId(oid) => json!({ "$oid": oid.to_hex() }),

        Bson::Boolean(v) => Value::Bool(*v),

        Bson::DateTime(dt) => json!({
            "$date": { "$numberLong": dt.timestamp_millis().to_string() }
        }),

        Bson::Null => Value::Null,

        Bson::RegularExpression(re) => json!({
            "$regularExpression": {
                "pattern": re.pattern,
                "options": re.options,
            }
        }),

        Bson::Int32(v) => json!({ "$numberInt": v.to_string() }),

        Bson::Timestamp(ts) => json!({
            "$timestamp": { "t": ts.time, "i": ts.increment }
        }),

        Bson::Int64(v) => json!({ "$numberLong": v.to_string() }),

        Bson::Decimal128(d) => json!({ "$numberDecimal": d.to_string() }),

        Bson::RawDocument(raw) => value_for_document(&raw.decode()?)?,

        Bson::RawArray(raw) => to_value(&Bson::Array(raw.decode()?))?,
    };

    Ok(value)
}

/// Converts a document to a JSON object, preserving field order. Duplicate
/// field names collapse to the last occurrence, which JSON objects cannot
/// avoid.
pub fn value_for_document(doc: &Document) -> Result<Value> {
    let mut map = serde_json::Map::with_capacity(doc.len());

    for (name, value) in doc.iter() {
        map.insert(name.to_owned(), to_value(value)?);
    }

    Ok(Value::Object(map))
}

fn double_string(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_owned();
    }
    if v == f64::INFINITY {
        return "Infinity".to_owned();
    }
    if v == f64::NEG_INFINITY {
        return "-Infinity".to_owned();
    }

    let s = v.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{}.0", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{array, doc, Timestamp};

    #[test]
    fn scalars_use_canonical_wrappers() {
        let doc = doc! {
            "i32": 42,
            "i64": 42i64,
            "double": 0.5,
            "oid": crate::oid::ObjectId::from_bytes([0x11; 12]),
            "ts": Timestamp { time: 1, increment: 2 },
        };

        let value = value_for_document(&doc).expect("convert");
        assert_eq!(value["i32"], json!({ "$numberInt": "42" }));
        assert_eq!(value["i64"], json!({ "$numberLong": "42" }));
        assert_eq!(value["double"], json!({ "$numberDouble": "0.5" }));
        assert_eq!(
            value["oid"],
            json!({ "$oid": "111111111111111111111111" })
        );
        assert_eq!(value["ts"], json!({ "$timestamp": { "t": 1, "i": 2 } }));
    }

    #[test]
    fn special_doubles_spell_out() {
        assert_eq!(
            to_value(&crate::Bson::Double(f64::INFINITY)).expect("inf"),
            json!({ "$numberDouble": "Infinity" })
        );
        assert_eq!(
            to_value(&crate::Bson::Double(f64::NAN)).expect("nan"),
            json!({ "$numberDouble": "NaN" })
        );
        assert_eq!(
            to_value(&crate::Bson::Double(3.0)).expect("integral"),
            json!({ "$numberDouble": "3.0" })
        );
    }

    #[test]
    fn raw_composites_decode_on_the_way() {
        let raw = doc! { "nested": array![1] }.encode().expect("encode");
        let value = to_value(&crate::Bson::RawDocument(raw)).expect("convert");
        assert_eq!(
            value,
            json!({ "nested": [ { "$numberInt": "1" } ] })
        );
    }
}
