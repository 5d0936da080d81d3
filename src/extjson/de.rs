//! Extended JSON to BSON.

use serde_json::Value;

use crate::{
    array::Array,
    bson::Bson,
    document::Document,
    error::{Error, Result},
    extjson::models,
};

/// Converts an extended JSON value to BSON.
///
/// Canonical `$`-keyed wrappers are decoded to their scalar types; plain
/// JSON integers become [`Bson::Int32`] when they fit and [`Bson::Int64`]
/// otherwise.
pub fn from_value(value: Value) -> Result<Bson> {
    let bson = match value {
        Value::Null => Bson::Null,

        Value::Bool(v) => Bson::Boolean(v),

        Value::Number(n) => match n.as_i64() {
            Some(i) => match i32::try_from(i) {
                Ok(i) => Bson::Int32(i),
                Err(_) => Bson::Int64(i),
            },
            None => Bson::Double(n.as_f64().ok_or_else(|| {
                Error::invalid_input(format!("number {} is out of range", n))
            })?),
        },

        Value::String(s) => Bson::String(s),

        Value::Array(values) => {
            let mut arr = Array::with_capacity(values.len());
            for v in values {
                arr.push(from_value(v)?);
            }
            Bson::Array(arr)
        }

        Value::Object(map) => parse_object(map)?,
    };

    Ok(bson)
}

/// Converts an extended JSON object to a document, rejecting unrecognized
/// `$`-keyed wrappers.
pub fn parse_document(value: Value) -> Result<Document> {
    match from_value(value)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(Error::invalid_input(format!(
            "expected a document, got {:?}",
            other.element_type()
        ))),
    }
}

fn parse_object(map: serde_json::Map<String, Value>) -> Result<Bson> {
    let wrapper_key = map.keys().find(|k| k.starts_with('$')).cloned();

    if let Some(key) = wrapper_key {
        let object = Value::Object(map);

        let parsed = match key.as_str() {
            "$numberInt" => Bson::Int32(model::<models::Int32>(object)?.parse()?),
            "$numberLong" => Bson::Int64(model::<models::Int64>(object)?.parse()?),
            "$numberDouble" => Bson::Double(model::<models::Double>(object)?.parse()?),
            "$oid" => Bson::ObjectId(model::<models::ObjectId>(object)?.parse()?),
            "$binary" => Bson::Binary(model::<models::Binary>(object)?.parse()?),
            "$date" => Bson::DateTime(model::<models::DateTime>(object)?.parse()?),
            "$regularExpression" => {
                Bson::RegularExpression(model::<models::Regex>(object)?.parse())
            }
            "$timestamp" => Bson::Timestamp(model::<models::Timestamp>(object)?.parse()),
            "$numberDecimal" => Bson::Decimal128(model::<models::Decimal128>(object)?.parse()?),
            other => {
                return Err(Error::invalid_input(format!(
                    "unrecognized extended JSON wrapper {:?}",
                    other
                )))
            }
        };

        return Ok(parsed);
    }

    let mut doc = Document::with_capacity(map.len());
    for (name, value) in map {
        let value = from_value(value).map_err(|e| e.with_key(&name))?;
        doc.add(name, value);
    }

    Ok(Bson::Document(doc))
}

fn model<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| Error::invalid_input(format!("invalid extended JSON: {}", e)))
}
