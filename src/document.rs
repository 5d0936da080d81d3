//! A BSON document: an ordered sequence of named fields.

use std::fmt;

use crate::{bson::Bson, encode, error::Result, raw::RawDocument};

/// A BSON document.
///
/// Fields keep their insertion order, and duplicate field names are
/// permitted: the MongoDB server emits them, so decoding must not collapse
/// them and encoding must reproduce them. Name-based accessors operate on
/// the first occurrence; positional accessors reach the rest.
///
/// A document can be frozen, after which any mutating method panics.
/// Freezing is idempotent and irreversible for that instance; a [`Clone`]
/// of a frozen document is mutable again.
#[derive(Default)]
pub struct Document {
    fields: Vec<(String, Bson)>,
    frozen: bool,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            frozen: false,
        }
    }

    /// Creates a new empty document with capacity for `n` fields.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            fields: Vec::with_capacity(n),
            frozen: false,
        }
    }

    /// The number of fields in the document.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Prevents further modification of this instance. Any subsequent call
    /// to a mutating method panics.
    ///
    /// It is safe to call `freeze` multiple times.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether [`freeze`](Self::freeze) has been called on this instance.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn check_frozen(&self) {
        if self.frozen {
            panic!("document is frozen and can't be modified");
        }
    }

    /// Returns the value of the first field with the given name, or `None`
    /// if there is no such field.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&Bson> {
        let name = name.as_ref();
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Returns the name and value of the field at the given position.
    pub fn get_by_index(&self, index: usize) -> Option<(&str, &Bson)> {
        self.fields.get(index).map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the double value of the first field with the given name, or
    /// `None` if it is missing or has another type.
    pub fn get_f64(&self, name: impl AsRef<str>) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    /// Returns the string value of the first field with the given name, or
    /// `None` if it is missing or has another type.
    pub fn get_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.get(name)?.as_str()
    }

    /// Returns the decoded document value of the first field with the given
    /// name, or `None` if it is missing or has another type.
    pub fn get_document(&self, name: impl AsRef<str>) -> Option<&Document> {
        self.get(name)?.as_document()
    }

    /// Returns the decoded array value of the first field with the given
    /// name, or `None` if it is missing or has another type.
    pub fn get_array(&self, name: impl AsRef<str>) -> Option<&crate::Array> {
        self.get(name)?.as_array()
    }

    /// Returns the boolean value of the first field with the given name, or
    /// `None` if it is missing or has another type.
    pub fn get_bool(&self, name: impl AsRef<str>) -> Option<bool> {
        self.get(name)?.as_bool()
    }

    /// Returns the int32 value of the first field with the given name, or
    /// `None` if it is missing or has another type.
    pub fn get_i32(&self, name: impl AsRef<str>) -> Option<i32> {
        self.get(name)?.as_i32()
    }

    /// Returns the int64 value of the first field with the given name, or
    /// `None` if it is missing or has another type.
    pub fn get_i64(&self, name: impl AsRef<str>) -> Option<i64> {
        self.get(name)?.as_i64()
    }

    /// Returns the ObjectId value of the first field with the given name,
    /// or `None` if it is missing or has another type.
    pub fn get_object_id(&self, name: impl AsRef<str>) -> Option<crate::oid::ObjectId> {
        self.get(name)?.as_object_id()
    }

    /// Returns the datetime value of the first field with the given name,
    /// or `None` if it is missing or has another type.
    pub fn get_datetime(&self, name: impl AsRef<str>) -> Option<crate::DateTime> {
        self.get(name)?.as_datetime()
    }

    /// Whether the document contains a field with the given name.
    pub fn contains_key(&self, name: impl AsRef<str>) -> bool {
        self.get(name).is_some()
    }

    /// An iterator over the fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bson)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// An iterator over the field names in insertion order, with duplicates
    /// preserved.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// An iterator over the field values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Bson> {
        self.fields.iter().map(|(_, v)| v)
    }

    /// Appends a field to the end of the document.
    ///
    /// # Panics
    ///
    /// Panics if the document is frozen.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Bson>) -> &mut Self {
        self.check_frozen();
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Sets the value of the first field with the given name. Does nothing
    /// if there is no such field.
    ///
    /// # Panics
    ///
    /// Panics if the document is frozen.
    pub fn replace(&mut self, name: impl AsRef<str>, value: impl Into<Bson>) {
        self.check_frozen();

        let name = name.as_ref();
        for (k, v) in self.fields.iter_mut() {
            if k.as_str() == name {
                *v = value.into();
                return;
            }
        }
    }

    /// Removes the first field with the given name, returning its value.
    /// Does nothing if there is no such field.
    ///
    /// # Panics
    ///
    /// Panics if the document is frozen.
    pub fn remove(&mut self, name: impl AsRef<str>) -> Option<Bson> {
        self.check_frozen();

        let name = name.as_ref();
        let pos = self.fields.iter().position(|(k, _)| k == name)?;
        Some(self.fields.remove(pos).1)
    }

    /// Returns the name of the first field, or the empty string for an
    /// empty document. For a request document this is the command name.
    pub fn command(&self) -> &str {
        self.fields.first().map(|(k, _)| k.as_str()).unwrap_or("")
    }

    /// Encodes the document into its BSON byte form, allocating the exact
    /// output size up front.
    pub fn encode(&self) -> Result<RawDocument> {
        encode::encode_document(self)
    }

    /// Returns an indented, multi-line rendering of this document.
    pub fn to_indented_string(&self) -> String {
        crate::logging::indented_document_string(self)
    }
}

/// Cloning yields a mutable document even if the source was frozen. Scalar
/// fields and binary payloads are copied; raw composites share their backing
/// buffer with the source.
impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            frozen: false,
        }
    }
}

/// Equality compares the field sequences; two documents with the same pairs
/// in a different order are not equal. The frozen marker does not
/// participate.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::logging::write_compact_document(f, self)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Bson>> FromIterator<(K, V)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.add(k, v);
        }
        doc
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a str, &'a Bson);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Bson)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
