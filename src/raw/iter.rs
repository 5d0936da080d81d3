use crate::{
    bson::Bson,
    decode::{decode_cstring_ref, decode_value, DecodeMode},
    error::{Error, Result},
    raw::RawDocument,
};

/// An iterator over the fields of a [`RawDocument`].
///
/// Fields are parsed as the iterator advances, so a malformed document
/// surfaces as an `Err` item at the offending field; after an error every
/// subsequent call returns `None`. Field names borrow from the document,
/// and nested composites are yielded as raw subslices of it.
pub struct Iter<'a> {
    doc: &'a RawDocument,
    offset: usize,

    /// Cleared once an error has been yielded.
    valid: bool,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(doc: &'a RawDocument) -> Self {
        Self {
            doc,
            offset: 4,
            valid: true,
        }
    }
}

fn parse_field(doc: &RawDocument, offset: usize, tag: u8) -> Result<(&str, Bson, usize)> {
    let bytes = doc.as_bytes();

    let (name, name_len) = decode_cstring_ref(&bytes[offset + 1..])?;
    let value_offset = offset + 1 + name_len;

    let (value, consumed) = decode_value(doc.bytes(), value_offset, tag, DecodeMode::Shallow)
        .map_err(|e| e.with_key(name))?;

    Ok((name, value, value_offset + consumed))
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<(&'a str, Bson)>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.valid {
            return None;
        }

        let bytes = self.doc.as_bytes();

        if self.offset + 1 == bytes.len() {
            // the framing check guarantees the final byte is the terminator
            return None;
        }
        if self.offset + 1 > bytes.len() {
            self.valid = false;
            return Some(Err(Error::invalid_input("iteration overran the document")));
        }

        let tag = bytes[self.offset];
        if tag == 0 {
            self.valid = false;
            return Some(Err(Error::invalid_input(format!(
                "terminator at offset {} of a {}-byte document",
                self.offset,
                bytes.len()
            ))));
        }

        match parse_field(self.doc, self.offset, tag) {
            Ok((name, value, next_offset)) => {
                self.offset = next_offset;
                Some(Ok((name, value)))
            }
            Err(e) => {
                self.valid = false;
                Some(Err(e))
            }
        }
    }
}

impl<'a> IntoIterator for &'a RawDocument {
    type Item = Result<(&'a str, Bson)>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        Iter::new(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::{array, doc, Bson, RawDocument};

    #[test]
    fn yields_fields_in_order() {
        let raw = doc! { "a": 1, "b": "two", "a": true }.encode().expect("encode");

        let fields: Vec<_> = raw.iter().collect::<crate::Result<_>>().expect("iterate");
        assert_eq!(
            fields,
            vec![
                ("a", Bson::Int32(1)),
                ("b", Bson::String("two".into())),
                ("a", Bson::Boolean(true)),
            ]
        );
    }

    #[test]
    fn nested_composites_stay_raw() {
        let raw = doc! { "sub": doc! { "x": 1 }, "arr": array![1] }
            .encode()
            .expect("encode");

        for item in &raw {
            let (_, value) = item.expect("field");
            assert!(matches!(
                value,
                Bson::RawDocument(_) | Bson::RawArray(_)
            ));
        }
    }

    #[test]
    fn lazy_lookup_finds_the_first_occurrence() {
        let raw = doc! { "a": 1, "a": 2 }.encode().expect("encode");
        assert_eq!(raw.get("a").expect("lookup"), Some(Bson::Int32(1)));
        assert_eq!(raw.get("missing").expect("lookup"), None);
    }

    #[test]
    fn malformed_field_stops_iteration() {
        // {"f": <bool 0x02>} — framing is valid, the field is not
        let raw =
            RawDocument::from_bytes(b"\x09\x00\x00\x00\x08f\x00\x02\x00".to_vec()).expect("framing");

        let mut iter = raw.iter();
        assert!(iter.next().expect("item").is_err());
        assert!(iter.next().is_none());
    }
}
