//! Property tests for the codec's universal invariants: exact sizing,
//! round-tripping in both directions, float bit preservation, and decoder
//! safety on arbitrary input.

use mongowire::{
    size, Binary, Bson, DateTime, Decimal128, Document, RawDocument, Regex, Timestamp,
};
use proptest::prelude::*;

fn arbitrary_bson() -> impl Strategy<Value = Bson> {
    let leaf = prop_oneof![
        Just(Bson::Null),
        any::<bool>().prop_map(Bson::Boolean),
        any::<i32>().prop_map(Bson::Int32),
        any::<i64>().prop_map(Bson::Int64),
        // arbitrary bits, not arbitrary floats: NaN payloads included
        any::<u64>().prop_map(|bits| Bson::Double(f64::from_bits(bits))),
        any::<String>().prop_map(Bson::String),
        (any::<u8>(), prop::collection::vec(any::<u8>(), 0..24)).prop_map(|(subtype, bytes)| {
            Bson::Binary(Binary {
                subtype: subtype.into(),
                bytes,
            })
        }),
        any::<[u8; 12]>().prop_map(|b| Bson::ObjectId(mongowire::oid::ObjectId::from_bytes(b))),
        any::<i64>().prop_map(|ms| Bson::DateTime(DateTime::from_millis(ms))),
        ("[^\0]{0,8}", "[a-z]{0,4}").prop_map(|(pattern, options)| {
            Bson::RegularExpression(Regex { pattern, options })
        }),
        (any::<u32>(), any::<u32>()).prop_map(|(time, increment)| {
            Bson::Timestamp(Timestamp { time, increment })
        }),
        (any::<u64>(), any::<u64>())
            .prop_map(|(high, low)| Bson::Decimal128(Decimal128::from_bits(high, low))),
    ];

    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(("[^\0]{0,8}", inner.clone()), 0..6)
                .prop_map(|fields| Bson::Document(fields.into_iter().collect())),
            prop::collection::vec(inner, 0..6)
                .prop_map(|values| Bson::Array(values.into_iter().collect())),
        ]
    })
}

fn arbitrary_document() -> impl Strategy<Value = Document> {
    prop::collection::vec(("[^\0]{0,8}", arbitrary_bson()), 0..8)
        .prop_map(|fields| fields.into_iter().collect())
}

proptest! {
    #[test]
    fn round_trips_in_both_directions(doc in arbitrary_document()) {
        let raw = doc.encode().expect("encode");

        // size exactness
        prop_assert_eq!(size(&Bson::Document(doc.clone())), raw.len());

        // value -> bytes -> value
        let deep = raw.decode_deep().expect("deep decode");
        prop_assert_eq!(&deep, &doc);

        let shallow = raw.decode().expect("shallow decode");
        prop_assert_eq!(&shallow, &doc);

        // bytes -> value -> bytes, for both decode depths
        prop_assert_eq!(deep.encode().expect("re-encode"), raw.clone());
        prop_assert_eq!(shallow.encode().expect("re-encode"), raw);
    }

    #[test]
    fn float_bits_survive(bits in any::<u64>()) {
        let mut doc = Document::new();
        doc.add("f", Bson::Double(f64::from_bits(bits)));

        let decoded = doc.encode().expect("encode").decode().expect("decode");
        match decoded.get("f") {
            Some(Bson::Double(v)) => prop_assert_eq!(v.to_bits(), bits),
            other => prop_assert!(false, "expected a double, got {:?}", other),
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(raw) = RawDocument::from_bytes(bytes) {
            let _ = raw.decode();
            let _ = raw.decode_deep();
        }
    }

    #[test]
    fn corrupted_documents_never_panic(
        doc in arbitrary_document(),
        index in any::<prop::sample::Index>(),
        byte in any::<u8>(),
    ) {
        let mut bytes = doc.encode().expect("encode").as_bytes().to_vec();
        let i = index.index(bytes.len());
        bytes[i] = byte;

        if let Ok(raw) = RawDocument::from_bytes(bytes) {
            let _ = raw.decode();
            let _ = raw.decode_deep();
        }
    }
}
