/// Constructs a [`Document`](crate::Document) from field/value pairs.
///
/// Values are anything convertible to [`Bson`](crate::Bson); nested
/// composites are built with `doc!` / [`array!`] again. Duplicate keys are
/// kept, in order.
///
/// ```
/// use mongowire::{doc, array};
///
/// let filter = doc! {
///     "find": "inventory",
///     "filter": doc! { "qty": 5, "tags": array!["a", "b"] },
/// };
/// assert_eq!(filter.command(), "find");
/// ```
#[macro_export]
macro_rules! doc {
    () => { $crate::Document::new() };

    ( $($key:tt : $value:expr),+ $(,)? ) => {{
        let mut document = $crate::Document::new();
        $(
            document.add($key, $value);
        )+
        document
    }};
}

/// Constructs an [`Array`](crate::Array) from a list of values convertible
/// to [`Bson`](crate::Bson).
///
/// ```
/// use mongowire::array;
///
/// let tags = array!["red", "blank"];
/// assert_eq!(tags.len(), 2);
/// ```
#[macro_export]
macro_rules! array {
    () => { $crate::Array::new() };

    ( $($value:expr),+ $(,)? ) => {{
        let mut array = $crate::Array::new();
        $(
            array.push($value);
        )+
        array
    }};
}

/// Converts a single expression to a [`Bson`](crate::Bson) value.
///
/// ```
/// use mongowire::{bson, Bson};
///
/// assert_eq!(bson!(42), Bson::Int32(42));
/// assert_eq!(bson!(null), Bson::Null);
/// ```
#[macro_export]
macro_rules! bson {
    (null) => { $crate::Bson::Null };

    ( $value:expr ) => { $crate::Bson::from($value) };
}
