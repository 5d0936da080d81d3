//! A BSON array: an ordered sequence of values.

use std::{cmp::Ordering, fmt};

use crate::{bson::Bson, encode, error::Result, raw::RawArray};

/// A BSON array.
///
/// On the wire an array is a document whose field names are the decimal
/// indices `"0"`, `"1"`, ...; the names are generated on encode and
/// enforced on decode.
///
/// Like [`crate::Document`], an array can be frozen, after which mutating
/// methods panic; a [`Clone`] is mutable again.
#[derive(Default)]
pub struct Array {
    values: Vec<Bson>,
    frozen: bool,
}

impl Array {
    /// Creates a new empty array.
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            frozen: false,
        }
    }

    /// Creates a new empty array with capacity for `n` elements.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            values: Vec::with_capacity(n),
            frozen: false,
        }
    }

    /// The number of elements in the array.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
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
            panic!("array is frozen and can't be modified");
        }
    }

    /// Returns the element at the given index, or `None` if out of bounds.
    pub fn get(&self, index: usize) -> Option<&Bson> {
        self.values.get(index)
    }

    /// An iterator over the elements in order.
    pub fn iter(&self) -> impl Iterator<Item = &Bson> {
        self.values.iter()
    }

    /// Appends an element to the end of the array.
    ///
    /// # Panics
    ///
    /// Panics if the array is frozen.
    pub fn push(&mut self, value: impl Into<Bson>) -> &mut Self {
        self.check_frozen();
        self.values.push(value.into());
        self
    }

    /// Sets the element at the given index.
    ///
    /// # Panics
    ///
    /// Panics if the array is frozen or the index is out of bounds.
    pub fn set(&mut self, index: usize, value: impl Into<Bson>) {
        self.check_frozen();
        self.values[index] = value.into();
    }

    /// Removes and returns the element at the given index.
    ///
    /// # Panics
    ///
    /// Panics if the array is frozen or the index is out of bounds.
    pub fn remove(&mut self, index: usize) -> Bson {
        self.check_frozen();
        self.values.remove(index)
    }

    /// Sorts the elements with the given comparator, which must be able to
    /// order values of different types.
    ///
    /// # Panics
    ///
    /// Panics if the array is frozen.
    pub fn sort_by(&mut self, compare: impl FnMut(&Bson, &Bson) -> Ordering) {
        self.check_frozen();
        self.values.sort_by(compare);
    }

    /// Encodes the array into its BSON byte form, allocating the exact
    /// output size up front.
    pub fn encode(&self) -> Result<RawArray> {
        encode::encode_array(self)
    }

    /// Returns an indented, multi-line rendering of this array.
    pub fn to_indented_string(&self) -> String {
        crate::logging::indented_array_string(self)
    }
}

/// Cloning yields a mutable array even if the source was frozen.
impl Clone for Array {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            frozen: false,
        }
    }
}

/// Equality compares the element sequences; the frozen marker does not
/// participate.
impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::logging::write_compact_array(f, self)
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<V: Into<Bson>> FromIterator<V> for Array {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        let mut arr = Array::new();
        for v in iter {
            arr.push(v);
        }
        arr
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Bson;
    type IntoIter = std::slice::Iter<'a, Bson>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array;

    #[test]
    fn indexed_access_is_bounds_checked() {
        let arr = array![1, 2, 3];
        assert_eq!(arr.get(0), Some(&Bson::Int32(1)));
        assert_eq!(arr.get(3), None);
    }

    #[test]
    fn sort_by_orders_mixed_values() {
        let mut arr = array![3, "b", 1, "a"];
        arr.sort_by(|a, b| match (a, b) {
            (Bson::Int32(x), Bson::Int32(y)) => x.cmp(y),
            (Bson::String(x), Bson::String(y)) => x.cmp(y),
            (Bson::Int32(_), _) => Ordering::Less,
            (_, Bson::Int32(_)) => Ordering::Greater,
            _ => Ordering::Equal,
        });

        assert_eq!(arr, array![1, 3, "a", "b"]);
    }

    #[test]
    #[should_panic(expected = "frozen")]
    fn frozen_array_panics_on_push() {
        let mut arr = array![1];
        arr.freeze();
        arr.push(2);
    }
}
