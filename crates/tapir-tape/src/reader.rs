// SPDX-License-Identifier: MIT OR Apache-2.0
//! DOM views over a finished tape
//!
//! Read-only, random-access navigation bound to a [`TapeDocument`].
//! Skipping a whole container is O(1) through the close index stored in its
//! open word; object key lookup is a linear scan. String accessors borrow
//! from the document's string buffer without copying.

use crate::tape::{COUNT_SATURATED, TapeDocument, TapeTag, payload};
use tapir_core::{ErrorKind, Result};

/// The JSON type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// `{...}`
    Object,
    /// `[...]`
    Array,
    /// A string literal.
    String,
    /// A signed 64-bit integer.
    Int64,
    /// An unsigned 64-bit integer (beyond `i64::MAX`).
    Uint64,
    /// A binary64 float.
    Double,
    /// `true` or `false`.
    Bool,
    /// `null`.
    Null,
}

impl TapeDocument {
    /// The document's root value.
    ///
    /// # Panics
    ///
    /// Panics if called on a default-constructed (empty) document; parses
    /// never produce one.
    #[must_use]
    pub fn root(&self) -> DomValue<'_> {
        assert!(self.tape.len() >= 3, "empty tape has no root");
        DomValue {
            doc: self,
            index: 1,
        }
    }

    fn tag_at(&self, index: usize) -> TapeTag {
        TapeTag::of(self.tape[index]).unwrap_or(TapeTag::Root)
    }
}

/// One value on the tape.
#[derive(Debug, Clone, Copy)]
pub struct DomValue<'d> {
    doc: &'d TapeDocument,
    index: usize,
}

impl<'d> DomValue<'d> {
    /// The type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self.doc.tag_at(self.index) {
            TapeTag::StartObject => ValueType::Object,
            TapeTag::StartArray => ValueType::Array,
            TapeTag::String => ValueType::String,
            TapeTag::Int64 => ValueType::Int64,
            TapeTag::Uint64 => ValueType::Uint64,
            TapeTag::Double => ValueType::Double,
            TapeTag::True | TapeTag::False => ValueType::Bool,
            _ => ValueType::Null,
        }
    }

    /// Whether this value is `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.doc.tag_at(self.index) == TapeTag::Null
    }

    /// Read a boolean.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::IncorrectType`] unless the value is `true` or `false`.
    pub fn get_bool(&self) -> Result<bool> {
        match self.doc.tag_at(self.index) {
            TapeTag::True => Ok(true),
            TapeTag::False => Ok(false),
            _ => Err(ErrorKind::IncorrectType),
        }
    }

    /// Read a signed integer. An unsigned value in signed range converts.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::IncorrectType`] for non-integers and for unsigned
    /// values beyond `i64::MAX`.
    pub fn get_i64(&self) -> Result<i64> {
        let raw = self.raw_value_word()?;
        match self.doc.tag_at(self.index) {
            TapeTag::Int64 => Ok(raw as i64),
            TapeTag::Uint64 if raw <= i64::MAX as u64 => Ok(raw as i64),
            _ => Err(ErrorKind::IncorrectType),
        }
    }

    /// Read an unsigned integer. A non-negative signed value converts.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::IncorrectType`] for non-integers and negative values.
    pub fn get_u64(&self) -> Result<u64> {
        let raw = self.raw_value_word()?;
        match self.doc.tag_at(self.index) {
            TapeTag::Uint64 => Ok(raw),
            TapeTag::Int64 if (raw as i64) >= 0 => Ok(raw),
            _ => Err(ErrorKind::IncorrectType),
        }
    }

    /// Read a float. Integer values convert.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::IncorrectType`] for non-numbers.
    pub fn get_f64(&self) -> Result<f64> {
        let raw = self.raw_value_word()?;
        match self.doc.tag_at(self.index) {
            TapeTag::Double => Ok(f64::from_bits(raw)),
            TapeTag::Int64 => Ok(raw as i64 as f64),
            TapeTag::Uint64 => Ok(raw as f64),
            _ => Err(ErrorKind::IncorrectType),
        }
    }

    /// Borrow a string value from the string buffer.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::IncorrectType`] for non-strings.
    pub fn get_string(&self) -> Result<&'d str> {
        if self.doc.tag_at(self.index) != TapeTag::String {
            return Err(ErrorKind::IncorrectType);
        }
        let offset = payload(self.doc.tape[self.index]) as usize;
        let strings = &self.doc.strings;
        let len_bytes: [u8; 4] = strings[offset..offset + 4]
            .try_into()
            .map_err(|_| ErrorKind::IncorrectType)?;
        let len = u32::from_le_bytes(len_bytes) as usize;
        let body = &strings[offset + 4..offset + 4 + len];
        std::str::from_utf8(body).map_err(|_| ErrorKind::Utf8Error)
    }

    /// View this value as an array.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::IncorrectType`] for non-arrays.
    pub fn get_array(&self) -> Result<DomArray<'d>> {
        if self.doc.tag_at(self.index) != TapeTag::StartArray {
            return Err(ErrorKind::IncorrectType);
        }
        Ok(DomArray {
            doc: self.doc,
            open: self.index,
        })
    }

    /// View this value as an object.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::IncorrectType`] for non-objects.
    pub fn get_object(&self) -> Result<DomObject<'d>> {
        if self.doc.tag_at(self.index) != TapeTag::StartObject {
            return Err(ErrorKind::IncorrectType);
        }
        Ok(DomObject {
            doc: self.doc,
            open: self.index,
        })
    }

    /// Tape index just past this value, jumping whole containers in O(1).
    fn after(&self) -> usize {
        match self.doc.tag_at(self.index) {
            TapeTag::StartObject | TapeTag::StartArray => {
                (payload(self.doc.tape[self.index]) & 0xFFFF_FFFF) as usize + 1
            }
            TapeTag::Int64 | TapeTag::Uint64 | TapeTag::Double => self.index + 2,
            _ => self.index + 1,
        }
    }

    fn raw_value_word(&self) -> Result<u64> {
        match self.doc.tag_at(self.index) {
            TapeTag::Int64 | TapeTag::Uint64 | TapeTag::Double => {
                Ok(self.doc.tape[self.index + 1])
            }
            _ => Err(ErrorKind::IncorrectType),
        }
    }
}

/// An array on the tape.
#[derive(Debug, Clone, Copy)]
pub struct DomArray<'d> {
    doc: &'d TapeDocument,
    open: usize,
}

impl<'d> DomArray<'d> {
    /// Number of elements, saturated at `0xFF_FFFF`.
    #[must_use]
    pub fn len(&self) -> usize {
        ((payload(self.doc.tape[self.open]) >> 32) & COUNT_SATURATED) as usize
    }

    /// Whether the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the elements in order.
    #[must_use]
    pub fn iter(&self) -> DomArrayIter<'d> {
        DomArrayIter {
            doc: self.doc,
            cursor: self.open + 1,
            end: (payload(self.doc.tape[self.open]) & 0xFFFF_FFFF) as usize,
        }
    }

    /// The element at `index`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::IndexOutOfBounds`] past the last element.
    pub fn at(&self, index: usize) -> Result<DomValue<'d>> {
        self.iter()
            .nth(index)
            .ok_or(ErrorKind::IndexOutOfBounds)
    }
}

impl<'d> IntoIterator for &DomArray<'d> {
    type Item = DomValue<'d>;
    type IntoIter = DomArrayIter<'d>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over array elements.
#[derive(Debug, Clone)]
pub struct DomArrayIter<'d> {
    doc: &'d TapeDocument,
    cursor: usize,
    end: usize,
}

impl<'d> Iterator for DomArrayIter<'d> {
    type Item = DomValue<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.end {
            return None;
        }
        let value = DomValue {
            doc: self.doc,
            index: self.cursor,
        };
        self.cursor = value.after();
        Some(value)
    }
}

/// An object on the tape.
#[derive(Debug, Clone, Copy)]
pub struct DomObject<'d> {
    doc: &'d TapeDocument,
    open: usize,
}

impl<'d> DomObject<'d> {
    /// Number of key/value pairs, saturated at `0xFF_FFFF`.
    #[must_use]
    pub fn len(&self) -> usize {
        ((payload(self.doc.tape[self.open]) >> 32) & COUNT_SATURATED) as usize
    }

    /// Whether the object has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the fields in document order.
    #[must_use]
    pub fn iter(&self) -> DomObjectIter<'d> {
        DomObjectIter {
            doc: self.doc,
            cursor: self.open + 1,
            end: (payload(self.doc.tape[self.open]) & 0xFFFF_FFFF) as usize,
        }
    }

    /// Look up a field by key with a linear scan in document order.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NoSuchField`] when no key matches.
    pub fn at(&self, key: &str) -> Result<DomValue<'d>> {
        for (field_key, value) in self.iter() {
            if field_key == Ok(key) {
                return Ok(value);
            }
        }
        Err(ErrorKind::NoSuchField)
    }
}

impl<'d> IntoIterator for &DomObject<'d> {
    type Item = (Result<&'d str>, DomValue<'d>);
    type IntoIter = DomObjectIter<'d>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over object fields as `(key, value)` pairs.
#[derive(Debug, Clone)]
pub struct DomObjectIter<'d> {
    doc: &'d TapeDocument,
    cursor: usize,
    end: usize,
}

impl<'d> Iterator for DomObjectIter<'d> {
    type Item = (Result<&'d str>, DomValue<'d>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.end {
            return None;
        }
        let key = DomValue {
            doc: self.doc,
            index: self.cursor,
        };
        let value = DomValue {
            doc: self.doc,
            index: self.cursor + 1,
        };
        self.cursor = value.after();
        Some((key.get_string(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_tape;
    use tapir_core::{PaddedBuffer, ParserConfig};
    use tapir_simd::build_structural_index;

    fn parse(text: &str) -> TapeDocument {
        let config = ParserConfig::default();
        let buf = PaddedBuffer::from_str(text).unwrap();
        let structurals = build_structural_index(buf.as_padded(), &config).unwrap();
        build_tape(buf.as_padded(), &structurals, &config).unwrap()
    }

    #[test]
    fn test_minimal_root_value() {
        let doc = parse("true");
        let root = doc.root();
        assert_eq!(root.value_type(), ValueType::Bool);
        assert!(!root.is_null());
        assert_eq!(root.get_bool(), Ok(true));
        assert_eq!(root.get_i64().unwrap_err(), ErrorKind::IncorrectType);
    }

    #[test]
    fn test_small_object_scenario() {
        let doc = parse(r#"{"a":1,"b":2,"c/d":3}"#);
        let object = doc.root().get_object().unwrap();
        assert_eq!(object.len(), 3);
        let keys: Vec<&str> = object.iter().map(|(k, _)| k.unwrap()).collect();
        assert_eq!(keys, vec!["a", "b", "c/d"]);
        let values: Vec<u64> = object.iter().map(|(_, v)| v.get_u64().unwrap()).collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(object.at("c/d").unwrap().get_u64(), Ok(3));
        assert_eq!(object.at("d").unwrap_err(), ErrorKind::NoSuchField);
    }

    #[test]
    fn test_nested_lookup() {
        let doc = parse(r#"{"x":{"y":{"z":2}}}"#);
        let z = doc
            .root()
            .get_object()
            .unwrap()
            .at("x")
            .unwrap()
            .get_object()
            .unwrap()
            .at("y")
            .unwrap()
            .get_object()
            .unwrap()
            .at("z")
            .unwrap();
        assert_eq!(z.get_u64(), Ok(2));
    }

    #[test]
    fn test_array_access_and_skip() {
        let doc = parse(r#"[1, {"deep": [true, null]}, "tail", 2.5]"#);
        let array = doc.root().get_array().unwrap();
        assert_eq!(array.len(), 4);
        // Skipping the object in the middle lands on the string.
        assert_eq!(array.at(2).unwrap().get_string(), Ok("tail"));
        assert_eq!(array.at(3).unwrap().get_f64(), Ok(2.5));
        assert_eq!(array.at(4).unwrap_err(), ErrorKind::IndexOutOfBounds);
        let types: Vec<ValueType> = array.iter().map(|v| v.value_type()).collect();
        assert_eq!(
            types,
            vec![
                ValueType::Int64,
                ValueType::Object,
                ValueType::String,
                ValueType::Double
            ]
        );
    }

    #[test]
    fn test_numeric_cross_typing() {
        let doc = parse(r#"[1, -1, 18446744073709551615, 2.5]"#);
        let array = doc.root().get_array().unwrap();
        assert_eq!(array.at(0).unwrap().get_u64(), Ok(1));
        assert_eq!(array.at(0).unwrap().get_i64(), Ok(1));
        assert_eq!(array.at(0).unwrap().get_f64(), Ok(1.0));
        assert_eq!(
            array.at(1).unwrap().get_u64().unwrap_err(),
            ErrorKind::IncorrectType
        );
        assert_eq!(array.at(1).unwrap().get_i64(), Ok(-1));
        let big = array.at(2).unwrap();
        assert_eq!(big.value_type(), ValueType::Uint64);
        assert_eq!(big.get_u64(), Ok(u64::MAX));
        assert_eq!(big.get_i64().unwrap_err(), ErrorKind::IncorrectType);
        assert_eq!(
            array.at(3).unwrap().get_bool().unwrap_err(),
            ErrorKind::IncorrectType
        );
    }

    #[test]
    fn test_string_views_borrow_from_document() {
        let doc = parse(r#"{"greeting": "hello\nworld"}"#);
        let object = doc.root().get_object().unwrap();
        let view = object.at("greeting").unwrap().get_string().unwrap();
        assert_eq!(view, "hello\nworld");
    }

    #[test]
    fn test_mismatched_access_does_not_corrupt() {
        let doc = parse(r#"{"a": [1]}"#);
        let root = doc.root();
        assert_eq!(root.get_array().unwrap_err(), ErrorKind::IncorrectType);
        // The same handle still works after a failed access.
        let object = root.get_object().unwrap();
        assert_eq!(object.at("a").unwrap().get_array().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_containers() {
        let doc = parse(r#"{"a": {}, "b": []}"#);
        let object = doc.root().get_object().unwrap();
        assert!(object.at("a").unwrap().get_object().unwrap().is_empty());
        assert!(object.at("b").unwrap().get_array().unwrap().is_empty());
        assert_eq!(
            object.at("b").unwrap().get_array().unwrap().at(0).unwrap_err(),
            ErrorKind::IndexOutOfBounds
        );
    }
}
