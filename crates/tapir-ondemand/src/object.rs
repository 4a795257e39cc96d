// SPDX-License-Identifier: MIT OR Apache-2.0
//! Object iteration and lookup
//!
//! Objects support pull-model field iteration plus two lookup modes:
//! ordered lookup scans forward only, unordered lookup scans forward to the
//! closing brace and then wraps once to the container start. Keys are
//! compared in their raw form, escapes intact, the way they appear in the
//! document.

use crate::document::Document;
use crate::value::Value;
use tapir_core::{ErrorKind, Result};

/// One object field: the raw key text and the lazy value.
#[derive(Debug)]
pub struct Field<'c, 'a> {
    /// Key bytes exactly as written, without the quotes, escapes intact.
    pub key: &'a str,
    /// The field's value, not yet parsed.
    pub value: Value<'c, 'a>,
}

/// An object being iterated; created by
/// [`Value::get_object`](crate::value::Value::get_object).
#[derive(Debug)]
pub struct Object<'c, 'a> {
    doc: &'c Document<'a>,
    container_depth: u32,
    /// Token position of the first field (just after the `{`), the anchor
    /// for unordered lookup's wrap-around.
    start_pos: usize,
    at_start: bool,
    done: bool,
    pending_value: Option<usize>,
}

impl<'c, 'a> Object<'c, 'a> {
    pub(crate) fn new(doc: &'c Document<'a>, container_depth: u32) -> Self {
        Self {
            doc,
            container_depth,
            start_pos: doc.pos.get(),
            at_start: true,
            done: false,
            pending_value: None,
        }
    }

    fn settle(&mut self) -> Result<()> {
        if let Some(pending) = self.pending_value.take() {
            if self.doc.pos.get() == pending {
                self.doc.skip_one_value()?;
            } else {
                self.doc.skip_to_depth(self.container_depth)?;
            }
        }
        Ok(())
    }

    /// Position the cursor on the next key, or consume the close brace.
    /// Returns the key's byte offset, or `None` at the end of the object.
    fn advance_to_key(&mut self) -> Result<Option<usize>> {
        self.settle()?;
        let offset = self.doc.peek_token()?;
        if self.at_start {
            self.at_start = false;
            if self.doc.byte_at(offset) == b'}' {
                self.doc.next_token()?;
                self.done = true;
                return Ok(None);
            }
        } else {
            match self.doc.byte_at(offset) {
                b',' => {
                    self.doc.next_token()?;
                }
                b'}' => {
                    self.doc.next_token()?;
                    self.done = true;
                    return Ok(None);
                }
                _ => return Err(ErrorKind::TapeError),
            }
        }
        let key_offset = self.doc.peek_token()?;
        if self.doc.byte_at(key_offset) != b'"' {
            return Err(ErrorKind::TapeError);
        }
        Ok(Some(key_offset))
    }

    /// Consume the key and its colon, yielding the value handle.
    fn enter_value(&mut self) -> Result<Value<'c, 'a>> {
        self.doc.next_token()?; // the key
        let colon = self.doc.next_token()?;
        if self.doc.byte_at(colon) != b':' {
            return Err(ErrorKind::TapeError);
        }
        let pos = self.doc.pos.get();
        self.pending_value = Some(pos);
        Ok(Value::new(self.doc, pos, self.container_depth))
    }

    /// Raw key text between the quotes at `offset`, escapes intact.
    fn raw_key(&self, offset: usize) -> &'a [u8] {
        let bytes = self.doc.input.padded();
        let mut p = offset + 1;
        while p < bytes.len() {
            match bytes[p] {
                b'"' => return &bytes[offset + 1..p],
                b'\\' => p += 2,
                _ => p += 1,
            }
        }
        &[]
    }

    /// Read the next field, `None` at the closing brace.
    fn next_field(&mut self) -> Result<Option<Field<'c, 'a>>> {
        let Some(key_offset) = self.advance_to_key()? else {
            return Ok(None);
        };
        let key =
            std::str::from_utf8(self.raw_key(key_offset)).map_err(|_| ErrorKind::Utf8Error)?;
        let value = self.enter_value()?;
        Ok(Some(Field { key, value }))
    }

    /// Ordered lookup: scan forward from the current position only.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NoSuchField`] when no remaining field matches; sticky
    /// errors and grammar errors as usual.
    pub fn find_field(&mut self, key: &str) -> Result<Value<'c, 'a>> {
        if let Some(error) = self.doc.error.get() {
            return Err(error);
        }
        while !self.done {
            let Some(key_offset) = self
                .advance_to_key()
                .map_err(|e| self.doc.latch(e))?
            else {
                break;
            };
            let found = self.raw_key(key_offset) == key.as_bytes();
            let value = self.enter_value().map_err(|e| self.doc.latch(e))?;
            if found {
                return Ok(value);
            }
        }
        Err(ErrorKind::NoSuchField)
    }

    /// Unordered lookup: scan forward to the end of the object, then wrap
    /// once from the first field up to where the search began.
    ///
    /// # Errors
    ///
    /// As [`Object::find_field`].
    pub fn find_field_unordered(&mut self, key: &str) -> Result<Value<'c, 'a>> {
        if let Some(error) = self.doc.error.get() {
            return Err(error);
        }
        let search_start = self.doc.pos.get();
        let search_at_start = self.at_start;
        // Forward phase.
        while !self.done {
            let Some(key_offset) = self
                .advance_to_key()
                .map_err(|e| self.doc.latch(e))?
            else {
                break;
            };
            let found = self.raw_key(key_offset) == key.as_bytes();
            let value = self.enter_value().map_err(|e| self.doc.latch(e))?;
            if found {
                return Ok(value);
            }
        }
        if search_at_start && search_start == self.start_pos {
            // The whole object was scanned; nothing to wrap over.
            return Err(ErrorKind::NoSuchField);
        }
        // Wrap phase: rewind to the first field and scan up to the point
        // where the search began.
        self.doc
            .rewind_to(self.start_pos, self.container_depth);
        self.at_start = true;
        self.done = false;
        self.pending_value = None;
        while self.doc.pos.get() < search_start {
            let Some(key_offset) = self
                .advance_to_key()
                .map_err(|e| self.doc.latch(e))?
            else {
                break;
            };
            if self.doc.pos.get() > search_start {
                break;
            }
            let found = self.raw_key(key_offset) == key.as_bytes();
            let value = self.enter_value().map_err(|e| self.doc.latch(e))?;
            if found {
                return Ok(value);
            }
        }
        Err(ErrorKind::NoSuchField)
    }
}

impl<'c, 'a> Iterator for Object<'c, 'a> {
    type Item = Result<Field<'c, 'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(error) = self.doc.error.get() {
            self.done = true;
            return Some(Err(error));
        }
        match self.next_field() {
            Ok(Some(field)) => Some(Ok(field)),
            Ok(None) => None,
            Err(error) => {
                self.done = true;
                Some(Err(self.doc.latch(error)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::document::OndemandParser;
    use tapir_core::{ErrorKind, PaddedBuffer};

    #[test]
    fn test_field_iteration_in_order() {
        let buf = PaddedBuffer::from_str(r#"{"a":1,"b":2,"c/d":3}"#).unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let mut keys = Vec::new();
        let mut values = Vec::new();
        for field in doc.root().get_object().unwrap() {
            let field = field.unwrap();
            keys.push(field.key.to_string());
            values.push(field.value.get_u64().unwrap());
        }
        assert_eq!(keys, vec!["a", "b", "c/d"]);
        assert_eq!(values, vec![1, 2, 3]);
        doc.finish().unwrap();
    }

    #[test]
    fn test_ordered_lookup() {
        let buf = PaddedBuffer::from_str(r#"{"a":1,"b":2,"c":3}"#).unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let mut object = doc.root().get_object().unwrap();
        assert_eq!(object.find_field("b").unwrap().get_u64(), Ok(2));
        // Ordered lookup cannot go back.
        assert_eq!(
            object.find_field("a").unwrap_err(),
            ErrorKind::NoSuchField
        );
        assert_eq!(object.find_field("c").unwrap().get_u64(), Ok(3));
    }

    #[test]
    fn test_unordered_lookup_wraps() {
        let buf = PaddedBuffer::from_str(r#"{"a":1,"b":2,"c":3}"#).unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let mut object = doc.root().get_object().unwrap();
        assert_eq!(object.find_field_unordered("b").unwrap().get_u64(), Ok(2));
        assert_eq!(object.find_field_unordered("a").unwrap().get_u64(), Ok(1));
        assert_eq!(object.find_field_unordered("c").unwrap().get_u64(), Ok(3));
        assert_eq!(
            object.find_field_unordered("nope").unwrap_err(),
            ErrorKind::NoSuchField
        );
    }

    #[test]
    fn test_missing_field_is_not_fatal() {
        let buf = PaddedBuffer::from_str(r#"{"a":1}"#).unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let mut object = doc.root().get_object().unwrap();
        assert_eq!(
            object.find_field_unordered("d").unwrap_err(),
            ErrorKind::NoSuchField
        );
        assert_eq!(object.find_field_unordered("a").unwrap().get_u64(), Ok(1));
    }

    #[test]
    fn test_nested_path_scenario() {
        let buf = PaddedBuffer::from_str(r#"{"x":{"y":{"z":2}}}"#).unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let z = doc
            .root()
            .at_key("x")
            .unwrap()
            .at_key("y")
            .unwrap()
            .at_key("z")
            .unwrap();
        assert_eq!(z.get_u64(), Ok(2));
        doc.finish().unwrap();
        assert_eq!(doc.current_depth(), 0);
    }

    #[test]
    fn test_lookup_skips_container_values() {
        let buf =
            PaddedBuffer::from_str(r#"{"skip":{"deep":[1,2,{"x":3}]},"hit":true}"#).unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let mut object = doc.root().get_object().unwrap();
        assert_eq!(object.find_field("hit").unwrap().get_bool(), Ok(true));
    }

    #[test]
    fn test_grammar_error_in_object_latches() {
        let buf = PaddedBuffer::from_str(r#"{"a" 1}"#).unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let mut fields = doc.root().get_object().unwrap();
        let first = fields.next().unwrap();
        assert_eq!(first.unwrap_err(), ErrorKind::TapeError);
        assert!(fields.next().is_none());
    }

    #[test]
    fn test_escaped_key_matches_raw_form() {
        let buf = PaddedBuffer::from_str(r#"{"c\/d":1}"#).unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let mut object = doc.root().get_object().unwrap();
        // Keys compare raw: the escaped form matches itself, not the
        // decoded text.
        assert_eq!(
            object.find_field_unordered(r"c\/d").unwrap().get_u64(),
            Ok(1)
        );
    }
}
