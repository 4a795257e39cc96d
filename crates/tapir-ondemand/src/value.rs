// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lazy value handles
//!
//! A [`Value`] remembers the token position where a value begins and the
//! depth it lives at. Nothing is parsed until a typed bind: numbers and
//! atoms go through the stage-2 scalar parsers, strings are unescaped into
//! a fresh allocation. Each value may be bound once, in document order;
//! binds at a stale cursor position report `OutOfOrderIteration`.

use crate::array::Array;
use crate::document::Document;
use crate::object::Object;
use tapir_core::{ErrorKind, Result};
use tapir_simd::classify::is_structural_or_whitespace;
use tapir_tape::number::{ParsedNumber, parse_number};
use tapir_tape::string_parse::parse_string_into;

/// A lazily parsed value.
#[derive(Debug, Clone, Copy)]
pub struct Value<'c, 'a> {
    doc: &'c Document<'a>,
    token_pos: usize,
    depth: u32,
}

impl<'c, 'a> Value<'c, 'a> {
    pub(crate) const fn new(doc: &'c Document<'a>, token_pos: usize, depth: u32) -> Self {
        Self {
            doc,
            token_pos,
            depth,
        }
    }

    /// Guard every bind: propagate a latched error, then verify the
    /// cursor still sits on this value.
    fn check_bind(&self) -> Result<usize> {
        if let Some(error) = self.doc.error.get() {
            return Err(error);
        }
        if self.doc.pos.get() != self.token_pos {
            return Err(ErrorKind::OutOfOrderIteration);
        }
        self.doc.peek_token().map_err(|e| self.doc.latch(e))
    }

    const fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Whether this value is the atom `null`. Peeks without consuming, so
    /// a `false` answer leaves the value bindable.
    ///
    /// # Errors
    ///
    /// A latched error, or `OutOfOrderIteration` at a stale cursor.
    pub fn is_null(&self) -> Result<bool> {
        let offset = self.check_bind()?;
        if self.doc.byte_at(offset) != b'n' {
            return Ok(false);
        }
        self.check_atom(offset, b"null").map(|()| true)
    }

    /// Bind a boolean.
    ///
    /// # Errors
    ///
    /// `IncorrectType` when the value is not `true`/`false`; atom errors
    /// for mangled atoms.
    pub fn get_bool(&self) -> Result<bool> {
        let offset = self.check_bind()?;
        let result = match self.doc.byte_at(offset) {
            b't' => {
                self.check_atom(offset, b"true")?;
                true
            }
            b'f' => {
                self.check_atom(offset, b"false")?;
                false
            }
            _ => return Err(ErrorKind::IncorrectType),
        };
        self.consume_scalar()?;
        Ok(result)
    }

    /// Bind an unsigned integer.
    ///
    /// # Errors
    ///
    /// `IncorrectType` for non-integers and negative values (the cursor is
    /// left intact so another bind can be tried); `NumberError` for
    /// malformed numbers.
    pub fn get_u64(&self) -> Result<u64> {
        match self.parse_scalar_number()? {
            ParsedNumber::U64(value) => {
                self.consume_scalar()?;
                Ok(value)
            }
            ParsedNumber::I64(value) if value >= 0 => {
                self.consume_scalar()?;
                Ok(value as u64)
            }
            _ => Err(ErrorKind::IncorrectType),
        }
    }

    /// Bind a signed integer.
    ///
    /// # Errors
    ///
    /// As [`Value::get_u64`], with unsigned values beyond `i64::MAX`
    /// reported as `IncorrectType`.
    pub fn get_i64(&self) -> Result<i64> {
        match self.parse_scalar_number()? {
            ParsedNumber::I64(value) => {
                self.consume_scalar()?;
                Ok(value)
            }
            ParsedNumber::U64(value) if value <= i64::MAX as u64 => {
                self.consume_scalar()?;
                Ok(value as i64)
            }
            _ => Err(ErrorKind::IncorrectType),
        }
    }

    /// Bind a float. Integer values convert.
    ///
    /// # Errors
    ///
    /// `IncorrectType` for non-numbers; `NumberError` for malformed ones.
    pub fn get_f64(&self) -> Result<f64> {
        let value = match self.parse_scalar_number()? {
            ParsedNumber::F64(value) => value,
            ParsedNumber::I64(value) => value as f64,
            ParsedNumber::U64(value) => value as f64,
        };
        self.consume_scalar()?;
        Ok(value)
    }

    /// Bind a string into a fresh allocation, escapes decoded.
    ///
    /// # Errors
    ///
    /// `IncorrectType` for non-strings; `StringError` for bad escapes.
    pub fn get_string(&self) -> Result<String> {
        let offset = self.check_bind()?;
        if self.doc.byte_at(offset) != b'"' {
            return Err(ErrorKind::IncorrectType);
        }
        let mut scratch = Vec::new();
        let (prefix, _consumed) = parse_string_into(
            &self.doc.input.padded()[offset + 1..],
            self.doc.config.allow_replacement_of_invalid_utf8,
            &mut scratch,
        )
        .map_err(|e| self.doc.latch(e))?;
        let len_bytes: [u8; 4] = scratch[prefix..prefix + 4]
            .try_into()
            .map_err(|_| ErrorKind::StringError)?;
        let len = u32::from_le_bytes(len_bytes) as usize;
        scratch.truncate(prefix + 4 + len);
        scratch.drain(..prefix + 4);
        let text = String::from_utf8(scratch).map_err(|_| self.doc.latch(ErrorKind::Utf8Error))?;
        self.consume_scalar()?;
        Ok(text)
    }

    /// Enter this value as an object.
    ///
    /// # Errors
    ///
    /// `IncorrectType` when the value is not an object; `DepthError` past
    /// the configured depth.
    pub fn get_object(&self) -> Result<Object<'c, 'a>> {
        let offset = self.check_bind()?;
        if self.doc.byte_at(offset) != b'{' {
            return Err(ErrorKind::IncorrectType);
        }
        self.doc.next_token().map_err(|e| self.doc.latch(e))?;
        Ok(Object::new(self.doc, self.doc.depth.get()))
    }

    /// Enter this value as an array.
    ///
    /// # Errors
    ///
    /// `IncorrectType` when the value is not an array; `DepthError` past
    /// the configured depth.
    pub fn get_array(&self) -> Result<Array<'c, 'a>> {
        let offset = self.check_bind()?;
        if self.doc.byte_at(offset) != b'[' {
            return Err(ErrorKind::IncorrectType);
        }
        self.doc.next_token().map_err(|e| self.doc.latch(e))?;
        Ok(Array::new(self.doc, self.doc.depth.get()))
    }

    /// Shorthand for entering an object and looking up `key` unordered.
    ///
    /// # Errors
    ///
    /// As [`Value::get_object`] and [`Object::find_field_unordered`].
    pub fn at_key(&self, key: &str) -> Result<Value<'c, 'a>> {
        self.get_object()?.find_field_unordered(key)
    }

    fn parse_scalar_number(&self) -> Result<ParsedNumber> {
        let offset = self.check_bind()?;
        if !matches!(self.doc.byte_at(offset), b'-' | b'0'..=b'9') {
            return Err(ErrorKind::IncorrectType);
        }
        let parsed = if self.is_root() {
            self.parse_root_number(offset)
        } else {
            parse_number(&self.doc.input.padded()[offset..]).map(|(value, _)| value)
        };
        parsed.map_err(|e| self.doc.latch(e))
    }

    /// Root numbers may end the buffer; copy them to a space-terminated
    /// scratch first.
    fn parse_root_number(&self, offset: usize) -> Result<ParsedNumber> {
        let doc_bytes = self.doc.input.document();
        let mut end = offset;
        while end < doc_bytes.len()
            && matches!(doc_bytes[end], b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-')
        {
            end += 1;
        }
        if end < doc_bytes.len() && !is_structural_or_whitespace(doc_bytes[end]) {
            return Err(ErrorKind::NumberError);
        }
        let mut scratch = Vec::with_capacity(end - offset + 1);
        scratch.extend_from_slice(&doc_bytes[offset..end]);
        scratch.push(b' ');
        let (value, consumed) = parse_number(&scratch)?;
        if consumed != end - offset {
            return Err(ErrorKind::NumberError);
        }
        Ok(value)
    }

    fn check_atom(&self, offset: usize, atom: &'static [u8]) -> Result<()> {
        let error = match atom[0] {
            b't' => ErrorKind::TAtomError,
            b'f' => ErrorKind::FAtomError,
            _ => ErrorKind::NAtomError,
        };
        let ok = if self.is_root() {
            let doc_bytes = self.doc.input.document();
            let remaining = doc_bytes.len() - offset;
            if remaining < atom.len() {
                false
            } else if remaining == atom.len() {
                &doc_bytes[offset..] == atom
            } else {
                self.atom_with_terminator(offset, atom)
            }
        } else {
            self.atom_with_terminator(offset, atom)
        };
        if ok {
            Ok(())
        } else {
            Err(self.doc.latch(error))
        }
    }

    fn atom_with_terminator(&self, offset: usize, atom: &[u8]) -> bool {
        let padded = self.doc.input.padded();
        &padded[offset..offset + atom.len()] == atom
            && is_structural_or_whitespace(padded[offset + atom.len()])
    }

    fn consume_scalar(&self) -> Result<()> {
        self.doc.next_token().map_err(|e| self.doc.latch(e))?;
        Ok(())
    }
}
