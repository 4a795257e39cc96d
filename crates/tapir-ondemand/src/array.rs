// SPDX-License-Identifier: MIT OR Apache-2.0
//! Array iteration
//!
//! Pull-model iteration over an array the cursor has just entered. Each
//! step settles whatever the caller did with the previous element (bound
//! it, half-iterated it, or ignored it) before reading the next comma or
//! close bracket. A latched error is yielded exactly once, then the
//! iterator terminates.

use crate::document::Document;
use crate::value::Value;
use tapir_core::{ErrorKind, Result};

/// An array being iterated; created by
/// [`Value::get_array`](crate::value::Value::get_array).
#[derive(Debug)]
pub struct Array<'c, 'a> {
    doc: &'c Document<'a>,
    /// Depth inside the container: elements live here, and the cursor must
    /// return here between elements.
    container_depth: u32,
    at_start: bool,
    done: bool,
    /// Token position of the last yielded element, so an untouched element
    /// can be told apart from a half-iterated one.
    pending_value: Option<usize>,
}

impl<'c, 'a> Array<'c, 'a> {
    pub(crate) const fn new(doc: &'c Document<'a>, container_depth: u32) -> Self {
        Self {
            doc,
            container_depth,
            at_start: true,
            done: false,
            pending_value: None,
        }
    }

    /// Bring the cursor back to the position after the previous element.
    fn settle(&mut self) -> Result<()> {
        if let Some(pending) = self.pending_value.take() {
            if self.doc.pos.get() == pending {
                // Never touched: skip it wholesale.
                self.doc.skip_one_value()?;
            } else {
                // Possibly abandoned mid-container.
                self.doc.skip_to_depth(self.container_depth)?;
            }
        }
        Ok(())
    }

    fn step(&mut self) -> Result<Option<Value<'c, 'a>>> {
        self.settle()?;
        let offset = self.doc.peek_token()?;
        if self.at_start {
            self.at_start = false;
            if self.doc.byte_at(offset) == b']' {
                self.doc.next_token()?;
                self.done = true;
                return Ok(None);
            }
        } else {
            match self.doc.byte_at(offset) {
                b',' => {
                    self.doc.next_token()?;
                }
                b']' => {
                    self.doc.next_token()?;
                    self.done = true;
                    return Ok(None);
                }
                _ => return Err(ErrorKind::TapeError),
            }
        }
        let pos = self.doc.pos.get();
        self.pending_value = Some(pos);
        Ok(Some(Value::new(self.doc, pos, self.container_depth)))
    }
}

impl<'c, 'a> Iterator for Array<'c, 'a> {
    type Item = Result<Value<'c, 'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(error) = self.doc.error.get() {
            self.done = true;
            return Some(Err(error));
        }
        match self.step() {
            Ok(Some(value)) => Some(Ok(value)),
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
    use tapir_core::{ErrorKind, PaddedBuffer, Result};

    fn collect_u64s(text: &str) -> Vec<Result<u64>> {
        let buf = PaddedBuffer::from_str(text).unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let array = doc.root().get_array().unwrap();
        array.map(|item| item.and_then(|v| v.get_u64())).collect()
    }

    #[test]
    fn test_simple_iteration() {
        assert_eq!(collect_u64s("[1, 2, 3]"), vec![Ok(1), Ok(2), Ok(3)]);
        assert_eq!(collect_u64s("[]"), vec![]);
    }

    #[test]
    fn test_missing_comma_yields_error_once() {
        // One element, then exactly one TapeError, then termination.
        assert_eq!(
            collect_u64s("[1 1]"),
            vec![Ok(1), Err(ErrorKind::TapeError)]
        );
    }

    #[test]
    fn test_unbound_elements_are_skipped() {
        let buf = PaddedBuffer::from_str(r#"[{"skip": [1, 2]}, "keep", 3]"#).unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let mut kept = Vec::new();
        for item in doc.root().get_array().unwrap() {
            let value = item.unwrap();
            if let Ok(text) = value.get_string() {
                kept.push(text);
            }
        }
        assert_eq!(kept, vec!["keep"]);
        doc.finish().unwrap();
    }

    #[test]
    fn test_abandoned_child_container() {
        let buf = PaddedBuffer::from_str("[[1, 2, 3], 4]").unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let mut outer = doc.root().get_array().unwrap();
        let first = outer.next().unwrap().unwrap();
        // Read only one element of the inner array, then move on.
        let mut inner = first.get_array().unwrap();
        assert_eq!(inner.next().unwrap().unwrap().get_u64(), Ok(1));
        drop(inner);
        let second = outer.next().unwrap().unwrap();
        assert_eq!(second.get_u64(), Ok(4));
        assert!(outer.next().is_none());
        doc.finish().unwrap();
    }

    #[test]
    fn test_nested_arrays_fully_iterated() {
        let buf = PaddedBuffer::from_str("[[1], [2, 3], []]").unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let mut sums = Vec::new();
        for item in doc.root().get_array().unwrap() {
            let mut sum = 0;
            for inner in item.unwrap().get_array().unwrap() {
                sum += inner.unwrap().get_u64().unwrap();
            }
            sums.push(sum);
        }
        assert_eq!(sums, vec![1, 5, 0]);
    }

    #[test]
    fn test_error_terminates_outer_iteration_too() {
        let buf = PaddedBuffer::from_str("[[1 2], 3]").unwrap();
        let doc = OndemandParser::new().iterate(buf.as_padded()).unwrap();
        let mut outer = doc.root().get_array().unwrap();
        let first = outer.next().unwrap().unwrap();
        let inner_items: Vec<_> = first.get_array().unwrap().collect();
        assert_eq!(inner_items.len(), 2);
        assert!(inner_items[1].is_err());
        // The outer iterator sees the sticky error exactly once.
        let next = outer.next().unwrap();
        assert_eq!(next.unwrap_err(), ErrorKind::TapeError);
        assert!(outer.next().is_none());
    }
}
