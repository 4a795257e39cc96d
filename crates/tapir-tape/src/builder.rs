// SPDX-License-Identifier: MIT OR Apache-2.0
//! Grammar state machine writing the tape
//!
//! Stage 2 of the parse: walks the structural index one token at a time,
//! enforcing the JSON grammar with an explicit stack of open containers.
//! Container open words are reserved on entry and patched on close with the
//! index of the matching close word and the saturated element count. Any
//! error aborts the build; no partially written tape is ever returned.

use crate::number::{ParsedNumber, parse_number};
use crate::string_parse::parse_string_into;
use crate::tape::{COUNT_SATURATED, TapeDocument, TapeTag, TapeWriter};
use smallvec::SmallVec;
use tapir_core::{ErrorKind, PaddedSlice, ParserConfig, Result};
use tapir_simd::classify::is_structural_or_whitespace;

#[cfg(feature = "trace")]
macro_rules! trace_event {
    ($($t:tt)*) => { log::trace!($($t)*) };
}
#[cfg(not(feature = "trace"))]
macro_rules! trace_event {
    ($($t:tt)*) => {{}};
}

/// Outcome of one streaming build step.
#[derive(Debug)]
pub enum StreamStep {
    /// One complete document was built; `next_token` is the structural
    /// index position just past it.
    Document {
        /// The finished document.
        document: TapeDocument,
        /// First token of the following document, or the sentinel position.
        next_token: usize,
    },
    /// The structural index ran out mid-document: the window ends inside
    /// the current document.
    Truncated,
}

/// Build the tape for a whole document.
///
/// `structurals` must be the index built by
/// [`tapir_simd::build_structural_index`] for `input`, sentinel included.
///
/// # Errors
///
/// Any stage-2 kind: `TapeError`, `DepthError`, `StringError`,
/// `TAtomError`/`FAtomError`/`NAtomError`, `NumberError`.
pub fn build_tape(
    input: PaddedSlice<'_>,
    structurals: &[u32],
    config: &ParserConfig,
) -> Result<TapeDocument> {
    let mut builder = TapeBuilder::new(input, structurals, 0, config);
    builder.parse_document()?;
    if builder.pos != structurals.len() - 1 {
        // Tokens remain after the root value.
        return Err(ErrorKind::TapeError);
    }
    Ok(builder.into_document())
}

/// Build the tape for the next document of a concatenated stream, starting
/// at token `start_token`.
///
/// # Errors
///
/// As [`build_tape`]; running out of tokens mid-document is reported as
/// [`StreamStep::Truncated`], not as an error.
pub fn build_tape_streaming(
    input: PaddedSlice<'_>,
    structurals: &[u32],
    start_token: usize,
    config: &ParserConfig,
) -> Result<StreamStep> {
    let mut builder = TapeBuilder::new(input, structurals, start_token, config);
    match builder.parse_document() {
        Ok(()) => {
            let next_token = builder.pos;
            Ok(StreamStep::Document {
                document: builder.into_document(),
                next_token,
            })
        }
        Err(_) if builder.hit_end => Ok(StreamStep::Truncated),
        Err(error) => Err(error),
    }
}

/// One open container on the stack.
struct Scope {
    tape_index: usize,
    count: u32,
    is_object: bool,
}

/// Where the state machine resumes after the current token.
enum State {
    ObjectFirst,
    ObjectColon,
    ObjectComma,
    ArrayFirst,
    ArrayComma,
    DocumentEnd,
}

struct TapeBuilder<'a> {
    doc: &'a [u8],
    padded: &'a [u8],
    structurals: &'a [u32],
    pos: usize,
    tape: TapeWriter,
    strings: Vec<u8>,
    stack: SmallVec<[Scope; 16]>,
    config: ParserConfig,
    hit_end: bool,
}

impl<'a> TapeBuilder<'a> {
    fn new(
        input: PaddedSlice<'a>,
        structurals: &'a [u32],
        start_token: usize,
        config: &ParserConfig,
    ) -> Self {
        Self {
            doc: input.document(),
            padded: input.padded(),
            structurals,
            pos: start_token,
            tape: TapeWriter::default(),
            strings: Vec::new(),
            stack: SmallVec::new(),
            config: *config,
            hit_end: false,
        }
    }

    fn into_document(self) -> TapeDocument {
        TapeDocument {
            tape: self.tape.tape,
            strings: self.strings,
        }
    }

    /// Consume the next token, returning its byte offset. The final index
    /// entry is the sentinel and is never a token.
    fn advance(&mut self) -> Result<usize> {
        if self.pos + 1 >= self.structurals.len() {
            self.hit_end = true;
            return Err(ErrorKind::TapeError);
        }
        let offset = self.structurals[self.pos] as usize;
        self.pos += 1;
        Ok(offset)
    }

    fn parse_document(&mut self) -> Result<()> {
        let root = self.tape.skip();
        let token = self.advance()?;
        trace_event!("document starts with {:?}", self.doc[token] as char);
        match self.doc[token] {
            b'{' => {
                self.open_container(true)?;
                self.container_loop(State::ObjectFirst)?;
            }
            b'[' => {
                self.open_container(false)?;
                self.container_loop(State::ArrayFirst)?;
            }
            _ => self.parse_root_scalar(token)?,
        }
        let end = self.tape.next_index();
        self.tape.append(TapeTag::Root, root as u64);
        self.tape.write_at(root, TapeTag::Root, end as u64);
        Ok(())
    }

    fn container_loop(&mut self, mut state: State) -> Result<()> {
        loop {
            state = match state {
                State::ObjectFirst => {
                    let token = self.advance()?;
                    match self.doc[token] {
                        b'}' => self.close_container()?,
                        b'"' => {
                            self.parse_string_value(token)?;
                            State::ObjectColon
                        }
                        _ => return Err(ErrorKind::TapeError),
                    }
                }
                State::ObjectColon => {
                    let token = self.advance()?;
                    if self.doc[token] != b':' {
                        return Err(ErrorKind::TapeError);
                    }
                    self.increment_count();
                    let value = self.advance()?;
                    self.parse_value(value, State::ObjectComma)?
                }
                State::ObjectComma => {
                    let token = self.advance()?;
                    match self.doc[token] {
                        b',' => {
                            let key = self.advance()?;
                            if self.doc[key] != b'"' {
                                return Err(ErrorKind::TapeError);
                            }
                            self.parse_string_value(key)?;
                            State::ObjectColon
                        }
                        b'}' => self.close_container()?,
                        _ => return Err(ErrorKind::TapeError),
                    }
                }
                State::ArrayFirst => {
                    let token = self.advance()?;
                    if self.doc[token] == b']' {
                        self.close_container()?
                    } else {
                        self.increment_count();
                        self.parse_value(token, State::ArrayComma)?
                    }
                }
                State::ArrayComma => {
                    let token = self.advance()?;
                    match self.doc[token] {
                        b',' => {
                            self.increment_count();
                            let value = self.advance()?;
                            self.parse_value(value, State::ArrayComma)?
                        }
                        b']' => self.close_container()?,
                        _ => return Err(ErrorKind::TapeError),
                    }
                }
                State::DocumentEnd => return Ok(()),
            };
        }
    }

    /// Dispatch one value token. Containers switch the state machine into
    /// the new scope; scalars emit their words and fall through to
    /// `continue_state`.
    fn parse_value(&mut self, offset: usize, continue_state: State) -> Result<State> {
        Ok(match self.doc[offset] {
            b'{' => {
                self.open_container(true)?;
                State::ObjectFirst
            }
            b'[' => {
                self.open_container(false)?;
                State::ArrayFirst
            }
            b'"' => {
                self.parse_string_value(offset)?;
                continue_state
            }
            b't' => {
                self.parse_atom(offset, b"true", TapeTag::True, ErrorKind::TAtomError)?;
                continue_state
            }
            b'f' => {
                self.parse_atom(offset, b"false", TapeTag::False, ErrorKind::FAtomError)?;
                continue_state
            }
            b'n' => {
                self.parse_atom(offset, b"null", TapeTag::Null, ErrorKind::NAtomError)?;
                continue_state
            }
            b'-' | b'0'..=b'9' => {
                let (number, _consumed) = parse_number(&self.padded[offset..])?;
                self.write_number(number);
                continue_state
            }
            _ => return Err(ErrorKind::TapeError),
        })
    }

    fn parse_root_scalar(&mut self, offset: usize) -> Result<()> {
        match self.doc[offset] {
            b'"' => self.parse_string_value(offset),
            b't' => self.parse_root_atom(offset, b"true", TapeTag::True, ErrorKind::TAtomError),
            b'f' => self.parse_root_atom(offset, b"false", TapeTag::False, ErrorKind::FAtomError),
            b'n' => self.parse_root_atom(offset, b"null", TapeTag::Null, ErrorKind::NAtomError),
            b'-' | b'0'..=b'9' => self.parse_root_number(offset),
            _ => Err(ErrorKind::TapeError),
        }
    }

    fn open_container(&mut self, is_object: bool) -> Result<()> {
        if self.stack.len() as u32 >= self.config.max_depth {
            return Err(ErrorKind::DepthError);
        }
        let tape_index = self.tape.skip();
        self.stack.push(Scope {
            tape_index,
            count: 0,
            is_object,
        });
        trace_event!("open {} at depth {}", if is_object { '{' } else { '[' }, self.stack.len());
        Ok(())
    }

    /// Write the close word and patch the reserved open word, then resume
    /// in the parent scope.
    fn close_container(&mut self) -> Result<State> {
        let scope = self.stack.pop().ok_or(ErrorKind::TapeError)?;
        let (start_tag, end_tag) = if scope.is_object {
            (TapeTag::StartObject, TapeTag::EndObject)
        } else {
            (TapeTag::StartArray, TapeTag::EndArray)
        };
        let end_index = self.tape.next_index();
        self.tape.append(end_tag, scope.tape_index as u64);
        let count = u64::from(scope.count).min(COUNT_SATURATED);
        self.tape
            .write_at(scope.tape_index, start_tag, end_index as u64 | (count << 32));
        trace_event!("close at depth {}", self.stack.len() + 1);
        Ok(match self.stack.last() {
            None => State::DocumentEnd,
            Some(parent) if parent.is_object => State::ObjectComma,
            Some(_) => State::ArrayComma,
        })
    }

    fn increment_count(&mut self) {
        if let Some(scope) = self.stack.last_mut() {
            scope.count = scope.count.saturating_add(1);
        }
    }

    fn parse_string_value(&mut self, offset: usize) -> Result<()> {
        let (string_offset, _consumed) = parse_string_into(
            &self.padded[offset + 1..],
            self.config.allow_replacement_of_invalid_utf8,
            &mut self.strings,
        )?;
        self.tape.append(TapeTag::String, string_offset as u64);
        Ok(())
    }

    fn write_number(&mut self, number: ParsedNumber) {
        match number {
            ParsedNumber::I64(value) => self.tape.append_i64(value),
            ParsedNumber::U64(value) => self.tape.append_u64(value),
            ParsedNumber::F64(value) => self.tape.append_f64(value),
        }
    }

    /// Atoms inside a container are always followed by a structural
    /// character, which the padding makes addressable.
    fn parse_atom(
        &mut self,
        offset: usize,
        atom: &'static [u8],
        tag: TapeTag,
        error: ErrorKind,
    ) -> Result<()> {
        let candidate = &self.padded[offset..offset + atom.len()];
        if candidate != atom || !is_structural_or_whitespace(self.padded[offset + atom.len()]) {
            return Err(error);
        }
        self.tape.append(tag, 0);
        Ok(())
    }

    /// At the document root nothing needs to follow the atom, so the
    /// remaining length decides which check applies.
    fn parse_root_atom(
        &mut self,
        offset: usize,
        atom: &'static [u8],
        tag: TapeTag,
        error: ErrorKind,
    ) -> Result<()> {
        let remaining = self.doc.len() - offset;
        if remaining < atom.len() {
            return Err(error);
        }
        if remaining == atom.len() {
            if &self.doc[offset..] != atom {
                return Err(error);
            }
            self.tape.append(tag, 0);
            return Ok(());
        }
        self.parse_atom(offset, atom, tag, error)
    }

    /// A root number may end the buffer, so its bytes are copied to a
    /// scratch slice with a space terminator before parsing.
    fn parse_root_number(&mut self, offset: usize) -> Result<()> {
        let mut end = offset;
        while end < self.doc.len()
            && matches!(self.doc[end], b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-')
        {
            end += 1;
        }
        if end < self.doc.len() && !is_structural_or_whitespace(self.doc[end]) {
            return Err(ErrorKind::NumberError);
        }
        let mut scratch = Vec::with_capacity(end - offset + 1);
        scratch.extend_from_slice(&self.doc[offset..end]);
        scratch.push(b' ');
        let (number, consumed) = parse_number(&scratch)?;
        if consumed != end - offset {
            return Err(ErrorKind::NumberError);
        }
        self.write_number(number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::payload;
    use tapir_core::PaddedBuffer;
    use tapir_simd::build_structural_index;

    fn parse(text: &str) -> Result<TapeDocument> {
        parse_with(text, &ParserConfig::default())
    }

    fn parse_with(text: &str, config: &ParserConfig) -> Result<TapeDocument> {
        let buf = PaddedBuffer::from_str(text)?;
        let structurals = build_structural_index(buf.as_padded(), config)?;
        build_tape(buf.as_padded(), &structurals, config)
    }

    fn tags(doc: &TapeDocument) -> Vec<TapeTag> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < doc.words().len() {
            let tag = TapeTag::of(doc.words()[i]).unwrap();
            out.push(tag);
            i += match tag {
                TapeTag::Int64 | TapeTag::Uint64 | TapeTag::Double => 2,
                _ => 1,
            };
        }
        out
    }

    #[test]
    fn test_root_atom_document() {
        let doc = parse("true").unwrap();
        assert_eq!(tags(&doc), vec![TapeTag::Root, TapeTag::True, TapeTag::Root]);
        // The root words point at each other.
        assert_eq!(payload(doc.words()[0]), 2);
        assert_eq!(payload(doc.words()[2]), 0);
    }

    #[test]
    fn test_empty_containers() {
        let doc = parse("{}").unwrap();
        assert_eq!(
            tags(&doc),
            vec![
                TapeTag::Root,
                TapeTag::StartObject,
                TapeTag::EndObject,
                TapeTag::Root
            ]
        );
        let open = doc.words()[1];
        assert_eq!(payload(open) & 0xFFFF_FFFF, 2);
        assert_eq!((payload(open) >> 32) & COUNT_SATURATED, 0);
        assert_eq!(payload(doc.words()[2]), 1);
        assert!(parse("[]").is_ok());
    }

    #[test]
    fn test_object_counts_and_pairing() {
        let doc = parse(r#"{"a":1,"b":[2,3],"c":null}"#).unwrap();
        let open = doc.words()[1];
        assert_eq!((payload(open) >> 32) & COUNT_SATURATED, 3);
        let close_index = (payload(open) & 0xFFFF_FFFF) as usize;
        assert_eq!(
            TapeTag::of(doc.words()[close_index]),
            Some(TapeTag::EndObject)
        );
        assert_eq!(payload(doc.words()[close_index]), 1);
        // The nested array counts its own elements.
        let array_open = doc
            .words()
            .iter()
            .position(|&w| TapeTag::of(w) == Some(TapeTag::StartArray))
            .unwrap();
        assert_eq!((payload(doc.words()[array_open]) >> 32) & COUNT_SATURATED, 2);
    }

    #[test]
    fn test_grammar_violations() {
        for text in [
            "[1 1]",
            r#"{"a" 1}"#,
            r#"{"a":}"#,
            r#"{"a":1,}"#,
            "[1,]",
            "[1,2",
            r#"{"a":1"#,
            "[1}",
            r#"{"a":1]"#,
            "{,}",
            "[,1]",
            ":",
            "}",
            "1 2",
            "{} {}",
            r#"{"a":1} x"#,
        ] {
            assert_eq!(parse(text).unwrap_err(), ErrorKind::TapeError, "{text}");
        }
    }

    #[test]
    fn test_atom_errors_by_first_letter() {
        assert_eq!(parse("[trve]").unwrap_err(), ErrorKind::TAtomError);
        assert_eq!(parse("[fals]").unwrap_err(), ErrorKind::FAtomError);
        assert_eq!(parse("[nul]").unwrap_err(), ErrorKind::NAtomError);
        assert_eq!(parse("truex").unwrap_err(), ErrorKind::TAtomError);
        assert_eq!(parse("tru").unwrap_err(), ErrorKind::TAtomError);
        assert_eq!(parse("nulll").unwrap_err(), ErrorKind::NAtomError);
    }

    #[test]
    fn test_root_atoms_exact_length() {
        assert!(parse("true").is_ok());
        assert!(parse("false").is_ok());
        assert!(parse("null").is_ok());
        assert!(parse("  null  ").is_ok());
    }

    #[test]
    fn test_root_numbers() {
        let doc = parse("  -42  ").unwrap();
        assert_eq!(tags(&doc), vec![TapeTag::Root, TapeTag::Int64, TapeTag::Root]);
        assert_eq!(doc.words()[2] as i64, -42);
        assert_eq!(parse("1x").unwrap_err(), ErrorKind::NumberError);
        assert_eq!(parse("0123").unwrap_err(), ErrorKind::NumberError);
    }

    #[test]
    fn test_depth_limit() {
        let config = ParserConfig::default().with_max_depth(3);
        assert!(parse_with("[[[1]]]", &config).is_ok());
        assert_eq!(
            parse_with("[[[[1]]]]", &config).unwrap_err(),
            ErrorKind::DepthError
        );
    }

    #[test]
    fn test_string_error_surfaces() {
        assert_eq!(parse(r#"["a\qb"]"#).unwrap_err(), ErrorKind::StringError);
        assert_eq!(parse("[\"a\tb\"]").unwrap_err(), ErrorKind::StringError);
    }

    #[test]
    fn test_streaming_yields_documents_in_order() {
        let buf = PaddedBuffer::from_str("1 {} [3]").unwrap();
        let config = ParserConfig::default();
        let structurals = build_structural_index(buf.as_padded(), &config).unwrap();
        let mut token = 0;
        let mut docs = Vec::new();
        while token < structurals.len() - 1 {
            match build_tape_streaming(buf.as_padded(), &structurals, token, &config).unwrap() {
                StreamStep::Document {
                    document,
                    next_token,
                } => {
                    docs.push(document);
                    token = next_token;
                }
                StreamStep::Truncated => panic!("unexpected truncation"),
            }
        }
        assert_eq!(docs.len(), 3);
        assert_eq!(
            tags(&docs[0]),
            vec![TapeTag::Root, TapeTag::Int64, TapeTag::Root]
        );
        assert_eq!(
            tags(&docs[1]),
            vec![
                TapeTag::Root,
                TapeTag::StartObject,
                TapeTag::EndObject,
                TapeTag::Root
            ]
        );
    }

    #[test]
    fn test_streaming_truncation_signal() {
        // Index the prefix of a document cut mid-array by a window.
        let buf = PaddedBuffer::from_str("[1,2").unwrap();
        let config = ParserConfig::default();
        let structurals = build_structural_index(buf.as_padded(), &config).unwrap();
        match build_tape_streaming(buf.as_padded(), &structurals, 0, &config).unwrap() {
            StreamStep::Truncated => {}
            StreamStep::Document { .. } => panic!("should have been truncated"),
        }
    }
}
