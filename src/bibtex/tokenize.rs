//! Field extraction from BibTeX-style citation text.
//!
//! The tokenizer walks the field list of a single entry and yields one event per
//! fragment: either a [`RawField`] or a [`SkippedFragment`] describing text that
//! could not be read as `key = value`. Skipping is an ordinary transition of the
//! scanner, so malformed input never stops the scan early except where a value
//! is left unterminated, in which case the rest of the input is the fragment.
//!
//! ```plain
//! @article{doe2024,
//!   title  = {Deep {R}etrieval},   <- braced value, nesting kept verbatim
//!   note   = "quoted",             <- quoted value
//!   year   = 2024,                 <- bare value
//! }                                <- closing marker ends the scan
//! ```

use compact_str::CompactString;
use either::{Either, Left, Right};
use serde::{Deserialize, Serialize};

/// A `key = value` pair as it appears in the source text.
///
/// The key is lowercased; the value keeps its delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub key: CompactString,
    pub value: String,
}

/// Why a fragment of the field list was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Text that does not start with a field name.
    StrayText,
    /// A field name that is not followed by `=`.
    MissingEquals,
    /// `key =` with nothing usable after it.
    MissingValue,
    /// A `{` that is never closed.
    UnterminatedBrace,
    /// A `"` that is never closed.
    UnterminatedQuote,
}

/// A piece of the field list that the tokenizer stepped over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFragment {
    /// Byte offset of the fragment in the original input.
    pub offset: usize,
    pub text: String,
    pub reason: SkipReason,
}

/// The `@type{key,` wrapper in front of a field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader<'a> {
    pub entry_type: &'a str,
    pub citation_key: Option<&'a str>,
    /// Byte offset where the field list starts.
    pub body_start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Scanning,
    Finished,
}

/// Scanner over the field list of one citation entry.
///
/// Iterating yields `Left(SkippedFragment)` or `Right(RawField)` in source order.
/// Use [`FieldTokenizer::fields`] for the fields alone.
#[derive(Debug, Clone)]
pub struct FieldTokenizer<'a> {
    text: &'a str,
    pos: usize,
    header: Option<EntryHeader<'a>>,
    state: ScanState,
}

impl<'a> FieldTokenizer<'a> {
    /// Create a tokenizer for `input`.
    ///
    /// When no `@type{key,` wrapper is found the whole input is scanned as a field
    /// list, and a `}` no longer acts as the closing marker.
    pub fn new(input: &'a str) -> Self {
        let header = locate_entry(input);
        Self {
            text: input,
            pos: header.map_or(0, |h| h.body_start),
            header,
            state: ScanState::Scanning,
        }
    }

    /// The entry wrapper, if the input had one.
    pub fn header(&self) -> Option<EntryHeader<'a>> {
        self.header
    }

    /// Only the well-formed fields, skipping everything else.
    pub fn fields(self) -> impl Iterator<Item = RawField> + 'a {
        self.filter_map(Either::right)
    }

    fn wrapped(&self) -> bool {
        self.header.is_some()
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn finish(&mut self) {
        self.pos = self.text.len();
        self.state = ScanState::Finished;
    }

    fn skip_separators(&mut self) {
        while let Some(b) = self.peek() {
            if b == b',' || b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Produce the next event, or `None` once the closing marker or the end of
    /// input has been reached.
    fn next_event(&mut self) -> Option<Either<SkippedFragment, RawField>> {
        if self.state == ScanState::Finished {
            return None;
        }

        self.skip_separators();
        let start = self.pos;
        match self.peek() {
            None => {
                self.finish();
                return None;
            }
            Some(b'}') if self.wrapped() => {
                self.finish();
                return None;
            }
            _ => {}
        }

        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
        if self.pos == start {
            return Some(Left(self.skip_fragment(start, SkipReason::StrayText)));
        }
        let key_end = self.pos;

        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            return Some(Left(self.skip_fragment(start, SkipReason::MissingEquals)));
        }
        self.pos += 1;
        self.skip_whitespace();

        let value_start = self.pos;
        let scanned = match self.peek() {
            Some(b'{') => self.scan_braced(),
            Some(b'"') => self.scan_quoted(),
            _ => self.scan_bare(),
        };

        match scanned {
            Ok(value_end) => {
                let key = self.text[start..key_end]
                    .chars()
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                let value = self.text[value_start..value_end].trim_end().to_string();
                Some(Right(RawField { key, value }))
            }
            Err(reason @ (SkipReason::UnterminatedBrace | SkipReason::UnterminatedQuote)) => {
                let fragment = SkippedFragment {
                    offset: start,
                    text: self.text[start..].trim().to_string(),
                    reason,
                };
                tracing::debug!(offset = start, ?reason, "skipping unterminated field value");
                self.finish();
                Some(Left(fragment))
            }
            Err(reason) => Some(Left(self.skip_fragment(start, reason))),
        }
    }

    /// Scan a `{...}` value starting at the current position, counting nested braces.
    /// Returns the end offset, just past the matching `}`.
    fn scan_braced(&mut self) -> Result<usize, SkipReason> {
        let bytes = self.text.as_bytes();
        let mut depth = 0usize;
        for (i, &b) in bytes.iter().enumerate().skip(self.pos) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = i + 1;
                        return Ok(self.pos);
                    }
                }
                _ => {}
            }
        }
        Err(SkipReason::UnterminatedBrace)
    }

    /// Scan a `"..."` value. A `"` inside balanced braces does not close the value;
    /// if the braces never balance, the first `"` closes it.
    fn scan_quoted(&mut self) -> Result<usize, SkipReason> {
        let bytes = self.text.as_bytes();
        let mut depth = 0usize;
        let mut first_quote = None;
        for (i, &b) in bytes.iter().enumerate().skip(self.pos + 1) {
            match b {
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                b'"' if depth == 0 => {
                    self.pos = i + 1;
                    return Ok(self.pos);
                }
                b'"' => {
                    first_quote.get_or_insert(i);
                }
                _ => {}
            }
        }
        let end = first_quote.ok_or(SkipReason::UnterminatedQuote)? + 1;
        self.pos = end;
        Ok(end)
    }

    /// Scan a bare value up to the next comma, line break or closing marker.
    fn scan_bare(&mut self) -> Result<usize, SkipReason> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b',' || b == b'\n' || b == b'\r' || (b == b'}' && self.wrapped()) {
                break;
            }
            self.pos += 1;
        }
        if self.text[start..self.pos].trim().is_empty() {
            Err(SkipReason::MissingValue)
        } else {
            Ok(self.pos)
        }
    }

    /// Whether `key =` starts at `pos`, with `key` not the tail of a longer word.
    fn field_starts_at(&self, pos: usize) -> bool {
        let bytes = self.text.as_bytes();
        if pos == 0 || is_ident_byte(bytes[pos - 1]) {
            return false;
        }
        let key_len = bytes[pos..].iter().take_while(|&&b| is_ident_byte(b)).count();
        if key_len == 0 {
            return false;
        }
        bytes[pos + key_len..]
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|&b| b == b'=')
    }

    /// Step over a malformed fragment, resuming at the next top-level comma, line
    /// break or `key =`. The closing marker is left in place for the next call.
    fn skip_fragment(&mut self, start: usize, reason: SkipReason) -> SkippedFragment {
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            match b {
                b',' | b'\n' if depth == 0 => break,
                _ if depth == 0 && self.pos > start && self.field_starts_at(self.pos) => break,
                b'}' if depth == 0 && self.wrapped() => break,
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.pos += 1;
        }
        let fragment = SkippedFragment {
            offset: start,
            text: self.text[start..self.pos].trim().to_string(),
            reason,
        };
        tracing::trace!(offset = start, ?reason, text = %fragment.text, "skipping malformed fragment");
        fragment
    }
}

impl Iterator for FieldTokenizer<'_> {
    type Item = Either<SkippedFragment, RawField>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

/// Lazily extract the well-formed fields of a citation entry.
pub fn tokenize(input: &str) -> impl Iterator<Item = RawField> + '_ {
    FieldTokenizer::new(input).fields()
}

/// Find the `@type{key,` wrapper of an entry.
///
/// An entry whose first item already looks like a field (`@misc{title = ...`) has
/// no citation key; its field list starts right after the `{`.
fn locate_entry(input: &str) -> Option<EntryHeader<'_>> {
    let bytes = input.as_bytes();
    let at = input.find('@')?;

    let mut i = at + 1;
    while bytes.get(i).copied().is_some_and(is_ident_byte) {
        i += 1;
    }
    let entry_type = &input[at + 1..i];
    if entry_type.is_empty() {
        return None;
    }

    while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
        i += 1;
    }
    if bytes.get(i) != Some(&b'{') {
        return None;
    }
    let open = i + 1;

    let rest = &input[open..];
    let header = match rest.find([',', '=', '}']) {
        Some(end) if rest.as_bytes()[end] == b',' && !rest[..end].trim().is_empty() => {
            EntryHeader {
                entry_type,
                citation_key: Some(rest[..end].trim()),
                body_start: open + end + 1,
            }
        }
        _ => EntryHeader {
            entry_type,
            citation_key: None,
            body_start: open,
        },
    };
    Some(header)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}
