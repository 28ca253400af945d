// core/src/buffer.rs
//
// Output buffer for the segmentation loop. Units are attached with the
// word-append protocol: capitalization after a sentence boundary, a single
// separating space otherwise, and punctuation that hugs the previous word.
//
// Separator spaces requested between two Han-derived units are held as
// pending until the next unit arrives. A unit starting with `, . ? !`
// drops the pending space or a written one.

use serde::{Deserialize, Serialize};

use crate::utils::capitalize_first;

/// Half-open span `[start_index, start_index + length)` in code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharRange {
    pub start_index: usize,
    pub length: usize,
}

impl CharRange {
    pub fn new(start_index: usize, length: usize) -> Self {
        Self {
            start_index,
            length,
        }
    }

    /// One past the last index.
    pub fn end(&self) -> usize {
        self.start_index + self.length
    }
}

/// Buffer tails after which the next unit starts a new sentence.
const SENTENCE_BOUNDARIES: [&str; 11] = [
    "\n", "\t", ". ", "\"", "'", "? ", "! ", ".\" ", "?\" ", "!\" ", ": ",
];

/// Leading characters that attach to the previous word without a space.
const HUGGING: [char; 4] = [',', '.', '?', '!'];

#[derive(Debug, Default, Clone)]
pub struct OutputBuffer {
    text: String,
    /// Length of `text` in code points.
    chars: usize,
    pending_space: bool,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed text. A pending separator is not part of it.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Check the tail of the buffer as it would read with the pending
    /// separator committed.
    pub fn ends_with(&self, pat: &str) -> bool {
        if !self.pending_space {
            return self.text.ends_with(pat);
        }
        match pat.strip_suffix(' ') {
            Some(head) => self.text.ends_with(head),
            None => false,
        }
    }

    /// True when the next unit opens a sentence. An empty buffer counts.
    pub fn at_sentence_boundary(&self) -> bool {
        (self.text.is_empty() && !self.pending_space)
            || SENTENCE_BOUNDARIES.iter().any(|tail| self.ends_with(tail))
    }

    /// Request a separating space before whatever comes next.
    pub fn soft_space(&mut self) {
        if !self.text.is_empty() {
            self.pending_space = true;
        }
    }

    /// Attach a translated unit and return the span it occupies.
    ///
    /// The returned range never includes the separating space. A unit
    /// starting with `, . ? !` first deletes the trailing space, pending or
    /// already written (a space copied from the source included). An empty
    /// unit deletes that space as well and adds nothing.
    pub fn append_word(&mut self, unit: &str) -> CharRange {
        let hugs = unit.is_empty() || unit.starts_with(HUGGING);
        if hugs {
            self.drop_trailing_space();
        }
        if unit.is_empty() {
            return CharRange::new(self.chars, 0);
        }

        let capitalize = self.at_sentence_boundary();
        let lead = !capitalize && !hugs && !self.ends_with(" ") && !self.ends_with("(");

        self.commit_pending();
        if lead {
            self.push(" ");
        }

        let start = self.chars;
        if capitalize {
            self.push(&capitalize_first(unit));
        } else {
            self.push(unit);
        }
        CharRange::new(start, self.chars - start)
    }

    /// Copy text verbatim.
    pub fn push_raw(&mut self, raw: &str) -> CharRange {
        self.commit_pending();
        let start = self.chars;
        self.push(raw);
        CharRange::new(start, self.chars - start)
    }

    /// Copy a character with one leading space, unless the buffer is empty
    /// or already ends in whitespace.
    pub fn push_spaced(&mut self, ch: char) -> CharRange {
        self.commit_pending();
        if self.text.chars().next_back().is_some_and(|last| !last.is_whitespace()) {
            self.push(" ");
        }
        let start = self.chars;
        self.text.push(ch);
        self.chars += 1;
        CharRange::new(start, 1)
    }

    fn drop_trailing_space(&mut self) {
        self.pending_space = false;
        if self.text.ends_with(' ') {
            self.text.pop();
            self.chars -= 1;
        }
    }

    fn commit_pending(&mut self) {
        if self.pending_space {
            self.pending_space = false;
            self.push(" ");
        }
    }

    fn push(&mut self, s: &str) {
        self.text.push_str(s);
        self.chars += s.chars().count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_unit_is_capitalized_without_leading_space() {
        let mut buf = OutputBuffer::new();
        let range = buf.append_word("xin chào");
        assert_eq!(buf.as_str(), "Xin chào");
        assert_eq!(range, CharRange::new(0, 8));
    }

    #[test]
    fn units_are_separated_by_one_space() {
        let mut buf = OutputBuffer::new();
        buf.append_word("xin chào");
        let range = buf.append_word("thế giới");
        assert_eq!(buf.as_str(), "Xin chào thế giới");
        assert_eq!(range, CharRange::new(9, 8));
    }

    #[test]
    fn pending_space_is_not_doubled() {
        let mut buf = OutputBuffer::new();
        buf.append_word("sơn");
        buf.soft_space();
        buf.append_word("thủy");
        assert_eq!(buf.as_str(), "Sơn thủy");
    }

    #[test]
    fn punctuation_unit_drops_pending_space() {
        let mut buf = OutputBuffer::new();
        buf.append_word("vậy");
        buf.soft_space();
        let range = buf.append_word(", được");
        assert_eq!(buf.as_str(), "Vậy, được");
        assert_eq!(range, CharRange::new(3, 6));
    }

    #[test]
    fn capitalizes_after_sentence_boundaries() {
        let mut buf = OutputBuffer::new();
        buf.append_word("tốt");
        buf.push_raw(". ");
        buf.append_word("đi");
        assert_eq!(buf.as_str(), "Tốt. Đi");

        let mut buf = OutputBuffer::new();
        buf.push_raw("a: ");
        buf.append_word("b");
        assert_eq!(buf.as_str(), "a: B");
    }

    #[test]
    fn no_space_after_open_parenthesis() {
        let mut buf = OutputBuffer::new();
        buf.push_raw("x(");
        buf.append_word("chú");
        assert_eq!(buf.as_str(), "x(chú");
    }

    #[test]
    fn empty_unit_only_drops_the_trailing_space() {
        let mut buf = OutputBuffer::new();
        buf.append_word("a");
        buf.soft_space();
        let range = buf.append_word("");
        assert_eq!(range, CharRange::new(1, 0));
        buf.append_word("b");
        assert_eq!(buf.as_str(), "A b");

        let mut buf = OutputBuffer::new();
        buf.push_raw("a ");
        buf.append_word("");
        assert_eq!(buf.as_str(), "a");
    }

    #[test]
    fn punctuation_unit_removes_a_copied_space() {
        let mut buf = OutputBuffer::new();
        buf.append_word("xin chào");
        buf.push_raw(" ");
        let range = buf.append_word(", tạm biệt");
        assert_eq!(buf.as_str(), "Xin chào, tạm biệt");
        assert_eq!(range, CharRange::new(8, 10));
    }

    #[test]
    fn spaced_copy_skips_space_at_start() {
        let mut buf = OutputBuffer::new();
        let first = buf.push_spaced('“');
        buf.append_word("a");
        let second = buf.push_spaced('”');
        assert_eq!(buf.as_str(), "“ a ”");
        assert_eq!(first, CharRange::new(0, 1));
        assert_eq!(second, CharRange::new(4, 1));
    }
}
