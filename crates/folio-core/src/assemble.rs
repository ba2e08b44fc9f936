//! Layout-preserving text assembly
//!
//! Walks a [`DocumentLayout`] and rebuilds its text: segments of a paragraph are
//! joined with a space, paragraphs of a page with `"\n"`, and pages with `"\n\n"`.
//! Empty paragraphs and pages still take part in the joins.

use crate::models::{DocumentLayout, TextSegment};
use thiserror::Error;

pub const SEGMENT_SEPARATOR: &str = " ";
pub const PARAGRAPH_SEPARATOR: &str = "\n";
pub const PAGE_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error(
        "text segment [{start}, {end}) out of bounds for text of length {len} (page {page}, paragraph {paragraph})"
    )]
    SegmentOutOfBounds {
        page: usize,
        paragraph: usize,
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Character offset to byte offset lookup for the document text.
///
/// Segment offsets count characters, so non-ASCII text cannot be sliced with
/// them directly.
struct CharIndex<'a> {
    text: &'a str,
    /// Byte offset of every character, plus `text.len()` as a terminator.
    /// Empty when the text is ASCII.
    boundaries: Vec<usize>,
}

impl<'a> CharIndex<'a> {
    fn new(text: &'a str) -> Self {
        let boundaries = if text.is_ascii() {
            Vec::new()
        } else {
            text.char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(text.len()))
                .collect()
        };
        Self { text, boundaries }
    }

    fn char_len(&self) -> usize {
        if self.boundaries.is_empty() {
            self.text.len()
        } else {
            self.boundaries.len() - 1
        }
    }

    fn slice(&self, segment: TextSegment) -> Option<&'a str> {
        if segment.start > segment.end || segment.end > self.char_len() {
            return None;
        }
        if self.boundaries.is_empty() {
            return Some(&self.text[segment.start..segment.end]);
        }
        Some(&self.text[self.boundaries[segment.start]..self.boundaries[segment.end]])
    }
}

/// Assemble the layout-preserving text of a document.
pub fn assemble_text(document: &DocumentLayout) -> Result<String, LayoutError> {
    let index = CharIndex::new(&document.text);

    let mut pages = Vec::with_capacity(document.pages.len());
    for (page_no, page) in document.pages.iter().enumerate() {
        let mut paragraphs = Vec::with_capacity(page.paragraphs.len());
        for (paragraph_no, paragraph) in page.paragraphs.iter().enumerate() {
            let lines = paragraph
                .segments
                .iter()
                .map(|&segment| {
                    index
                        .slice(segment)
                        .ok_or(LayoutError::SegmentOutOfBounds {
                            page: page_no,
                            paragraph: paragraph_no,
                            start: segment.start,
                            end: segment.end,
                            len: index.char_len(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            paragraphs.push(lines.join(SEGMENT_SEPARATOR));
        }
        pages.push(paragraphs.join(PARAGRAPH_SEPARATOR));
    }

    Ok(pages.join(PAGE_SEPARATOR))
}
