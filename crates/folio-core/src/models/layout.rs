/// A contiguous range into [`DocumentLayout::text`], in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextSegment {
    pub start: usize,
    pub end: usize,
}

impl TextSegment {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    pub segments: Vec<TextSegment>,
}

impl Paragraph {
    pub fn new(segments: Vec<TextSegment>) -> Self {
        Self { segments }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub paragraphs: Vec<Paragraph>,
}

impl Page {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }
}

/// Document model returned by the layout extractor: the full text plus a
/// page/paragraph/segment hierarchy of offsets into it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentLayout {
    pub text: String,
    pub pages: Vec<Page>,
}

impl DocumentLayout {
    pub fn new(text: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            text: text.into(),
            pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn paragraph_count(&self) -> usize {
        self.pages.iter().map(|p| p.paragraphs.len()).sum()
    }
}
