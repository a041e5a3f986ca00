//! Flattens fetched markup into an ordered list of text blocks.
//!
//! The forecast page nests its content in accordions, columns and cards whose
//! structure changes between redesigns. The segmenters do not care about that
//! nesting; they only need, in document order:
//! - headings (region titles, day headers)
//! - text paragraphs with the marker classes attached to them
//! - explicit separators (`<hr>`)
//!
//! Plain text without markup comes out as one `Text` block per non-empty line.

use scraper::{ElementRef, Html};

use super::compose::collapse_whitespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading,
    Text,
    Separator,
}

/// One visible unit of the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
    /// Class names of the element and its descendants
    pub markers: Vec<String>,
}

impl Block {
    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Heading,
            text: text.into(),
            markers: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Text,
            text: text.into(),
            markers: Vec::new(),
        }
    }

    pub fn separator() -> Self {
        Self {
            kind: BlockKind::Separator,
            text: String::new(),
            markers: Vec::new(),
        }
    }

    pub fn with_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers.extend(markers.into_iter().map(Into::into));
        self
    }

    pub fn is_separator(&self) -> bool {
        self.kind == BlockKind::Separator
    }
}

const SKIPPED: &[&str] = &["script", "style", "noscript", "head", "template", "svg"];
const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "summary", "dt", "caption"];
const LEAF_BLOCKS: &[&str] = &["p", "li", "td", "th", "dd", "pre", "blockquote", "figcaption"];
const CONTAINERS: &[&str] = &[
    "html", "body", "main", "div", "section", "article", "aside", "header", "footer", "nav",
    "ul", "ol", "dl", "table", "thead", "tbody", "tfoot", "tr", "details", "form", "figure",
];

fn is_block_tag(name: &str) -> bool {
    HEADINGS.contains(&name)
        || LEAF_BLOCKS.contains(&name)
        || CONTAINERS.contains(&name)
        || name == "hr"
}

/// Parse `document` and flatten it into blocks.
pub fn flatten(document: &str) -> Vec<Block> {
    let html = Html::parse_document(document);
    let mut flattener = Flattener::default();
    flattener.visit_children(html.root_element());
    flattener.end_line();
    flattener.blocks
}

/// Loose text is collected line by line; each line keeps the classes of the
/// inline elements that appeared on it.
#[derive(Default)]
struct Flattener {
    blocks: Vec<Block>,
    line: String,
    line_markers: Vec<String>,
}

impl Flattener {
    fn visit_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                self.visit_element(child_element);
            } else if let Some(text) = child.value().as_text() {
                self.push_loose_text(text);
            }
        }
    }

    fn visit_element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();

        if SKIPPED.contains(&name) {
            return;
        }

        if name == "hr" {
            self.end_line();
            self.blocks.push(Block::separator());
            return;
        }

        if name == "br" {
            self.end_line();
            return;
        }

        let is_leaf = HEADINGS.contains(&name) || LEAF_BLOCKS.contains(&name);
        if is_leaf && !has_block_descendant(element) {
            self.end_line();
            let kind = if HEADINGS.contains(&name) {
                BlockKind::Heading
            } else {
                BlockKind::Text
            };
            self.push_leaf(element, kind);
            return;
        }

        if is_block_tag(name) {
            self.end_line();
            self.visit_children(element);
            self.end_line();
        } else {
            self.line_markers
                .extend(element.value().classes().map(str::to_string));
            self.visit_children(element);
        }
    }

    fn push_leaf(&mut self, element: ElementRef<'_>, kind: BlockKind) {
        let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
        let markers = collect_classes(element);
        if text.is_empty() && markers.is_empty() {
            return;
        }
        self.blocks.push(Block {
            kind,
            text,
            markers,
        });
    }

    fn push_loose_text(&mut self, text: &str) {
        let mut pieces = text.split('\n');
        if let Some(first) = pieces.next() {
            self.line.push_str(first);
        }
        for piece in pieces {
            self.end_line();
            self.line.push_str(piece);
        }
    }

    /// Emit the current loose-text line, if it has any text.
    fn end_line(&mut self) {
        let markers = std::mem::take(&mut self.line_markers);
        let text = collapse_whitespace(&std::mem::take(&mut self.line));
        if text.is_empty() {
            return;
        }
        self.blocks.push(Block {
            kind: BlockKind::Text,
            text,
            markers,
        });
    }
}

fn has_block_descendant(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|el| is_block_tag(el.value().name()) || el.value().name() == "hr")
}

fn collect_classes(element: ElementRef<'_>) -> Vec<String> {
    let mut classes = Vec::new();
    for el in element.descendants().filter_map(ElementRef::wrap) {
        for class in el.value().classes() {
            if !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        }
    }
    classes
}
