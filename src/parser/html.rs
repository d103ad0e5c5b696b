use crate::errors::{AppError, AppResult};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Cached selector matching every element that carries an `id`.
static ID_SELECTOR: OnceLock<Selector> = OnceLock::new();

fn id_selector() -> &'static Selector {
    ID_SELECTOR.get_or_init(|| Selector::parse("[id]").expect("[id] is a valid CSS selector"))
}

/// A parsed portal page with id-based extractors.
///
/// The page keeps its source text so dynamic grids can be discovered by a regex
/// scan over the raw markup. `scraper::Html` is not `Send`, so a page lives
/// inside synchronous parsing code and never crosses an `.await`.
pub struct HtmlPage<'a> {
    source: &'a str,
    document: Html,
}

impl<'a> HtmlPage<'a> {
    /// Parses a document, rejecting empty or non-HTML input.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` when the input is blank or contains no markup.
    pub fn parse(source: &'a str) -> AppResult<Self> {
        if source.trim().is_empty() || !source.contains('<') {
            return Err(AppError::InvalidDocument);
        }

        Ok(Self {
            source,
            document: Html::parse_document(source),
        })
    }

    pub fn source(&self) -> &str {
        self.source
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    pub fn has_element_id(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Returns the element with the given id.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` when no element carries the id.
    pub fn element_by_id(&self, id: &str) -> AppResult<ElementRef<'_>> {
        self.find(id)
            .ok_or_else(|| AppError::ElementNotFound(id.to_string()))
    }

    /// Returns the trimmed text content of the element with the given id.
    pub fn text_by_id(&self, id: &str) -> AppResult<String> {
        let element = self.element_by_id(id)?;
        Ok(element_text(&element))
    }

    /// Returns the text of the element, failing when it is present but blank.
    pub fn required_text_by_id(&self, id: &str) -> AppResult<String> {
        let text = self.text_by_id(id)?;
        if text.is_empty() {
            return Err(AppError::AttributeNotFound {
                id: id.to_string(),
                attribute: "text".to_string(),
            });
        }
        Ok(text)
    }

    /// Returns an attribute value of the element with the given id.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` when the element is missing and
    /// `AttributeNotFound` when it lacks the attribute.
    pub fn attribute_by_id(&self, id: &str, attribute: &str) -> AppResult<String> {
        let element = self.element_by_id(id)?;
        element
            .value()
            .attr(attribute)
            .map(str::to_string)
            .ok_or_else(|| AppError::AttributeNotFound {
                id: id.to_string(),
                attribute: attribute.to_string(),
            })
    }

    /// Collects the first capture group of `pattern` over the raw markup, in
    /// ascending order and without duplicates.
    pub fn scan_ids(&self, pattern: &Regex) -> Vec<String> {
        pattern
            .captures_iter(self.source)
            .filter_map(|captures| captures.get(1).map(|m| m.as_str().to_string()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn find(&self, id: &str) -> Option<ElementRef<'_>> {
        self.document
            .select(id_selector())
            .find(|element| element.value().id() == Some(id))
    }
}

/// Whitespace-collapsed text content of an element.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a selector known at compile time.
pub(crate) fn cached_selector(cell: &'static OnceLock<Selector>, css: &str) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(css).expect("static selector is valid CSS"))
}
